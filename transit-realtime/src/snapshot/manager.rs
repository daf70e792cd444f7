//! Publishing of timetable snapshots.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwap;
use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use super::{SnapshotConfig, TimetableSnapshot, TripPatternCache};

/// The writer side of the snapshot store: the working copy and the state
/// that only writers need.
#[derive(Debug, Default)]
pub struct SnapshotBuffer {
    pub snapshot: TimetableSnapshot,
    pub pattern_cache: TripPatternCache,
    last_commit: Option<Instant>,
}

/// Holds the published snapshot and the buffer writers update.
///
/// Readers call [`current_snapshot`](Self::current_snapshot), which never
/// blocks. Writers lock the buffer, apply their changes and ask for a
/// commit; commits closer together than
/// [`SnapshotConfig::max_snapshot_frequency`] are deferred until the next
/// call to [`commit_if_due`](Self::commit_if_due).
#[derive(Debug)]
pub struct TimetableSnapshotManager {
    buffer: Mutex<SnapshotBuffer>,
    published: ArcSwap<TimetableSnapshot>,
    config: SnapshotConfig,
}

impl TimetableSnapshotManager {
    pub fn new(config: SnapshotConfig) -> Self {
        Self {
            buffer: Mutex::new(SnapshotBuffer::default()),
            published: ArcSwap::from_pointee(TimetableSnapshot::default()),
            config,
        }
    }

    /// The latest published snapshot.
    pub fn current_snapshot(&self) -> Arc<TimetableSnapshot> {
        self.published.load_full()
    }

    /// Locks the writer buffer.
    ///
    /// A writer that panicked while holding the lock leaves the buffer in
    /// whatever state it reached; every mutation is a whole-entry replace,
    /// so that state is still consistent.
    pub fn buffer(&self) -> MutexGuard<'_, SnapshotBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes the buffer if it has changes and the minimum interval has
    /// passed since the last commit.
    ///
    /// Returns the newly published snapshot, if any.
    pub fn commit_if_due(&self) -> Option<Arc<TimetableSnapshot>> {
        let mut buffer = self.buffer();
        self.commit_locked(&mut buffer, false)
    }

    /// Publishes the buffer if it has changes, ignoring the interval.
    pub fn force_commit(&self) -> Option<Arc<TimetableSnapshot>> {
        let mut buffer = self.buffer();
        self.commit_locked(&mut buffer, true)
    }

    /// Commits an already locked buffer.
    pub fn commit_locked(
        &self,
        buffer: &mut SnapshotBuffer,
        force: bool,
    ) -> Option<Arc<TimetableSnapshot>> {
        if !buffer.snapshot.is_dirty() {
            return None;
        }
        if !force
            && buffer
                .last_commit
                .is_some_and(|last| last.elapsed() < self.config.max_snapshot_frequency)
        {
            debug!("deferring snapshot commit");
            return None;
        }

        let snapshot = Arc::new(buffer.snapshot.commit());
        buffer.last_commit = Some(Instant::now());
        self.published.store(snapshot.clone());
        info!(
            version = snapshot.version(),
            timetables = snapshot.len(),
            "published timetable snapshot"
        );
        Some(snapshot)
    }

    /// Drops realtime data for service dates before yesterday and publishes
    /// the result.
    ///
    /// Does nothing if purging is disabled. Returns true if anything was
    /// removed.
    pub fn purge_expired_data(&self, today: NaiveDate) -> bool {
        if !self.config.purge_expired_data {
            return false;
        }
        let Some(cutoff) = today.checked_sub_days(Days::new(1)) else {
            return false;
        };

        let mut buffer = self.buffer();
        let removed = buffer.snapshot.purge_before(cutoff);
        if removed {
            info!(%cutoff, "purged expired realtime data");
            self.commit_locked(&mut buffer, true);
        }
        removed
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }
}

impl Default for TimetableSnapshotManager {
    fn default() -> Self {
        Self::new(SnapshotConfig::default())
    }
}
