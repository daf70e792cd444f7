//! Snapshot publishing configuration.

use std::time::Duration;

/// Configuration for [`super::TimetableSnapshotManager`].
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Minimum time between two published snapshots. Updates arriving in
    /// between are collected in the buffer and published together.
    pub max_snapshot_frequency: Duration,

    /// Whether realtime data for past service dates is dropped.
    pub purge_expired_data: bool,
}

impl SnapshotConfig {
    pub fn new(max_snapshot_frequency: Duration, purge_expired_data: bool) -> Self {
        Self {
            max_snapshot_frequency,
            purge_expired_data,
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            max_snapshot_frequency: Duration::from_secs(1),
            purge_expired_data: true,
        }
    }
}
