//! The versioned realtime view of the timetable.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::trace;

use crate::domain::{
    FeedScopedId, RealTimeState, Timetable, TripOnServiceDate, TripPattern, TripTimes,
};

use super::TransitOverlay;

type TimetableKey = (FeedScopedId, NaiveDate);

/// The updater that wrote a trip's realtime row, and the pattern the trip
/// runs on before any move to a modified pattern.
#[derive(Debug, Clone)]
struct RowSource {
    source: String,
    pattern: Arc<TripPattern>,
}

/// Realtime timetables by (trip pattern, service date), plus the overlay
/// of added entities.
///
/// A published snapshot is never mutated: the manager keeps a private
/// buffer copy that the updater writes to, and publishes clones of it.
#[derive(Debug, Clone, Default)]
pub struct TimetableSnapshot {
    version: u64,
    timetables: HashMap<TimetableKey, Arc<Timetable>>,
    /// Patterns referenced by realtime timetables that are not in the
    /// static index.
    realtime_patterns: HashMap<FeedScopedId, Arc<TripPattern>>,
    /// Trips moved to a modified pattern on a given date.
    modified_trip_patterns: HashMap<TimetableKey, Arc<TripPattern>>,
    /// Source of each trip's realtime row, by (trip, date).
    row_sources: HashMap<TimetableKey, RowSource>,
    overlay: TransitOverlay,
    dirty: bool,
}

impl TimetableSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The timetable of `pattern` on `date`: the realtime one if any, else
    /// the scheduled one.
    pub fn resolve<'a>(&'a self, pattern: &'a TripPattern, date: NaiveDate) -> &'a Timetable {
        self.timetables
            .get(&(pattern.id.clone(), date))
            .map(|t| t.as_ref())
            .unwrap_or(&pattern.scheduled_timetable)
    }

    /// The realtime timetable of a pattern on a date, if one was written.
    pub fn timetable(&self, pattern_id: &FeedScopedId, date: NaiveDate) -> Option<&Arc<Timetable>> {
        self.timetables.get(&(pattern_id.clone(), date))
    }

    pub fn timetables(&self) -> impl Iterator<Item = &Arc<Timetable>> {
        self.timetables.values()
    }

    /// The realtime row of a trip on a date, wherever it currently lives.
    pub fn trip_times(
        &self,
        pattern: &TripPattern,
        trip_id: &FeedScopedId,
        date: NaiveDate,
    ) -> Option<&Arc<TripTimes>> {
        let key = (trip_id.clone(), date);
        match self.modified_trip_patterns.get(&key) {
            Some(modified) => self.timetable(&modified.id, date)?.get(trip_id),
            None => self.timetable(&pattern.id, date)?.get(trip_id),
        }
    }

    pub fn realtime_pattern(&self, id: &FeedScopedId) -> Option<&Arc<TripPattern>> {
        self.realtime_patterns.get(id)
    }

    /// The modified pattern a trip runs on at `date`, if it was moved.
    pub fn modified_pattern_for(
        &self,
        trip_id: &FeedScopedId,
        date: NaiveDate,
    ) -> Option<&Arc<TripPattern>> {
        self.modified_trip_patterns.get(&(trip_id.clone(), date))
    }

    pub fn overlay(&self) -> &TransitOverlay {
        &self.overlay
    }

    pub fn len(&self) -> usize {
        self.timetables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timetables.is_empty()
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Copy of the buffer to publish as the next version.
    pub(crate) fn commit(&mut self) -> TimetableSnapshot {
        self.version += 1;
        self.dirty = false;
        self.clone()
    }

    /// Writes `times` into the timetable of `pattern` on `date`, replacing
    /// any row of the same trip.
    pub(crate) fn update(&mut self, pattern: &Arc<TripPattern>, times: TripTimes, date: NaiveDate) {
        if pattern.created_by_realtime {
            self.realtime_patterns
                .insert(pattern.id.clone(), pattern.clone());
        }
        trace!(pattern = %pattern.id, %date, times = %times, "updating timetable");

        let base = self.resolve(pattern, date);
        let mut updated = base.with_trip_times(Arc::new(times));
        if updated.service_date().is_none() {
            updated = copy_with_date(&updated, date);
        }
        self.timetables
            .insert((pattern.id.clone(), date), Arc::new(updated));
        self.dirty = true;
    }

    /// Removes a trip from the timetable of `pattern` on `date`.
    pub(crate) fn remove_trip(
        &mut self,
        pattern: &TripPattern,
        trip_id: &FeedScopedId,
        date: NaiveDate,
    ) {
        let current = self.resolve(pattern, date);
        if current.get(trip_id).is_none() {
            return;
        }
        let mut updated = current.without_trip(trip_id);
        if updated.service_date().is_none() {
            updated = copy_with_date(&updated, date);
        }
        self.timetables
            .insert((pattern.id.clone(), date), Arc::new(updated));
        self.dirty = true;
    }

    /// Records that a trip runs on `modified` at `date`.
    pub(crate) fn set_modified_pattern(
        &mut self,
        trip_id: &FeedScopedId,
        date: NaiveDate,
        modified: Arc<TripPattern>,
    ) {
        self.modified_trip_patterns
            .insert((trip_id.clone(), date), modified);
        self.dirty = true;
    }

    /// Undoes an earlier move of a trip to a modified pattern.
    ///
    /// Returns true if the trip had been moved.
    pub(crate) fn revert_modified_pattern(&mut self, trip_id: &FeedScopedId, date: NaiveDate) -> bool {
        let Some(modified) = self.modified_trip_patterns.remove(&(trip_id.clone(), date)) else {
            return false;
        };
        self.remove_trip(&modified, trip_id, date);
        self.dirty = true;
        true
    }

    /// Registers an added trip in the overlay.
    pub(crate) fn register_added_trip(
        &mut self,
        pattern: Arc<TripPattern>,
        tosd: Arc<TripOnServiceDate>,
        new_route: bool,
    ) {
        if new_route {
            self.overlay.add_route(pattern.route.clone());
        }
        self.realtime_patterns
            .insert(pattern.id.clone(), pattern.clone());
        self.overlay.add_trip(pattern, tosd);
        self.dirty = true;
    }

    /// Records that `source` wrote the realtime row of a trip on `date`.
    /// `pattern` is the trip's own pattern, not a modified one.
    pub(crate) fn set_source(
        &mut self,
        trip_id: &FeedScopedId,
        date: NaiveDate,
        source: &str,
        pattern: Arc<TripPattern>,
    ) {
        let row = RowSource {
            source: source.to_string(),
            pattern,
        };
        self.row_sources.insert((trip_id.clone(), date), row);
    }

    /// The source that last wrote the realtime row of a trip on `date`.
    pub fn source_of(&self, trip_id: &FeedScopedId, date: NaiveDate) -> Option<&str> {
        self.row_sources
            .get(&(trip_id.clone(), date))
            .map(|row| row.source.as_str())
    }

    /// Undoes every realtime row written by `source`.
    ///
    /// Scheduled trips go back to their scheduled times and leave any
    /// modified pattern; trips the source added are dropped from the
    /// overlay. Rows of other sources are kept.
    pub(crate) fn clear(&mut self, source: &str) {
        let before = self.timetables.len();
        let written: Vec<(TimetableKey, Arc<TripPattern>)> = self
            .row_sources
            .iter()
            .filter(|(_, row)| row.source == source)
            .map(|(key, row)| (key.clone(), row.pattern.clone()))
            .collect();

        for ((trip_id, date), pattern) in &written {
            let key = (trip_id.clone(), *date);
            self.row_sources.remove(&key);
            if let Some(modified) = self.modified_trip_patterns.remove(&key) {
                self.restore_scheduled(&modified, trip_id, *date);
            }
            self.restore_scheduled(pattern, trip_id, *date);
        }
        self.overlay.remove_trips(|tosd| {
            written
                .iter()
                .any(|((trip_id, date), _)| *trip_id == tosd.trip.id && *date == tosd.service_date)
        });
        self.drop_unused_patterns();
        trace!(source, rows = written.len(), before, after = self.timetables.len(), "cleared source");
        self.dirty = true;
    }

    /// Puts the scheduled row of a trip back into the realtime timetable of
    /// `pattern`, or removes the row if the pattern has none. A timetable
    /// left with only scheduled rows is dropped.
    fn restore_scheduled(&mut self, pattern: &TripPattern, trip_id: &FeedScopedId, date: NaiveDate) {
        let key = (pattern.id.clone(), date);
        let Some(table) = self.timetables.get(&key) else {
            return;
        };
        let restored = match pattern.scheduled_trip_times(trip_id) {
            Some(scheduled) if !pattern.created_by_realtime => table.with_trip_times(scheduled.clone()),
            _ => table.without_trip(trip_id),
        };
        let realtime = restored
            .trip_times()
            .iter()
            .any(|t| t.state() != RealTimeState::Scheduled);
        if realtime {
            self.timetables.insert(key, Arc::new(restored));
        } else {
            self.timetables.remove(&key);
        }
    }

    /// Drops realtime data for service dates before `cutoff`.
    ///
    /// Returns true if anything was removed.
    pub(crate) fn purge_before(&mut self, cutoff: NaiveDate) -> bool {
        let before = self.timetables.len() + self.modified_trip_patterns.len();
        self.timetables.retain(|(_, date), _| *date >= cutoff);
        self.modified_trip_patterns
            .retain(|(_, date), _| *date >= cutoff);
        self.row_sources.retain(|(_, date), _| *date >= cutoff);
        let trips_before = self.overlay.num_trips();
        self.overlay.remove_trips(|tosd| tosd.service_date < cutoff);
        self.drop_unused_patterns();

        let removed = before != self.timetables.len() + self.modified_trip_patterns.len()
            || trips_before != self.overlay.num_trips();
        if removed {
            self.dirty = true;
        }
        removed
    }

    fn drop_unused_patterns(&mut self) {
        let timetables = &self.timetables;
        self.realtime_patterns
            .retain(|id, _| timetables.keys().any(|(pattern_id, _)| pattern_id == id));
    }
}

fn copy_with_date(table: &Timetable, date: NaiveDate) -> Timetable {
    let mut dated = Timetable::new(table.pattern_id().clone(), Some(date));
    for times in table.trip_times() {
        dated = dated.with_trip_times(times.clone());
    }
    dated
}
