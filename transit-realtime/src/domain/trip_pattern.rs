//! Trip patterns: a route served with one particular stop pattern.

use std::sync::Arc;

use super::{FeedScopedId, Route, StopPattern, SubMode, Timetable, TransitMode, TripTimes};

/// A route and stop pattern pair, owning the scheduled timetable of all
/// trips that follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct TripPattern {
    pub id: FeedScopedId,
    pub route: Arc<Route>,
    pub stop_pattern: Arc<StopPattern>,
    pub mode: TransitMode,
    pub submode: SubMode,
    pub scheduled_timetable: Timetable,
    /// For patterns created from realtime data: the pattern it was derived
    /// from.
    pub original_trip_pattern: Option<Arc<TripPattern>>,
    pub created_by_realtime: bool,
}

impl TripPattern {
    pub fn new(id: FeedScopedId, route: Arc<Route>, stop_pattern: Arc<StopPattern>) -> Self {
        Self {
            scheduled_timetable: Timetable::new(id.clone(), None),
            mode: route.mode,
            submode: route.submode.clone(),
            id,
            route,
            stop_pattern,
            original_trip_pattern: None,
            created_by_realtime: false,
        }
    }

    pub fn with_mode(mut self, mode: TransitMode, submode: SubMode) -> Self {
        self.mode = mode;
        self.submode = submode;
        self
    }

    pub fn with_scheduled_trip_times(
        mut self,
        trip_times: impl IntoIterator<Item = Arc<TripTimes>>,
    ) -> Self {
        for times in trip_times {
            self.scheduled_timetable = self.scheduled_timetable.with_trip_times(times);
        }
        self
    }

    /// Marks the pattern as created by realtime processing, derived from
    /// `original` if given.
    pub fn created_by_realtime(mut self, original: Option<Arc<TripPattern>>) -> Self {
        self.created_by_realtime = true;
        self.original_trip_pattern = original;
        self
    }

    pub fn num_stops(&self) -> usize {
        self.stop_pattern.len()
    }

    pub fn scheduled_trip_times(&self, trip_id: &FeedScopedId) -> Option<&Arc<TripTimes>> {
        self.scheduled_timetable.get(trip_id)
    }
}
