//! Timetables: the trip times of one pattern on one service date.

use std::sync::Arc;

use chrono::NaiveDate;

use super::{FeedScopedId, TripTimes};

/// The [`TripTimes`] running on a trip pattern.
///
/// A timetable without a service date is the static schedule of the
/// pattern. Realtime timetables carry a date and live in a snapshot.
/// Rows are kept ordered by first departure, then trip id.
#[derive(Debug, Clone, PartialEq)]
pub struct Timetable {
    pattern_id: FeedScopedId,
    service_date: Option<NaiveDate>,
    trip_times: Vec<Arc<TripTimes>>,
}

impl Timetable {
    pub fn new(pattern_id: FeedScopedId, service_date: Option<NaiveDate>) -> Self {
        Self {
            pattern_id,
            service_date,
            trip_times: Vec::new(),
        }
    }

    pub fn pattern_id(&self) -> &FeedScopedId {
        &self.pattern_id
    }

    pub fn service_date(&self) -> Option<NaiveDate> {
        self.service_date
    }

    pub fn trip_times(&self) -> &[Arc<TripTimes>] {
        &self.trip_times
    }

    pub fn len(&self) -> usize {
        self.trip_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trip_times.is_empty()
    }

    pub fn get(&self, trip_id: &FeedScopedId) -> Option<&Arc<TripTimes>> {
        self.trip_times.iter().find(|t| t.trip_id() == trip_id)
    }

    /// Returns a copy with `times` inserted, replacing any row for the
    /// same trip.
    pub fn with_trip_times(&self, times: Arc<TripTimes>) -> Timetable {
        let mut copy = self.without_trip(times.trip_id());
        let position = copy.trip_times.partition_point(|t| {
            (t.first_departure(), t.trip_id()) < (times.first_departure(), times.trip_id())
        });
        copy.trip_times.insert(position, times);
        copy
    }

    /// Returns a copy without the row for `trip_id`.
    pub fn without_trip(&self, trip_id: &FeedScopedId) -> Timetable {
        Timetable {
            pattern_id: self.pattern_id.clone(),
            service_date: self.service_date,
            trip_times: self
                .trip_times
                .iter()
                .filter(|t| t.trip_id() != trip_id)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Agency, Route, TransitMode, Trip};

    fn times(trip_id: &str, first_departure: i32) -> Arc<TripTimes> {
        let agency = Arc::new(Agency::new(FeedScopedId::new("F", "A"), "A", chrono_tz::UTC));
        let route = Arc::new(Route::new(FeedScopedId::new("F", "R"), agency, TransitMode::Bus));
        let trip = Arc::new(Trip::new(
            FeedScopedId::new("F", trip_id),
            route,
            FeedScopedId::new("F", "S"),
        ));
        Arc::new(
            TripTimes::scheduled(
                trip,
                vec![first_departure, first_departure + 600],
                vec![first_departure, first_departure + 600],
            )
            .unwrap(),
        )
    }

    #[test]
    fn rows_sorted_by_first_departure() {
        let table = Timetable::new(FeedScopedId::new("F", "P"), None)
            .with_trip_times(times("late", 2000))
            .with_trip_times(times("early", 1000))
            .with_trip_times(times("middle", 1500));

        let ids: Vec<_> = table.trip_times().iter().map(|t| t.trip_id().id()).collect();
        assert_eq!(ids, ["early", "middle", "late"]);
    }

    #[test]
    fn insert_replaces_same_trip() {
        let table = Timetable::new(FeedScopedId::new("F", "P"), None)
            .with_trip_times(times("t", 1000))
            .with_trip_times(times("t", 1200));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&FeedScopedId::new("F", "t")).unwrap().first_departure(), 1200);
    }

    #[test]
    fn copy_on_write_leaves_original() {
        let original = Timetable::new(FeedScopedId::new("F", "P"), None).with_trip_times(times("t", 1000));
        let removed = original.without_trip(&FeedScopedId::new("F", "t"));

        assert_eq!(original.len(), 1);
        assert!(removed.is_empty());
    }
}
