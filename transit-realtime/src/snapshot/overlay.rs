//! Entities created from realtime data.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{FeedScopedId, Route, Trip, TripOnServiceDate, TripPattern};

/// An added trip on one service date.
#[derive(Debug, Clone)]
struct AddedTripEntry {
    pattern: Arc<TripPattern>,
    trip_on_service_date: Arc<TripOnServiceDate>,
}

/// Routes, trips and patterns that exist only because an added journey
/// introduced them. Consulted by the entity resolver after the static
/// index.
///
/// Added trips are kept per service date: the same journey code sent for
/// two dates gives two independent trips, each with its own pattern. The
/// dated trip id of an added trip is its trip id.
#[derive(Debug, Clone, Default)]
pub struct TransitOverlay {
    routes: HashMap<FeedScopedId, Arc<Route>>,
    added_trips: HashMap<FeedScopedId, BTreeMap<NaiveDate, AddedTripEntry>>,
    patterns_for_route: HashMap<FeedScopedId, Vec<Arc<TripPattern>>>,
    service_dates: HashMap<FeedScopedId, BTreeSet<NaiveDate>>,
}

/// Service id used for added trips running on `date`.
pub fn service_id_for_date(feed_id: &str, date: NaiveDate) -> FeedScopedId {
    FeedScopedId::new(feed_id, format!("RT:{}", date.format("%Y%m%d")))
}

impl TransitOverlay {
    pub fn route(&self, id: &FeedScopedId) -> Option<&Arc<Route>> {
        self.routes.get(id)
    }

    /// The added trip with this id on its latest service date.
    pub fn trip(&self, id: &FeedScopedId) -> Option<&Arc<Trip>> {
        self.trip_on_service_date(id).map(|tosd| &tosd.trip)
    }

    pub fn pattern_for_trip(&self, trip_id: &FeedScopedId, date: NaiveDate) -> Option<&Arc<TripPattern>> {
        self.entry(trip_id, date).map(|e| &e.pattern)
    }

    pub fn patterns_for_route(&self, route_id: &FeedScopedId) -> &[Arc<TripPattern>] {
        self.patterns_for_route
            .get(route_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The dated trip with this id on its latest service date.
    pub fn trip_on_service_date(&self, id: &FeedScopedId) -> Option<&Arc<TripOnServiceDate>> {
        self.added_trips
            .get(id)?
            .values()
            .next_back()
            .map(|e| &e.trip_on_service_date)
    }

    /// The trip added with this id for `date`, if any.
    pub fn trip_on_service_date_for(
        &self,
        trip_id: &FeedScopedId,
        date: NaiveDate,
    ) -> Option<&Arc<TripOnServiceDate>> {
        self.entry(trip_id, date).map(|e| &e.trip_on_service_date)
    }

    pub fn runs_on(&self, service_id: &FeedScopedId, date: NaiveDate) -> bool {
        self.service_dates
            .get(service_id)
            .is_some_and(|dates| dates.contains(&date))
    }

    /// Number of added trips, counting each service date separately.
    pub fn num_trips(&self) -> usize {
        self.added_trips.values().map(BTreeMap::len).sum()
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    fn entry(&self, trip_id: &FeedScopedId, date: NaiveDate) -> Option<&AddedTripEntry> {
        self.added_trips.get(trip_id)?.get(&date)
    }

    pub(crate) fn add_route(&mut self, route: Arc<Route>) {
        self.routes.insert(route.id.clone(), route);
    }

    /// Registers an added trip, replacing the one with the same id on the
    /// same service date.
    pub(crate) fn add_trip(
        &mut self,
        pattern: Arc<TripPattern>,
        tosd: Arc<TripOnServiceDate>,
    ) {
        let trip = tosd.trip.clone();
        self.service_dates
            .entry(trip.service_id.clone())
            .or_default()
            .insert(tosd.service_date);

        let route_patterns = self
            .patterns_for_route
            .entry(pattern.route.id.clone())
            .or_default();
        route_patterns.retain(|p| p.id != pattern.id);
        route_patterns.push(pattern.clone());

        let entry = AddedTripEntry {
            pattern,
            trip_on_service_date: tosd.clone(),
        };
        let previous = self
            .added_trips
            .entry(trip.id.clone())
            .or_default()
            .insert(tosd.service_date, entry);
        if let Some(previous) = previous {
            self.remove_pattern_from_route(&previous.pattern);
        }
    }

    fn remove_pattern_from_route(&mut self, pattern: &TripPattern) {
        let still_used = self
            .added_trips
            .values()
            .flat_map(BTreeMap::values)
            .any(|e| e.pattern.id == pattern.id);
        if still_used {
            return;
        }
        if let Some(patterns) = self.patterns_for_route.get_mut(&pattern.route.id) {
            patterns.retain(|p| p.id != pattern.id);
        }
    }

    /// Removes added trips matching `remove`. Routes stay registered so later
    /// journeys on the same line keep sharing them.
    pub(crate) fn remove_trips(&mut self, remove: impl Fn(&TripOnServiceDate) -> bool) {
        let mut removed = Vec::new();
        for dates in self.added_trips.values_mut() {
            dates.retain(|_, e| {
                let keep = !remove(&e.trip_on_service_date);
                if !keep {
                    removed.push(e.pattern.clone());
                }
                keep
            });
        }
        self.added_trips.retain(|_, dates| !dates.is_empty());

        for pattern in removed {
            self.remove_pattern_from_route(&pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{self, FEED, id};

    fn added(
        model: &test_fixtures::TestModel,
        pattern_id: &str,
        date: NaiveDate,
    ) -> (Arc<TripPattern>, Arc<TripOnServiceDate>) {
        let pattern = Arc::new(
            TripPattern::new(id(pattern_id), model.route.clone(), model.pattern.stop_pattern.clone())
                .created_by_realtime(None),
        );
        let trip = Arc::new(Trip::new(
            id("EXTRA"),
            model.route.clone(),
            service_id_for_date(FEED, date),
        ));
        (pattern, Arc::new(TripOnServiceDate::new(id("EXTRA"), trip, date)))
    }

    #[test]
    fn same_trip_on_two_dates() {
        let model = test_fixtures::model();
        let first = test_fixtures::service_date();
        let second = first.succ_opt().unwrap();
        let mut overlay = TransitOverlay::default();

        let (pattern, tosd) = added(&model, "P_FIRST", first);
        overlay.add_trip(pattern, tosd);
        let (pattern, tosd) = added(&model, "P_SECOND", second);
        overlay.add_trip(pattern, tosd);

        assert_eq!(overlay.num_trips(), 2);
        assert_eq!(overlay.pattern_for_trip(&id("EXTRA"), first).unwrap().id, id("P_FIRST"));
        assert_eq!(overlay.pattern_for_trip(&id("EXTRA"), second).unwrap().id, id("P_SECOND"));
        assert_eq!(overlay.trip_on_service_date(&id("EXTRA")).unwrap().service_date, second);
        assert!(overlay.runs_on(&service_id_for_date(FEED, first), first));
        assert_eq!(overlay.patterns_for_route(&model.route.id).len(), 2);

        overlay.remove_trips(|tosd| tosd.service_date == second);
        assert_eq!(overlay.num_trips(), 1);
        assert_eq!(overlay.trip(&id("EXTRA")).unwrap().service_id, service_id_for_date(FEED, first));
        assert!(overlay.trip_on_service_date_for(&id("EXTRA"), second).is_none());
        assert_eq!(overlay.patterns_for_route(&model.route.id).len(), 1);
    }

    #[test]
    fn replacing_trip_drops_unused_pattern() {
        let model = test_fixtures::model();
        let date = test_fixtures::service_date();
        let mut overlay = TransitOverlay::default();

        let (pattern, tosd) = added(&model, "P_OLD", date);
        overlay.add_trip(pattern, tosd);
        let (pattern, tosd) = added(&model, "P_NEW", date);
        overlay.add_trip(pattern, tosd);

        assert_eq!(overlay.num_trips(), 1);
        let patterns = overlay.patterns_for_route(&model.route.id);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].id, id("P_NEW"));
    }
}
