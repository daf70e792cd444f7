//! Read-only index over the static schedule.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::domain::{
    Agency, FeedScopedId, Operator, Route, Station, Stop, Trip, TripOnServiceDate, TripPattern,
};

/// The static transit model, keyed by id.
///
/// Built once with [`TransitIndexBuilder`] and never mutated afterwards.
/// Entities created from realtime data live in the snapshot overlay
/// instead.
#[derive(Debug)]
pub struct TransitIndex {
    time_zone: Tz,
    default_agency: Option<Arc<Agency>>,
    agencies: HashMap<FeedScopedId, Arc<Agency>>,
    operators: HashMap<FeedScopedId, Arc<Operator>>,
    stations: HashMap<FeedScopedId, Arc<Station>>,
    stops: HashMap<FeedScopedId, Arc<Stop>>,
    routes: HashMap<FeedScopedId, Arc<Route>>,
    trips: HashMap<FeedScopedId, Arc<Trip>>,
    patterns: HashMap<FeedScopedId, Arc<TripPattern>>,
    pattern_for_trip: HashMap<FeedScopedId, Arc<TripPattern>>,
    patterns_for_route: HashMap<FeedScopedId, Vec<Arc<TripPattern>>>,
    trip_on_service_dates: HashMap<FeedScopedId, Arc<TripOnServiceDate>>,
    trip_on_service_date_by_trip: HashMap<(FeedScopedId, NaiveDate), Arc<TripOnServiceDate>>,
    service_dates: HashMap<FeedScopedId, BTreeSet<NaiveDate>>,
}

impl TransitIndex {
    pub fn builder(time_zone: Tz) -> TransitIndexBuilder {
        TransitIndexBuilder {
            index: TransitIndex {
                time_zone,
                default_agency: None,
                agencies: HashMap::new(),
                operators: HashMap::new(),
                stations: HashMap::new(),
                stops: HashMap::new(),
                routes: HashMap::new(),
                trips: HashMap::new(),
                patterns: HashMap::new(),
                pattern_for_trip: HashMap::new(),
                patterns_for_route: HashMap::new(),
                trip_on_service_dates: HashMap::new(),
                trip_on_service_date_by_trip: HashMap::new(),
                service_dates: HashMap::new(),
            },
        }
    }

    /// Zone in which service days start.
    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// The first agency registered, used for routes with no better choice.
    pub fn default_agency(&self) -> Option<&Arc<Agency>> {
        self.default_agency.as_ref()
    }

    pub fn agency(&self, id: &FeedScopedId) -> Option<&Arc<Agency>> {
        self.agencies.get(id)
    }

    pub fn operator(&self, id: &FeedScopedId) -> Option<&Arc<Operator>> {
        self.operators.get(id)
    }

    pub fn station(&self, id: &FeedScopedId) -> Option<&Arc<Station>> {
        self.stations.get(id)
    }

    pub fn stop(&self, id: &FeedScopedId) -> Option<&Arc<Stop>> {
        self.stops.get(id)
    }

    pub fn route(&self, id: &FeedScopedId) -> Option<&Arc<Route>> {
        self.routes.get(id)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.values()
    }

    pub fn trip(&self, id: &FeedScopedId) -> Option<&Arc<Trip>> {
        self.trips.get(id)
    }

    pub fn trip_pattern(&self, id: &FeedScopedId) -> Option<&Arc<TripPattern>> {
        self.patterns.get(id)
    }

    pub fn trip_patterns(&self) -> impl Iterator<Item = &Arc<TripPattern>> {
        self.patterns.values()
    }

    pub fn pattern_for_trip(&self, trip_id: &FeedScopedId) -> Option<&Arc<TripPattern>> {
        self.pattern_for_trip.get(trip_id)
    }

    pub fn patterns_for_route(&self, route_id: &FeedScopedId) -> &[Arc<TripPattern>] {
        self.patterns_for_route
            .get(route_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn trip_on_service_date(&self, id: &FeedScopedId) -> Option<&Arc<TripOnServiceDate>> {
        self.trip_on_service_dates.get(id)
    }

    pub fn trip_on_service_date_for(
        &self,
        trip_id: &FeedScopedId,
        date: NaiveDate,
    ) -> Option<&Arc<TripOnServiceDate>> {
        self.trip_on_service_date_by_trip
            .get(&(trip_id.clone(), date))
    }

    /// True if the service runs on `date`.
    pub fn runs_on(&self, service_id: &FeedScopedId, date: NaiveDate) -> bool {
        self.service_dates
            .get(service_id)
            .is_some_and(|dates| dates.contains(&date))
    }

    pub fn num_trips(&self) -> usize {
        self.trips.len()
    }

    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }
}

/// Collects entities and builds a [`TransitIndex`].
#[derive(Debug)]
pub struct TransitIndexBuilder {
    index: TransitIndex,
}

impl TransitIndexBuilder {
    pub fn add_agency(&mut self, agency: Arc<Agency>) -> &mut Self {
        if self.index.default_agency.is_none() {
            self.index.default_agency = Some(agency.clone());
        }
        self.index.agencies.insert(agency.id.clone(), agency);
        self
    }

    pub fn add_operator(&mut self, operator: Arc<Operator>) -> &mut Self {
        self.index.operators.insert(operator.id.clone(), operator);
        self
    }

    pub fn add_station(&mut self, station: Arc<Station>) -> &mut Self {
        self.index.stations.insert(station.id.clone(), station);
        self
    }

    pub fn add_stop(&mut self, stop: Arc<Stop>) -> &mut Self {
        self.index.stops.insert(stop.id.clone(), stop);
        self
    }

    pub fn add_route(&mut self, route: Arc<Route>) -> &mut Self {
        self.index.routes.insert(route.id.clone(), route);
        self
    }

    /// Adds a pattern and every trip in its scheduled timetable.
    pub fn add_trip_pattern(&mut self, pattern: Arc<TripPattern>) -> &mut Self {
        for times in pattern.scheduled_timetable.trip_times() {
            let trip = times.trip();
            self.index.trips.insert(trip.id.clone(), trip.clone());
            self.index
                .pattern_for_trip
                .insert(trip.id.clone(), pattern.clone());
        }
        self.index
            .patterns_for_route
            .entry(pattern.route.id.clone())
            .or_default()
            .push(pattern.clone());
        self.index.patterns.insert(pattern.id.clone(), pattern);
        self
    }

    pub fn add_trip_on_service_date(&mut self, tosd: Arc<TripOnServiceDate>) -> &mut Self {
        self.index
            .trip_on_service_date_by_trip
            .insert((tosd.trip.id.clone(), tosd.service_date), tosd.clone());
        self.index
            .trip_on_service_dates
            .insert(tosd.id.clone(), tosd);
        self
    }

    pub fn add_service_dates(
        &mut self,
        service_id: FeedScopedId,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> &mut Self {
        self.index
            .service_dates
            .entry(service_id)
            .or_default()
            .extend(dates);
        self
    }

    pub fn build(self) -> TransitIndex {
        self.index
    }
}
