//! Resolution of message references to schedule entities.

use std::sync::Arc;

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use chrono_tz::Tz;

use crate::domain::{
    Agency, FeedScopedId, Operator, Route, SECONDS_PER_DAY, Stop, Trip, TripOnServiceDate,
    TripPattern, TripTimes, local_date,
};
use crate::siri::{Call, CallWrapper, EstimatedVehicleJourney, FramedVehicleJourneyRef};
use crate::snapshot::TimetableSnapshot;

use super::TransitIndex;

/// Kinds of entity a reference can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Stop,
    Route,
    Trip,
    Operator,
    Agency,
    TripOnServiceDate,
}

/// A resolved entity.
#[derive(Debug, Clone)]
pub enum Entity {
    Stop(Arc<Stop>),
    Route(Arc<Route>),
    Trip(Arc<Trip>),
    Operator(Arc<Operator>),
    Agency(Arc<Agency>),
    TripOnServiceDate(Arc<TripOnServiceDate>),
}

/// Looks up entities by the string references used in messages.
///
/// References are local ids within one feed. Lookups go to the static
/// index first and then to the realtime overlay of the working snapshot,
/// so trips and routes added earlier in the same session are found too.
#[derive(Debug, Clone, Copy)]
pub struct EntityResolver<'a> {
    index: &'a TransitIndex,
    snapshot: &'a TimetableSnapshot,
    feed_id: &'a str,
}

impl<'a> EntityResolver<'a> {
    pub fn new(index: &'a TransitIndex, snapshot: &'a TimetableSnapshot, feed_id: &'a str) -> Self {
        Self {
            index,
            snapshot,
            feed_id,
        }
    }

    pub fn feed_id(&self) -> &'a str {
        self.feed_id
    }

    pub fn index(&self) -> &'a TransitIndex {
        self.index
    }

    pub fn snapshot(&self) -> &'a TimetableSnapshot {
        self.snapshot
    }

    pub fn time_zone(&self) -> Tz {
        self.index.time_zone()
    }

    /// Qualifies a message reference with this resolver's feed.
    pub fn id(&self, reference: &str) -> FeedScopedId {
        FeedScopedId::new(self.feed_id, reference)
    }

    /// Resolves a reference of the given kind.
    pub fn resolve(&self, reference: &str, kind: EntityKind) -> Option<Entity> {
        match kind {
            EntityKind::Stop => self.resolve_stop(reference).map(Entity::Stop),
            EntityKind::Route => self.resolve_route(reference).map(Entity::Route),
            EntityKind::Trip => self.resolve_trip(reference).map(Entity::Trip),
            EntityKind::Operator => self.resolve_operator(reference).map(Entity::Operator),
            EntityKind::Agency => self.resolve_agency(reference).map(Entity::Agency),
            EntityKind::TripOnServiceDate => self
                .resolve_trip_on_service_date(reference)
                .map(Entity::TripOnServiceDate),
        }
    }

    pub fn resolve_stop(&self, reference: &str) -> Option<Arc<Stop>> {
        self.index.stop(&self.id(reference)).cloned()
    }

    pub fn resolve_route(&self, reference: &str) -> Option<Arc<Route>> {
        let id = self.id(reference);
        self.index
            .route(&id)
            .or_else(|| self.snapshot.overlay().route(&id))
            .cloned()
    }

    pub fn resolve_trip(&self, reference: &str) -> Option<Arc<Trip>> {
        let id = self.id(reference);
        self.index
            .trip(&id)
            .or_else(|| self.snapshot.overlay().trip(&id))
            .cloned()
    }

    pub fn resolve_operator(&self, reference: &str) -> Option<Arc<Operator>> {
        self.index.operator(&self.id(reference)).cloned()
    }

    pub fn resolve_agency(&self, reference: &str) -> Option<Arc<Agency>> {
        self.index.agency(&self.id(reference)).cloned()
    }

    pub fn resolve_trip_on_service_date(&self, reference: &str) -> Option<Arc<TripOnServiceDate>> {
        let id = self.id(reference);
        self.index
            .trip_on_service_date(&id)
            .or_else(|| self.snapshot.overlay().trip_on_service_date(&id))
            .cloned()
    }

    /// The dated trip a framed reference points at, if one is registered.
    pub fn resolve_framed_trip_on_service_date(
        &self,
        framed: &FramedVehicleJourneyRef,
    ) -> Option<Arc<TripOnServiceDate>> {
        let date = parse_service_date(&framed.data_frame_ref)?;
        self.index
            .trip_on_service_date_for(&self.id(&framed.dated_vehicle_journey_ref), date)
            .cloned()
    }

    /// Finds the trip a journey refers to, without fuzzy matching.
    ///
    /// Tries the dated vehicle journey reference and the estimated vehicle
    /// journey code as dated trip ids, then the framed reference (dated trip
    /// first, plain trip id second), then the two ids as plain trip ids.
    pub fn resolve_journey_trip(&self, journey: &EstimatedVehicleJourney) -> Option<Arc<Trip>> {
        let dated_refs = [
            journey.dated_vehicle_journey_ref.as_deref(),
            journey.estimated_vehicle_journey_code.as_deref(),
        ];

        dated_refs
            .iter()
            .flatten()
            .find_map(|r| self.resolve_trip_on_service_date(r))
            .map(|tosd| tosd.trip.clone())
            .or_else(|| {
                let framed = journey.framed_vehicle_journey_ref.as_ref()?;
                self.resolve_framed_trip_on_service_date(framed)
                    .map(|tosd| tosd.trip.clone())
                    .or_else(|| self.resolve_trip(&framed.dated_vehicle_journey_ref))
            })
            .or_else(|| dated_refs.iter().flatten().find_map(|r| self.resolve_trip(r)))
    }

    /// Determines the service date of a journey.
    ///
    /// In order: the framed reference's date, the date of the referenced
    /// dated trip in the schedule, and the local date of the origin
    /// departure, moved back a day for each full day the trip's first
    /// scheduled departure lies past the start of service.
    ///
    /// Added trips are not consulted: their dated trip id is reused across
    /// dates, so it says nothing about the date of a new message.
    pub fn resolve_service_date(
        &self,
        journey: &EstimatedVehicleJourney,
        trip: Option<&Trip>,
    ) -> Option<NaiveDate> {
        if let Some(date) = journey
            .framed_vehicle_journey_ref
            .as_ref()
            .and_then(|f| parse_service_date(&f.data_frame_ref))
        {
            return Some(date);
        }

        let dated = [
            journey.dated_vehicle_journey_ref.as_deref(),
            journey.estimated_vehicle_journey_code.as_deref(),
        ];
        if let Some(tosd) = dated
            .iter()
            .flatten()
            .find_map(|r| self.index.trip_on_service_date(&self.id(r)))
        {
            return Some(tosd.service_date);
        }

        let departure = origin_departure(journey)?;
        let date = local_date(&departure, self.time_zone());
        let days_past_midnight = trip
            .and_then(|t| self.scheduled_trip_times(&t.id))
            .map(|times| times.scheduled_first_departure() / SECONDS_PER_DAY)
            .filter(|days| *days > 0)
            .unwrap_or(0);

        date.checked_sub_days(Days::new(days_past_midnight as u64))
    }

    /// The pattern a trip follows on `date`, in the static schedule or the
    /// overlay.
    pub fn pattern_for_trip(&self, trip_id: &FeedScopedId, date: NaiveDate) -> Option<Arc<TripPattern>> {
        self.index
            .pattern_for_trip(trip_id)
            .or_else(|| self.snapshot.overlay().pattern_for_trip(trip_id, date))
            .cloned()
    }

    /// The scheduled times of a trip in the static schedule.
    pub fn scheduled_trip_times(&self, trip_id: &FeedScopedId) -> Option<Arc<TripTimes>> {
        self.index
            .pattern_for_trip(trip_id)?
            .scheduled_trip_times(trip_id)
            .cloned()
    }

    /// True if the trip is in the static schedule or was added for `date`.
    pub fn is_known_on(&self, trip_id: &FeedScopedId, date: NaiveDate) -> bool {
        self.index.trip(trip_id).is_some()
            || self
                .snapshot
                .overlay()
                .trip_on_service_date_for(trip_id, date)
                .is_some()
    }

    /// Static and realtime patterns of a route.
    pub fn patterns_for_route(&self, route_id: &FeedScopedId) -> Vec<Arc<TripPattern>> {
        self.index
            .patterns_for_route(route_id)
            .iter()
            .chain(self.snapshot.overlay().patterns_for_route(route_id))
            .cloned()
            .collect()
    }

    /// True if the service runs on `date`.
    pub fn runs_on(&self, service_id: &FeedScopedId, date: NaiveDate) -> bool {
        self.index.runs_on(service_id, date) || self.snapshot.overlay().runs_on(service_id, date)
    }

    /// Any route run by `operator`, used to pick an agency for new routes.
    pub fn route_for_operator(&self, operator: &FeedScopedId) -> Option<Arc<Route>> {
        self.index
            .routes()
            .filter(|r| r.is_operated_by(operator))
            .min_by(|a, b| a.id.cmp(&b.id))
            .cloned()
    }

    pub fn default_agency(&self) -> Option<Arc<Agency>> {
        self.index.default_agency().cloned()
    }
}

/// Departure time of the journey from its origin: the declared origin
/// aimed departure, else the aimed departure of the first call.
pub fn origin_departure(journey: &EstimatedVehicleJourney) -> Option<DateTime<FixedOffset>> {
    journey.origin_aimed_departure_time.or_else(|| {
        CallWrapper::of(journey)
            .first()
            .and_then(|c| c.aimed_departure_time().or(c.aimed_arrival_time()))
    })
}

fn parse_service_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
