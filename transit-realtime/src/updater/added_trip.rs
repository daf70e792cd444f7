//! Trips that are not in the static schedule.
//!
//! An extra journey gets a trip, a single-trip pattern and a dated trip of
//! its own. Its route is the static route named by the line reference, an
//! overlay route created by an earlier extra journey on the same line, or a
//! new route.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{
    FeedScopedId, Operator, Route, SubMode, TransitMode, Trip, TripOnServiceDate, TripPattern,
    TripTimes, UpdateError, UpdateErrorType,
};
use crate::schedule::EntityResolver;
use crate::siri::{CallWrapper, EstimatedVehicleJourney};
use crate::snapshot::{TripPatternIdGenerator, service_id_for_date};

use super::trip_times::build_for_added_trip;

/// Submode of an added trip.
///
/// A bus replacing a rail route is a rail replacement bus and a train
/// replacing one is a replacement rail service; other replacements keep the
/// replaced route's submode.
///
/// ```
/// use transit_realtime::domain::{SubMode, TransitMode};
/// use transit_realtime::updater::resolve_submode;
///
/// let submode = resolve_submode(TransitMode::Bus, Some((TransitMode::Rail, &SubMode::UNKNOWN)));
/// assert_eq!(submode.as_str(), Some(SubMode::RAIL_REPLACEMENT_BUS));
/// assert!(resolve_submode(TransitMode::Bus, None).is_unknown());
/// ```
pub fn resolve_submode(mode: TransitMode, replaced: Option<(TransitMode, &SubMode)>) -> SubMode {
    match replaced {
        Some((TransitMode::Rail, _)) if mode == TransitMode::Bus => {
            SubMode::of(SubMode::RAIL_REPLACEMENT_BUS)
        }
        Some((TransitMode::Rail, _)) if mode == TransitMode::Rail => {
            SubMode::of(SubMode::REPLACEMENT_RAIL_SERVICE)
        }
        Some((_, submode)) => submode.clone(),
        None => SubMode::UNKNOWN,
    }
}

/// Everything created for one added trip.
///
/// Nothing is registered anywhere yet; the caller writes it to the
/// snapshot buffer once the whole journey has been accepted.
#[derive(Debug, Clone)]
pub struct AddedTrip {
    pub trip: Arc<Trip>,
    pub route: Arc<Route>,
    /// True if `route` was created for this trip.
    pub new_route: bool,
    pub trip_pattern: Arc<TripPattern>,
    pub trip_on_service_date: Arc<TripOnServiceDate>,
    pub service_date: NaiveDate,
    /// The realtime row: ADDED, or CANCELED for a cancelled journey.
    pub times: TripTimes,
}

/// Builds an [`AddedTrip`] from the fields of an extra journey.
#[derive(Debug, Clone)]
pub struct AddedTripBuilder<'a> {
    resolver: EntityResolver<'a>,
    trip_id: FeedScopedId,
    operator: Option<Arc<Operator>>,
    line_ref: Option<String>,
    replaced_route: Option<Arc<Route>>,
    service_date: Option<NaiveDate>,
    mode: TransitMode,
    submode: Option<SubMode>,
    calls: Vec<CallWrapper<'a>>,
    headsign: Option<String>,
    short_name: Option<String>,
    replaced_trips: Vec<Arc<TripOnServiceDate>>,
    cancellation: bool,
    prediction_inaccurate: bool,
}

impl<'a> AddedTripBuilder<'a> {
    pub fn new(resolver: EntityResolver<'a>, trip_id: FeedScopedId) -> Self {
        Self {
            resolver,
            trip_id,
            operator: None,
            line_ref: None,
            replaced_route: None,
            service_date: None,
            mode: TransitMode::Bus,
            submode: None,
            calls: Vec::new(),
            headsign: None,
            short_name: None,
            replaced_trips: Vec::new(),
            cancellation: false,
            prediction_inaccurate: false,
        }
    }

    /// Reads the builder's inputs from an extra journey.
    ///
    /// The trip id is the estimated vehicle journey code; without one the
    /// journey cannot be added and the result is an `UNKNOWN` error.
    pub fn from_journey(
        resolver: EntityResolver<'a>,
        journey: &'a EstimatedVehicleJourney,
        service_date: Option<NaiveDate>,
    ) -> Result<Self, UpdateError> {
        let code = journey
            .estimated_vehicle_journey_code
            .as_deref()
            .ok_or_else(|| UpdateError::new(UpdateErrorType::Unknown))?;

        let replaced_route = journey
            .external_line_ref
            .as_deref()
            .and_then(|r| resolver.resolve_route(r));
        let mode = journey
            .vehicle_modes
            .first()
            .map(|m| m.transit_mode())
            .or(replaced_route.as_ref().map(|r| r.mode))
            .unwrap_or(TransitMode::Bus);
        let replaced_trips = journey
            .additional_vehicle_journey_refs
            .iter()
            .filter_map(|r| resolver.resolve_framed_trip_on_service_date(r))
            .collect();

        let builder = Self::new(resolver, resolver.id(code))
            .with_line_ref(journey.line_ref.clone())
            .with_operator(
                journey
                    .operator_ref
                    .as_deref()
                    .and_then(|r| resolver.resolve_operator(r)),
            )
            .with_replaced_route(replaced_route)
            .with_service_date(service_date)
            .with_mode(mode)
            .with_calls(CallWrapper::of(journey))
            .with_headsign(journey.destination_names.first().cloned())
            .with_short_name(journey.published_line_names.first().cloned())
            .with_replaced_trips(replaced_trips)
            .with_cancellation(journey.is_cancelled())
            .with_prediction_inaccurate(journey.prediction_inaccurate == Some(true));
        Ok(builder)
    }

    pub fn with_operator(mut self, operator: Option<Arc<Operator>>) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_line_ref(mut self, line_ref: Option<String>) -> Self {
        self.line_ref = line_ref;
        self
    }

    pub fn with_replaced_route(mut self, route: Option<Arc<Route>>) -> Self {
        self.replaced_route = route;
        self
    }

    pub fn with_service_date(mut self, date: Option<NaiveDate>) -> Self {
        self.service_date = date;
        self
    }

    pub fn with_mode(mut self, mode: TransitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the submode derived from the replaced route.
    pub fn with_submode(mut self, submode: SubMode) -> Self {
        self.submode = Some(submode);
        self
    }

    pub fn with_calls(mut self, calls: Vec<CallWrapper<'a>>) -> Self {
        self.calls = calls;
        self
    }

    pub fn with_headsign(mut self, headsign: Option<String>) -> Self {
        self.headsign = headsign;
        self
    }

    pub fn with_short_name(mut self, short_name: Option<String>) -> Self {
        self.short_name = short_name;
        self
    }

    pub fn with_replaced_trips(mut self, trips: Vec<Arc<TripOnServiceDate>>) -> Self {
        self.replaced_trips = trips;
        self
    }

    pub fn with_cancellation(mut self, cancellation: bool) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_prediction_inaccurate(mut self, prediction_inaccurate: bool) -> Self {
        self.prediction_inaccurate = prediction_inaccurate;
        self
    }

    /// Builds the trip. Pattern ids come from `ids`.
    pub fn build(self, ids: &mut TripPatternIdGenerator) -> Result<AddedTrip, UpdateError> {
        let service_date = self.service_date.ok_or_else(|| {
            UpdateError::for_trip(UpdateErrorType::NoStartDate, self.trip_id.clone())
        })?;

        let submode = self.submode.clone().unwrap_or_else(|| {
            resolve_submode(
                self.mode,
                self.replaced_route.as_ref().map(|r| (r.mode, &r.submode)),
            )
        });
        let (route, new_route) = self.resolve_route(&submode)?;

        let trip = Arc::new(
            Trip::new(
                self.trip_id.clone(),
                route.clone(),
                service_id_for_date(self.resolver.feed_id(), service_date),
            )
            .with_headsign(self.headsign.clone())
            .with_short_name(self.short_name.clone())
            .with_mode(self.mode)
            .with_submode(submode.clone())
            .with_operator(self.operator.clone()),
        );

        let times = build_for_added_trip(
            trip.clone(),
            service_date,
            &self.calls,
            &self.resolver,
            self.prediction_inaccurate,
        )?;

        let trip_pattern = Arc::new(
            TripPattern::new(ids.generate(&route), route.clone(), Arc::new(times.stop_pattern))
                .with_mode(self.mode, submode)
                .with_scheduled_trip_times([Arc::new(times.scheduled)])
                .created_by_realtime(None),
        );

        let realtime = if self.cancellation || trip_pattern.stop_pattern.is_all_stops_non_routable()
        {
            times.realtime.cancel()
        } else {
            times.realtime
        };

        let trip_on_service_date = Arc::new(
            TripOnServiceDate::new(self.trip_id.clone(), trip.clone(), service_date)
                .with_replacement_for(self.replaced_trips),
        );

        Ok(AddedTrip {
            trip,
            route,
            new_route,
            trip_pattern,
            trip_on_service_date,
            service_date,
            times: realtime,
        })
    }

    /// The route named by the line reference, or a new one.
    ///
    /// A new route takes its agency from the replaced route, else from a
    /// route of the same operator, else the schedule's default agency.
    fn resolve_route(&self, submode: &SubMode) -> Result<(Arc<Route>, bool), UpdateError> {
        let unknown = || UpdateError::for_trip(UpdateErrorType::Unknown, self.trip_id.clone());
        let line_ref = self.line_ref.as_deref().ok_or_else(unknown)?;

        if let Some(route) = self.resolver.resolve_route(line_ref) {
            return Ok((route, false));
        }

        let agency = self
            .replaced_route
            .as_ref()
            .map(|r| r.agency.clone())
            .or_else(|| {
                let operator = self.operator.as_ref()?;
                self.resolver
                    .route_for_operator(&operator.id)
                    .map(|r| r.agency.clone())
            })
            .or_else(|| self.resolver.default_agency())
            .ok_or_else(unknown)?;

        let mut route = Route::new(self.resolver.id(line_ref), agency, self.mode)
            .with_submode(submode.clone());
        if let Some(operator) = &self.operator {
            route = route.with_operator(operator.clone());
        }
        if let Some(short_name) = &self.short_name {
            route = route.with_short_name(short_name.clone());
        }
        info!(route = %route.id, mode = %route.mode, submode = %route.submode, "creating route for added trip");
        Ok((Arc::new(route), true))
    }
}
