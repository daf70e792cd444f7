//! Per-stop times of one trip.
//!
//! All times are seconds since the start of the service day (see
//! [`super::time`]). A [`TripTimes`] carries both the scheduled times and
//! the realtime times; the delay at each stop is derived from the two.
//! Realtime rows can only be produced through [`TripTimesBuilder::build`],
//! which rejects rows where time runs backwards.

use std::fmt;
use std::sync::Arc;

use super::{FeedScopedId, Trip};

/// How a [`TripTimes`] row relates to the static schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealTimeState {
    /// Straight from the static schedule.
    Scheduled,
    /// Times updated, stop pattern unchanged.
    Updated,
    /// Times updated on a modified stop pattern.
    Modified,
    /// Trip does not run.
    Canceled,
    /// Trip does not exist in the static schedule.
    Added,
}

/// What kind of ordering violation a row contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Departure before arrival at the same stop.
    NegativeDwellTime,
    /// Arrival before departure from the previous stop.
    NegativeHopTime,
    /// Arrival and departure arrays differ in length.
    StopCountMismatch,
}

/// Error returned when a row of times is not non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid trip times at stop {stop_index}: {kind:?}")]
pub struct TripTimesValidationError {
    pub stop_index: usize,
    pub kind: ValidationErrorKind,
}

/// Scheduled and realtime times of one trip over its stop pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct TripTimes {
    trip: Arc<Trip>,
    scheduled_arrivals: Arc<[i32]>,
    scheduled_departures: Arc<[i32]>,
    arrivals: Vec<i32>,
    departures: Vec<i32>,
    recorded: Vec<bool>,
    cancelled: Vec<bool>,
    prediction_inaccurate: Vec<bool>,
    state: RealTimeState,
}

impl TripTimes {
    /// Creates a scheduled row. Realtime times equal the scheduled ones.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use transit_realtime::domain::*;
    /// # let agency = Arc::new(Agency::new(FeedScopedId::new("F", "A"), "A", chrono_tz::UTC));
    /// # let route = Arc::new(Route::new(FeedScopedId::new("F", "R"), agency, TransitMode::Bus));
    /// # let trip = Arc::new(Trip::new(FeedScopedId::new("F", "T"), route, FeedScopedId::new("F", "S")));
    /// let times = TripTimes::scheduled(trip.clone(), vec![100, 200], vec![100, 210]).unwrap();
    /// assert_eq!(times.departure(1), 210);
    /// assert_eq!(times.state(), RealTimeState::Scheduled);
    ///
    /// // Arrives at the second stop before leaving the first
    /// let err = TripTimes::scheduled(trip, vec![100, 90], vec![100, 90]).unwrap_err();
    /// assert_eq!(err.stop_index, 1);
    /// ```
    pub fn scheduled(
        trip: Arc<Trip>,
        arrivals: Vec<i32>,
        departures: Vec<i32>,
    ) -> Result<Self, TripTimesValidationError> {
        if arrivals.len() != departures.len() {
            return Err(TripTimesValidationError {
                stop_index: arrivals.len().min(departures.len()),
                kind: ValidationErrorKind::StopCountMismatch,
            });
        }
        let n = arrivals.len();
        let times = Self {
            trip,
            scheduled_arrivals: Arc::from(arrivals.as_slice()),
            scheduled_departures: Arc::from(departures.as_slice()),
            arrivals,
            departures,
            recorded: vec![false; n],
            cancelled: vec![false; n],
            prediction_inaccurate: vec![false; n],
            state: RealTimeState::Scheduled,
        };
        times.validate()?;
        Ok(times)
    }

    pub fn trip(&self) -> &Arc<Trip> {
        &self.trip
    }

    pub fn trip_id(&self) -> &FeedScopedId {
        &self.trip.id
    }

    pub fn num_stops(&self) -> usize {
        self.arrivals.len()
    }

    pub fn state(&self) -> RealTimeState {
        self.state
    }

    pub fn is_canceled(&self) -> bool {
        self.state == RealTimeState::Canceled
    }

    pub fn scheduled_arrival(&self, stop: usize) -> i32 {
        self.scheduled_arrivals[stop]
    }

    pub fn scheduled_departure(&self, stop: usize) -> i32 {
        self.scheduled_departures[stop]
    }

    pub fn arrival(&self, stop: usize) -> i32 {
        self.arrivals[stop]
    }

    pub fn departure(&self, stop: usize) -> i32 {
        self.departures[stop]
    }

    pub fn arrival_delay(&self, stop: usize) -> i32 {
        self.arrivals[stop] - self.scheduled_arrivals[stop]
    }

    pub fn departure_delay(&self, stop: usize) -> i32 {
        self.departures[stop] - self.scheduled_departures[stop]
    }

    pub fn is_recorded(&self, stop: usize) -> bool {
        self.recorded[stop]
    }

    pub fn is_cancelled_stop(&self, stop: usize) -> bool {
        self.cancelled[stop]
    }

    pub fn is_prediction_inaccurate(&self, stop: usize) -> bool {
        self.prediction_inaccurate[stop]
    }

    /// Realtime departure from the first stop, used to order timetables.
    pub fn first_departure(&self) -> i32 {
        self.departures.first().copied().unwrap_or(0)
    }

    /// Scheduled departure from the first stop.
    pub fn scheduled_first_departure(&self) -> i32 {
        self.scheduled_departures.first().copied().unwrap_or(0)
    }

    /// A copy of this row with state [`RealTimeState::Canceled`] and the
    /// same times.
    pub fn cancel(&self) -> TripTimes {
        TripTimes {
            state: RealTimeState::Canceled,
            ..self.clone()
        }
    }

    /// Starts a realtime row from this one.
    pub fn to_builder(&self) -> TripTimesBuilder {
        TripTimesBuilder {
            times: self.clone(),
        }
    }

    fn validate(&self) -> Result<(), TripTimesValidationError> {
        let mut previous_departure = None;
        for (i, (&arr, &dep)) in self.arrivals.iter().zip(&self.departures).enumerate() {
            if dep < arr {
                return Err(TripTimesValidationError {
                    stop_index: i,
                    kind: ValidationErrorKind::NegativeDwellTime,
                });
            }
            if previous_departure.is_some_and(|prev| arr < prev) {
                return Err(TripTimesValidationError {
                    stop_index: i,
                    kind: ValidationErrorKind::NegativeHopTime,
                });
            }
            previous_departure = Some(dep);
        }
        Ok(())
    }
}

impl fmt::Display for TripTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} [", self.trip.id, self.state)?;
        for i in 0..self.num_stops() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{}/{}",
                super::time::format_seconds(self.arrivals[i]),
                super::time::format_seconds(self.departures[i])
            )?;
        }
        f.write_str("]")
    }
}

/// Builder for realtime rows. `build` validates the result.
#[derive(Debug, Clone)]
pub struct TripTimesBuilder {
    times: TripTimes,
}

impl TripTimesBuilder {
    pub fn num_stops(&self) -> usize {
        self.times.num_stops()
    }

    pub fn set_arrival(&mut self, stop: usize, time: i32) {
        self.times.arrivals[stop] = time;
    }

    pub fn set_departure(&mut self, stop: usize, time: i32) {
        self.times.departures[stop] = time;
    }

    pub fn set_recorded(&mut self, stop: usize) {
        self.times.recorded[stop] = true;
    }

    pub fn set_cancelled(&mut self, stop: usize) {
        self.times.cancelled[stop] = true;
    }

    pub fn set_prediction_inaccurate(&mut self, stop: usize) {
        self.times.prediction_inaccurate[stop] = true;
    }

    pub fn set_state(&mut self, state: RealTimeState) {
        self.times.state = state;
    }

    pub fn build(self) -> Result<TripTimes, TripTimesValidationError> {
        self.times.validate()?;
        Ok(self.times)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{Agency, Route, TransitMode};
    use proptest::prelude::*;

    fn trip() -> Arc<Trip> {
        let agency = Arc::new(Agency::new(FeedScopedId::new("F", "A"), "A", chrono_tz::UTC));
        let route = Arc::new(Route::new(FeedScopedId::new("F", "R"), agency, TransitMode::Bus));
        Arc::new(Trip::new(
            FeedScopedId::new("F", "T"),
            route,
            FeedScopedId::new("F", "S"),
        ))
    }

    proptest! {
        /// Whatever goes into the builder, a row that comes out is ordered.
        #[test]
        fn built_rows_are_monotonic(
            edits in prop::collection::vec((0usize..4, -600i32..600, any::<bool>()), 0..12)
        ) {
            let base = TripTimes::scheduled(
                trip(),
                vec![1000, 1600, 2200, 2800],
                vec![1000, 1700, 2300, 2800],
            ).unwrap();

            let mut builder = base.to_builder();
            for (stop, shift, is_arrival) in edits {
                if is_arrival {
                    builder.set_arrival(stop, base.arrival(stop) + shift);
                } else {
                    builder.set_departure(stop, base.departure(stop) + shift);
                }
            }

            if let Ok(times) = builder.build() {
                for i in 0..times.num_stops() {
                    prop_assert!(times.departure(i) >= times.arrival(i));
                    if i > 0 {
                        prop_assert!(times.arrival(i) >= times.departure(i - 1));
                    }
                }
            }
        }
    }
}
