//! A uniform view over recorded and estimated calls.

use chrono::{DateTime, FixedOffset};

use super::types::{
    ArrivalBoardingActivity, DepartureBoardingActivity, EstimatedCall, EstimatedVehicleJourney,
    RecordedCall,
};

/// Per-stop fields shared by both call shapes.
///
/// Fields that only exist on one shape (actual times on recorded calls,
/// boarding activity on estimated calls) return `None` on the other.
pub trait Call {
    fn stop_point_ref(&self) -> Option<&str>;
    fn is_cancellation(&self) -> bool;
    fn is_extra_call(&self) -> bool;
    fn is_prediction_inaccurate(&self) -> bool;
    fn aimed_arrival_time(&self) -> Option<DateTime<FixedOffset>>;
    fn expected_arrival_time(&self) -> Option<DateTime<FixedOffset>>;
    fn actual_arrival_time(&self) -> Option<DateTime<FixedOffset>>;
    fn aimed_departure_time(&self) -> Option<DateTime<FixedOffset>>;
    fn expected_departure_time(&self) -> Option<DateTime<FixedOffset>>;
    fn actual_departure_time(&self) -> Option<DateTime<FixedOffset>>;
    fn arrival_boarding_activity(&self) -> Option<ArrivalBoardingActivity>;
    fn departure_boarding_activity(&self) -> Option<DepartureBoardingActivity>;

    /// Actual arrival, else expected.
    fn realtime_arrival_time(&self) -> Option<DateTime<FixedOffset>> {
        self.actual_arrival_time().or(self.expected_arrival_time())
    }

    /// Actual departure, else expected.
    fn realtime_departure_time(&self) -> Option<DateTime<FixedOffset>> {
        self.actual_departure_time().or(self.expected_departure_time())
    }

    fn has_actual_time(&self) -> bool {
        self.actual_arrival_time().is_some() || self.actual_departure_time().is_some()
    }
}

impl Call for RecordedCall {
    fn stop_point_ref(&self) -> Option<&str> {
        self.stop_point_ref.as_deref()
    }

    fn is_cancellation(&self) -> bool {
        self.cancellation == Some(true)
    }

    fn is_extra_call(&self) -> bool {
        self.extra_call == Some(true)
    }

    fn is_prediction_inaccurate(&self) -> bool {
        self.prediction_inaccurate == Some(true)
    }

    fn aimed_arrival_time(&self) -> Option<DateTime<FixedOffset>> {
        self.aimed_arrival_time
    }

    fn expected_arrival_time(&self) -> Option<DateTime<FixedOffset>> {
        self.expected_arrival_time
    }

    fn actual_arrival_time(&self) -> Option<DateTime<FixedOffset>> {
        self.actual_arrival_time
    }

    fn aimed_departure_time(&self) -> Option<DateTime<FixedOffset>> {
        self.aimed_departure_time
    }

    fn expected_departure_time(&self) -> Option<DateTime<FixedOffset>> {
        self.expected_departure_time
    }

    fn actual_departure_time(&self) -> Option<DateTime<FixedOffset>> {
        self.actual_departure_time
    }

    fn arrival_boarding_activity(&self) -> Option<ArrivalBoardingActivity> {
        None
    }

    fn departure_boarding_activity(&self) -> Option<DepartureBoardingActivity> {
        None
    }
}

impl Call for EstimatedCall {
    fn stop_point_ref(&self) -> Option<&str> {
        self.stop_point_ref.as_deref()
    }

    fn is_cancellation(&self) -> bool {
        self.cancellation == Some(true)
    }

    fn is_extra_call(&self) -> bool {
        self.extra_call == Some(true)
    }

    fn is_prediction_inaccurate(&self) -> bool {
        self.prediction_inaccurate == Some(true)
    }

    fn aimed_arrival_time(&self) -> Option<DateTime<FixedOffset>> {
        self.aimed_arrival_time
    }

    fn expected_arrival_time(&self) -> Option<DateTime<FixedOffset>> {
        self.expected_arrival_time
    }

    fn actual_arrival_time(&self) -> Option<DateTime<FixedOffset>> {
        None
    }

    fn aimed_departure_time(&self) -> Option<DateTime<FixedOffset>> {
        self.aimed_departure_time
    }

    fn expected_departure_time(&self) -> Option<DateTime<FixedOffset>> {
        self.expected_departure_time
    }

    fn actual_departure_time(&self) -> Option<DateTime<FixedOffset>> {
        None
    }

    fn arrival_boarding_activity(&self) -> Option<ArrivalBoardingActivity> {
        self.arrival_boarding_activity
    }

    fn departure_boarding_activity(&self) -> Option<DepartureBoardingActivity> {
        self.departure_boarding_activity
    }
}

/// Either kind of call, borrowed from a journey.
#[derive(Debug, Clone, Copy)]
pub enum CallWrapper<'a> {
    Recorded(&'a RecordedCall),
    Estimated(&'a EstimatedCall),
}

impl<'a> CallWrapper<'a> {
    /// All calls of a journey in travel order: recorded calls first, then
    /// estimated calls.
    pub fn of(journey: &'a EstimatedVehicleJourney) -> Vec<CallWrapper<'a>> {
        journey
            .recorded_calls
            .iter()
            .map(CallWrapper::Recorded)
            .chain(journey.estimated_calls.iter().map(CallWrapper::Estimated))
            .collect()
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, CallWrapper::Recorded(_))
    }

    fn inner(&self) -> &'a dyn Call {
        match *self {
            CallWrapper::Recorded(call) => call,
            CallWrapper::Estimated(call) => call,
        }
    }
}

impl Call for CallWrapper<'_> {
    fn stop_point_ref(&self) -> Option<&str> {
        self.inner().stop_point_ref()
    }

    fn is_cancellation(&self) -> bool {
        self.inner().is_cancellation()
    }

    fn is_extra_call(&self) -> bool {
        self.inner().is_extra_call()
    }

    fn is_prediction_inaccurate(&self) -> bool {
        self.inner().is_prediction_inaccurate()
    }

    fn aimed_arrival_time(&self) -> Option<DateTime<FixedOffset>> {
        self.inner().aimed_arrival_time()
    }

    fn expected_arrival_time(&self) -> Option<DateTime<FixedOffset>> {
        self.inner().expected_arrival_time()
    }

    fn actual_arrival_time(&self) -> Option<DateTime<FixedOffset>> {
        self.inner().actual_arrival_time()
    }

    fn aimed_departure_time(&self) -> Option<DateTime<FixedOffset>> {
        self.inner().aimed_departure_time()
    }

    fn expected_departure_time(&self) -> Option<DateTime<FixedOffset>> {
        self.inner().expected_departure_time()
    }

    fn actual_departure_time(&self) -> Option<DateTime<FixedOffset>> {
        self.inner().actual_departure_time()
    }

    fn arrival_boarding_activity(&self) -> Option<ArrivalBoardingActivity> {
        self.inner().arrival_boarding_activity()
    }

    fn departure_boarding_activity(&self) -> Option<DepartureBoardingActivity> {
        self.inner().departure_boarding_activity()
    }
}
