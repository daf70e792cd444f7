//! Realtime trip times from calls.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;

use crate::domain::{
    PickDrop, RealTimeState, Stop, StopPattern, Trip, TripTimes, TripTimesBuilder, UpdateError,
    UpdateErrorType, seconds_since_start_of_service,
};
use crate::schedule::EntityResolver;
use crate::siri::Call;

use super::stop_pattern::{dropoff_for, match_calls, pickup_for};

/// Converts message timestamps to seconds since start of service.
#[derive(Debug, Clone, Copy)]
struct ServiceClock {
    time_zone: Tz,
    service_date: NaiveDate,
}

impl ServiceClock {
    fn seconds(&self, time: Option<DateTime<FixedOffset>>) -> Option<i32> {
        time.map(|t| seconds_since_start_of_service(&t, self.service_date, self.time_zone))
    }

    /// Writes the realtime times and flags of `call` to stop `i`.
    fn apply<C: Call>(
        &self,
        builder: &mut TripTimesBuilder,
        scheduled: &TripTimes,
        i: usize,
        last: usize,
        call: &C,
        prediction_inaccurate: bool,
    ) {
        let rt_arrival = self.seconds(call.realtime_arrival_time());
        let rt_departure = self.seconds(call.realtime_departure_time());

        let arrival = rt_arrival
            .or(if i == 0 { rt_departure } else { None })
            .unwrap_or(scheduled.scheduled_arrival(i));
        let departure = rt_departure
            .or(if i == last { rt_arrival } else { None })
            .unwrap_or(scheduled.scheduled_departure(i));
        builder.set_arrival(i, arrival);
        builder.set_departure(i, departure);

        if call.has_actual_time() {
            builder.set_recorded(i);
        }
        if call.is_cancellation() {
            builder.set_cancelled(i);
        }
        if prediction_inaccurate || call.is_prediction_inaccurate() {
            builder.set_prediction_inaccurate(i);
        }
    }
}

/// Computes the realtime times of a scheduled trip.
///
/// Stops matched to a call get the call's actual time, else its expected
/// time; the first stop's arrival falls back to its realtime departure and
/// the last stop's departure to its realtime arrival. Anything still
/// missing, and every unmatched stop, keeps the scheduled time. The result
/// is UPDATED, or MODIFIED if `modified` is set, and is rejected as a
/// whole if it is not ordered.
pub fn build_for_update<C: Call>(
    stop_pattern: &StopPattern,
    scheduled: &TripTimes,
    calls: &[C],
    resolver: &EntityResolver<'_>,
    service_date: NaiveDate,
    modified: bool,
    prediction_inaccurate: bool,
) -> Result<TripTimes, UpdateError> {
    let clock = ServiceClock {
        time_zone: resolver.time_zone(),
        service_date,
    };
    let num_stops = scheduled.num_stops();
    let last = num_stops.saturating_sub(1);
    let mut builder = scheduled.to_builder();

    for (i, m) in match_calls(stop_pattern, calls, resolver).into_iter().enumerate() {
        if i >= num_stops {
            break;
        }
        let Some(m) = m else {
            continue;
        };
        clock.apply(&mut builder, scheduled, i, last, &calls[m.call_index], prediction_inaccurate);
    }

    builder.set_state(if modified {
        RealTimeState::Modified
    } else {
        RealTimeState::Updated
    });
    builder
        .build()
        .map_err(|err| UpdateError::from_validation(scheduled.trip_id().clone(), err))
}

/// The rows and pattern synthesized for an added trip.
#[derive(Debug, Clone)]
pub struct AddedTripTimes {
    pub stop_pattern: StopPattern,
    /// Aimed times, state SCHEDULED.
    pub scheduled: TripTimes,
    /// Realtime times, state ADDED.
    pub realtime: TripTimes,
}

/// Builds the stop pattern and both timetable rows of an added trip.
///
/// Needs at least two calls, all naming known stops. Aimed times become
/// the scheduled row (the first stop arrives when it departs and the last
/// departs when it arrives); realtime times follow the same rules as
/// [`build_for_update`].
pub fn build_for_added_trip<C: Call>(
    trip: Arc<Trip>,
    service_date: NaiveDate,
    calls: &[C],
    resolver: &EntityResolver<'_>,
    prediction_inaccurate: bool,
) -> Result<AddedTripTimes, UpdateError> {
    let trip_error = |error_type| UpdateError::for_trip(error_type, trip.id.clone());

    if calls.len() < 2 {
        return Err(trip_error(UpdateErrorType::TooFewStops));
    }

    let mut stops: Vec<Arc<Stop>> = Vec::with_capacity(calls.len());
    for (i, call) in calls.iter().enumerate() {
        let stop = call
            .stop_point_ref()
            .and_then(|r| resolver.resolve_stop(r))
            .ok_or_else(|| UpdateError {
                stop_index: Some(i),
                ..trip_error(UpdateErrorType::NoValidStops)
            })?;
        stops.push(stop);
    }

    let clock = ServiceClock {
        time_zone: resolver.time_zone(),
        service_date,
    };
    let last = calls.len() - 1;

    let mut aimed_arrivals = Vec::with_capacity(calls.len());
    let mut aimed_departures = Vec::with_capacity(calls.len());
    for (i, call) in calls.iter().enumerate() {
        let aimed_arrival = clock.seconds(call.aimed_arrival_time());
        let aimed_departure = clock.seconds(call.aimed_departure_time());
        let (arrival, departure) = match (aimed_arrival.or(aimed_departure), aimed_departure.or(aimed_arrival)) {
            (Some(a), Some(d)) => (a, d),
            _ => {
                return Err(UpdateError {
                    stop_index: Some(i),
                    ..trip_error(UpdateErrorType::NoValidStops)
                });
            }
        };
        aimed_arrivals.push(if i == 0 { departure } else { arrival });
        aimed_departures.push(if i == last { arrival } else { departure });
    }

    let scheduled = TripTimes::scheduled(trip.clone(), aimed_arrivals, aimed_departures)
        .map_err(|err| UpdateError::from_validation(trip.id.clone(), err))?;

    let mut builder = scheduled.to_builder();
    for (i, call) in calls.iter().enumerate() {
        clock.apply(&mut builder, &scheduled, i, last, call, prediction_inaccurate);
    }
    builder.set_state(RealTimeState::Added);
    let realtime = builder
        .build()
        .map_err(|err| UpdateError::from_validation(trip.id.clone(), err))?;

    let stop_pattern = StopPattern::new(stops.into_iter().zip(calls).map(|(stop, call)| {
        (
            stop,
            pickup_for(call, PickDrop::Scheduled),
            dropoff_for(call, PickDrop::Scheduled),
        )
    }));

    Ok(AddedTripTimes {
        stop_pattern,
        scheduled,
        realtime,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::siri::{CallWrapper, EstimatedCall, EstimatedVehicleJourney};
    use crate::snapshot::TimetableSnapshot;
    use crate::test_fixtures::{self, time};
    use proptest::prelude::*;

    fn hhmmss(seconds: i32) -> String {
        format!("{:02}:{:02}:{:02}", seconds / 3600, (seconds / 60) % 60, seconds % 60)
    }

    proptest! {
        /// An update either fails or yields an ordered row.
        #[test]
        fn updates_are_monotonic(
            shifts in prop::collection::vec((-900i32..900, -900i32..900), 3)
        ) {
            let model = test_fixtures::model();
            let snapshot = TimetableSnapshot::default();
            let resolver = EntityResolver::new(&model.index, &snapshot, test_fixtures::FEED);
            let scheduled = model.trip_1_times();

            let calls: Vec<EstimatedCall> = ["A_1", "B_1", "C_1"]
                .iter()
                .enumerate()
                .map(|(i, stop)| EstimatedCall {
                    stop_point_ref: Some(stop.to_string()),
                    expected_arrival_time: Some(time(&hhmmss(scheduled.scheduled_arrival(i) + shifts[i].0))),
                    expected_departure_time: Some(time(&hhmmss(scheduled.scheduled_departure(i) + shifts[i].1))),
                    ..Default::default()
                })
                .collect();
            let journey = EstimatedVehicleJourney {
                estimated_calls: calls,
                ..Default::default()
            };

            let result = build_for_update(
                &model.pattern.stop_pattern,
                &scheduled,
                &CallWrapper::of(&journey),
                &resolver,
                test_fixtures::service_date(),
                false,
                false,
            );
            match result {
                Ok(times) => {
                    for i in 0..times.num_stops() {
                        prop_assert!(times.departure(i) >= times.arrival(i));
                        if i > 0 {
                            prop_assert!(times.arrival(i) >= times.departure(i - 1));
                        }
                    }
                }
                Err(err) => prop_assert!(matches!(
                    err.error_type,
                    UpdateErrorType::NegativeDwellTime | UpdateErrorType::NegativeHopTime
                )),
            }
        }
    }
}
