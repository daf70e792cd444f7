//! Derivation of modified stop patterns from realtime calls.
//!
//! Calls are matched to pattern positions in travel order. A call matches
//! a position when it names the same stop or another stop of the same
//! station (a platform change). Calls naming stops elsewhere, and calls
//! flagged as extra, are ignored: stops cannot be inserted into a pattern.

use std::sync::Arc;

use crate::domain::{PickDrop, Stop, StopPattern};
use crate::schedule::EntityResolver;
use crate::siri::{ArrivalBoardingActivity, Call, DepartureBoardingActivity};

/// A call matched to a pattern position.
#[derive(Debug, Clone)]
pub struct CallMatch {
    /// Index into the call list.
    pub call_index: usize,
    /// The stop the call resolved to.
    pub stop: Arc<Stop>,
}

/// Matches calls to the positions of `pattern`.
///
/// Walks the positions in order; for each one, takes the first unused call
/// whose stop is the position's stop or shares its parent station. Extra
/// calls never match. Each call is used at most once. Returns one entry
/// per position.
pub fn match_calls<C: Call>(
    pattern: &StopPattern,
    calls: &[C],
    resolver: &EntityResolver<'_>,
) -> Vec<Option<CallMatch>> {
    let resolved: Vec<Option<Arc<Stop>>> = calls
        .iter()
        .map(|c| {
            if c.is_extra_call() {
                return None;
            }
            c.stop_point_ref().and_then(|r| resolver.resolve_stop(r))
        })
        .collect();
    let mut used = vec![false; calls.len()];

    pattern
        .stops()
        .iter()
        .map(|stop| {
            let (call_index, call_stop) = resolved.iter().enumerate().find_map(|(j, s)| {
                let s = s.as_ref()?;
                let matches = !used[j] && (s.id == stop.id || s.is_part_of_same_station_as(stop));
                matches.then_some((j, s))
            })?;
            used[call_index] = true;
            Some(CallMatch {
                call_index,
                stop: call_stop.clone(),
            })
        })
        .collect()
}

/// Boarding permission implied by a call, starting from `current`.
pub fn pickup_for<C: Call>(call: &C, current: PickDrop) -> PickDrop {
    if call.is_cancellation() {
        return PickDrop::Cancelled;
    }
    match call.departure_boarding_activity() {
        Some(DepartureBoardingActivity::NoBoarding | DepartureBoardingActivity::PassThru) => {
            PickDrop::None
        }
        Some(DepartureBoardingActivity::Boarding) | None => current,
    }
}

/// Alighting permission implied by a call, starting from `current`.
pub fn dropoff_for<C: Call>(call: &C, current: PickDrop) -> PickDrop {
    if call.is_cancellation() {
        return PickDrop::Cancelled;
    }
    match call.arrival_boarding_activity() {
        Some(ArrivalBoardingActivity::NoAlighting | ArrivalBoardingActivity::PassThru) => {
            PickDrop::None
        }
        Some(ArrivalBoardingActivity::Alighting) | None => current,
    }
}

/// Applies calls to `original` and returns the new pattern if anything
/// changed.
///
/// `None` means the calls describe exactly `original`; callers keep using
/// their existing pattern.
pub fn derive_stop_pattern<C: Call>(
    original: &StopPattern,
    calls: &[C],
    resolver: &EntityResolver<'_>,
) -> Option<StopPattern> {
    if calls.is_empty() {
        return None;
    }

    let matches = match_calls(original, calls, resolver);
    if matches.iter().all(Option::is_none) {
        return None;
    }

    let mut builder = original.to_builder();
    for (i, m) in matches.iter().enumerate() {
        let Some(m) = m else {
            continue;
        };
        let call = &calls[m.call_index];
        if m.stop.id != original.stop(i).id {
            builder.set_stop(i, m.stop.clone());
        }
        builder.set_pickup(i, pickup_for(call, original.pickup(i)));
        builder.set_dropoff(i, dropoff_for(call, original.dropoff(i)));
    }

    let derived = builder.build();
    (derived != *original).then_some(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::siri::{CallWrapper, EstimatedCall, EstimatedVehicleJourney};
    use crate::snapshot::TimetableSnapshot;
    use crate::test_fixtures::{self, estimated, id};

    fn derive(calls: Vec<EstimatedCall>) -> Option<StopPattern> {
        let model = test_fixtures::model();
        let snapshot = TimetableSnapshot::default();
        let resolver = EntityResolver::new(&model.index, &snapshot, test_fixtures::FEED);
        let journey = EstimatedVehicleJourney {
            estimated_calls: calls,
            ..Default::default()
        };
        derive_stop_pattern(&model.pattern.stop_pattern, &CallWrapper::of(&journey), &resolver)
    }

    fn all_stops() -> Vec<EstimatedCall> {
        vec![
            estimated("A_1", None, Some(("10:00", "10:00"))),
            estimated("B_1", Some(("10:10", "10:10")), Some(("10:12", "10:12"))),
            estimated("C_1", Some(("10:20", "10:20")), None),
        ]
    }

    #[test]
    fn same_stops_unchanged() {
        assert!(derive(all_stops()).is_none());
    }

    #[test]
    fn no_calls_unchanged() {
        assert!(derive(Vec::new()).is_none());
    }

    #[test]
    fn unknown_stops_unchanged() {
        assert!(derive(vec![estimated("NOWHERE", None, None)]).is_none());
    }

    #[test]
    fn partial_calls_unchanged() {
        let calls = all_stops().into_iter().skip(1).collect();
        assert!(derive(calls).is_none());
    }

    #[test]
    fn platform_change_adopts_new_quay() {
        let mut calls = all_stops();
        calls[1].stop_point_ref = Some("B_2".into());

        let pattern = derive(calls).unwrap();
        let ids: Vec<_> = pattern.stop_ids().map(|s| s.id()).collect();
        assert_eq!(ids, ["A_1", "B_2", "C_1"]);
        assert_eq!(pattern.pickup(1), PickDrop::Scheduled);
    }

    #[test]
    fn different_station_is_ignored() {
        let mut calls = all_stops();
        calls[1].stop_point_ref = Some("D".into());
        assert!(derive(calls).is_none());
    }

    #[test]
    fn extra_call_is_not_adopted() {
        let mut extra = estimated("B_2", Some(("10:05", "10:05")), Some(("10:06", "10:06")));
        extra.extra_call = Some(true);

        // Ahead of the scheduled quay of the same station
        let mut calls = all_stops();
        calls.insert(1, extra.clone());
        assert!(derive(calls).is_none());

        // In place of it
        let mut calls = all_stops();
        calls[1] = extra;
        assert!(derive(calls).is_none());
    }

    #[test]
    fn cancelled_call_cancels_stop() {
        let mut calls = all_stops();
        calls[1].cancellation = Some(true);
        // Cancellation wins over boarding activity
        calls[1].departure_boarding_activity = Some(DepartureBoardingActivity::Boarding);

        let pattern = derive(calls).unwrap();
        assert_eq!(pattern.pickup(1), PickDrop::Cancelled);
        assert_eq!(pattern.dropoff(1), PickDrop::Cancelled);
        assert_eq!(pattern.pickup(0), PickDrop::Scheduled);
    }

    #[test]
    fn boarding_activity_maps_to_permissions() {
        let mut calls = all_stops();
        calls[1].departure_boarding_activity = Some(DepartureBoardingActivity::NoBoarding);
        calls[2].arrival_boarding_activity = Some(ArrivalBoardingActivity::PassThru);

        let pattern = derive(calls).unwrap();
        assert_eq!(pattern.pickup(1), PickDrop::None);
        assert_eq!(pattern.dropoff(1), PickDrop::Scheduled);
        assert_eq!(pattern.dropoff(2), PickDrop::None);
    }

    #[test]
    fn explicit_boarding_is_unchanged() {
        let mut calls = all_stops();
        calls[0].departure_boarding_activity = Some(DepartureBoardingActivity::Boarding);
        calls[2].arrival_boarding_activity = Some(ArrivalBoardingActivity::Alighting);
        assert!(derive(calls).is_none());
    }

    #[test]
    fn each_call_used_once() {
        let model = test_fixtures::model();
        let snapshot = TimetableSnapshot::default();
        let resolver = EntityResolver::new(&model.index, &snapshot, test_fixtures::FEED);
        let journey = EstimatedVehicleJourney {
            estimated_calls: vec![estimated("A_2", None, None), estimated("C_1", None, None)],
            ..Default::default()
        };

        let matches = match_calls(&model.pattern.stop_pattern, &CallWrapper::of(&journey), &resolver);
        assert_eq!(matches[0].as_ref().unwrap().stop.id, id("A_2"));
        assert!(matches[1].is_none());
        assert_eq!(matches[2].as_ref().unwrap().call_index, 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::siri::{CallWrapper, EstimatedVehicleJourney};
    use crate::snapshot::TimetableSnapshot;
    use crate::test_fixtures::{self, estimated};
    use proptest::prelude::*;

    proptest! {
        /// Any subset of the pattern's own stops, in order, with default
        /// boarding activity never changes the pattern.
        #[test]
        fn own_stops_are_a_no_op(keep in prop::collection::vec(any::<bool>(), 3)) {
            let model = test_fixtures::model();
            let snapshot = TimetableSnapshot::default();
            let resolver = EntityResolver::new(&model.index, &snapshot, test_fixtures::FEED);

            let calls = ["A_1", "B_1", "C_1"]
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(s, _)| estimated(s, None, None))
                .collect();
            let journey = EstimatedVehicleJourney {
                estimated_calls: calls,
                ..Default::default()
            };

            let derived = derive_stop_pattern(
                &model.pattern.stop_pattern,
                &CallWrapper::of(&journey),
                &resolver,
            );
            prop_assert!(derived.is_none());
        }
    }
}
