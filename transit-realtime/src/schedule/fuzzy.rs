//! Fuzzy trip matching for journeys without a usable trip reference.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{Trip, seconds_since_start_of_service};
use crate::siri::EstimatedVehicleJourney;

use super::EntityResolver;

/// Finds the single scheduled trip matching a journey's line, operator and
/// origin departure time, together with the service date it runs on.
///
/// A candidate must be on the route named by the journey's line
/// reference, depart its first stop exactly at the origin aimed departure
/// time, and, if the journey names an operator, be run by that operator.
/// The departure is measured from the start of `service_date` and from
/// the start of the day before, so a trip scheduled past midnight is found
/// on the date its service began. The candidate must run on the date its
/// departure was measured from. Returns `None` when there is no candidate
/// or more than one.
pub fn match_trip(
    resolver: &EntityResolver<'_>,
    journey: &EstimatedVehicleJourney,
    service_date: NaiveDate,
) -> Option<(Arc<Trip>, NaiveDate)> {
    let route = resolver.resolve_route(journey.line_ref.as_deref()?)?;
    let departure = journey.origin_aimed_departure_time?;
    let operator = journey
        .operator_ref
        .as_deref()
        .map(|r| resolver.id(r));
    let dates: Vec<(NaiveDate, i32)> = [Some(service_date), service_date.pred_opt()]
        .into_iter()
        .flatten()
        .map(|date| {
            let secs = seconds_since_start_of_service(&departure, date, resolver.time_zone());
            (date, secs)
        })
        .collect();

    let mut candidates: Vec<(Arc<Trip>, NaiveDate)> = Vec::new();
    for pattern in resolver.patterns_for_route(&route.id) {
        for times in pattern.scheduled_timetable.trip_times() {
            let trip = times.trip();
            let Some(&(date, _)) = dates.iter().find(|(date, secs)| {
                times.scheduled_first_departure() == *secs && resolver.runs_on(&trip.service_id, *date)
            }) else {
                continue;
            };
            let operator_matches = operator
                .as_ref()
                .is_none_or(|op| trip.operator().is_some_and(|o| &o.id == op));
            if !operator_matches {
                continue;
            }
            if !candidates.iter().any(|(c, d)| c.id == trip.id && *d == date) {
                candidates.push((trip.clone(), date));
            }
        }
    }

    match candidates.len() {
        1 => candidates.pop(),
        0 => {
            debug!(route = %route.id, %departure, "no fuzzy trip match");
            None
        }
        n => {
            debug!(route = %route.id, %departure, candidates = n, "ambiguous fuzzy trip match");
            None
        }
    }
}
