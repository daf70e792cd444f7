//! JSON schedule fixtures.
//!
//! A small JSON form of a static schedule, used for local runs and tests
//! in place of a full schedule import. Times are `HH:MM` or `HH:MM:SS`
//! since the start of service and may exceed `24:00`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{
    Agency, FeedScopedId, Operator, Route, Station, Stop, StopPattern, SubMode, TransitMode,
    Trip, TripOnServiceDate, TripPattern, TripTimes, TripTimesValidationError,
};

use super::{TransitIndex, TransitIndexBuilder};

/// Errors loading a schedule fixture.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse schedule: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown {kind} '{id}'")]
    UnknownReference { kind: &'static str, id: String },

    #[error("invalid time '{0}'")]
    InvalidTime(String),

    #[error("trip {trip} has {times} times for {stops} stops")]
    StopCountMismatch {
        trip: String,
        times: usize,
        stops: usize,
    },

    #[error("invalid times for trip {trip}: {source}")]
    InvalidTripTimes {
        trip: String,
        source: TripTimesValidationError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScheduleDto {
    feed_id: String,
    time_zone: Tz,
    #[serde(default)]
    agencies: Vec<NamedDto>,
    #[serde(default)]
    operators: Vec<NamedDto>,
    #[serde(default)]
    stations: Vec<NamedDto>,
    #[serde(default)]
    stops: Vec<StopDto>,
    #[serde(default)]
    routes: Vec<RouteDto>,
    #[serde(default)]
    services: Vec<ServiceDto>,
    #[serde(default)]
    patterns: Vec<PatternDto>,
    #[serde(default)]
    dated_trips: Vec<DatedTripDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NamedDto {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StopDto {
    id: String,
    name: String,
    parent_station: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RouteDto {
    id: String,
    agency: String,
    operator: Option<String>,
    short_name: Option<String>,
    mode: TransitMode,
    submode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceDto {
    id: String,
    dates: Vec<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PatternDto {
    id: String,
    route: String,
    stops: Vec<String>,
    trips: Vec<TripDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TripDto {
    id: String,
    service: String,
    headsign: Option<String>,
    /// `[arrival, departure]` per stop.
    times: Vec<[String; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DatedTripDto {
    id: String,
    trip: String,
    date: NaiveDate,
}

/// Reads and parses a schedule fixture file.
pub fn load_fixture(path: impl AsRef<Path>) -> Result<TransitIndex, FixtureError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_fixture(&json)
}

/// Parses a schedule fixture from JSON.
pub fn parse_fixture(json: &str) -> Result<TransitIndex, FixtureError> {
    let dto: ScheduleDto = serde_json::from_str(json)?;
    let feed = dto.feed_id.as_str();
    let id = |s: &str| FeedScopedId::new(feed, s);
    let mut builder = TransitIndex::builder(dto.time_zone);

    let mut agencies = HashMap::new();
    for a in &dto.agencies {
        let agency = Arc::new(Agency::new(id(&a.id), &a.name, dto.time_zone));
        agencies.insert(a.id.as_str(), agency.clone());
        builder.add_agency(agency);
    }

    let mut operators = HashMap::new();
    for o in &dto.operators {
        let operator = Arc::new(Operator::new(id(&o.id), &o.name));
        operators.insert(o.id.as_str(), operator.clone());
        builder.add_operator(operator);
    }

    for s in &dto.stations {
        builder.add_station(Arc::new(Station::new(id(&s.id), &s.name)));
    }

    let mut stops = HashMap::new();
    for s in &dto.stops {
        let mut stop = Stop::new(id(&s.id), &s.name);
        if let Some(parent) = &s.parent_station {
            stop = stop.with_parent_station(id(parent));
        }
        let stop = Arc::new(stop);
        stops.insert(s.id.as_str(), stop.clone());
        builder.add_stop(stop);
    }

    let mut routes = HashMap::new();
    for r in &dto.routes {
        let agency = lookup(&agencies, "agency", &r.agency)?;
        let mut route = Route::new(id(&r.id), agency, r.mode)
            .with_submode(SubMode::from(r.submode.as_deref()));
        if let Some(operator) = &r.operator {
            route = route.with_operator(lookup(&operators, "operator", operator)?);
        }
        if let Some(short_name) = &r.short_name {
            route = route.with_short_name(short_name);
        }
        let route = Arc::new(route);
        routes.insert(r.id.as_str(), route.clone());
        builder.add_route(route);
    }

    for s in &dto.services {
        builder.add_service_dates(id(&s.id), s.dates.iter().copied());
    }

    let mut trips = HashMap::new();
    for p in &dto.patterns {
        let pattern = build_pattern(p, &id, &routes, &stops)?;
        for t in &p.trips {
            if let Some(times) = pattern.scheduled_trip_times(&id(&t.id)) {
                trips.insert(t.id.as_str(), times.trip().clone());
            }
        }
        builder.add_trip_pattern(Arc::new(pattern));
    }

    for d in &dto.dated_trips {
        let trip = lookup(&trips, "trip", &d.trip)?;
        builder.add_trip_on_service_date(Arc::new(TripOnServiceDate::new(id(&d.id), trip, d.date)));
    }

    Ok(finish(builder))
}

fn finish(builder: TransitIndexBuilder) -> TransitIndex {
    let index = builder.build();
    debug!(
        stops = index.num_stops(),
        trips = index.num_trips(),
        "loaded schedule fixture"
    );
    index
}

fn build_pattern(
    p: &PatternDto,
    id: &impl Fn(&str) -> FeedScopedId,
    routes: &HashMap<&str, Arc<Route>>,
    stops: &HashMap<&str, Arc<Stop>>,
) -> Result<TripPattern, FixtureError> {
    let route = lookup(routes, "route", &p.route)?;
    let pattern_stops = p
        .stops
        .iter()
        .map(|s| lookup(stops, "stop", s))
        .collect::<Result<Vec<_>, _>>()?;
    let num_stops = pattern_stops.len();

    let mut trip_times = Vec::with_capacity(p.trips.len());
    for t in &p.trips {
        if t.times.len() != num_stops {
            return Err(FixtureError::StopCountMismatch {
                trip: t.id.clone(),
                times: t.times.len(),
                stops: num_stops,
            });
        }
        let trip = Arc::new(
            Trip::new(id(&t.id), route.clone(), id(&t.service)).with_headsign(t.headsign.clone()),
        );
        let mut arrivals = Vec::with_capacity(num_stops);
        let mut departures = Vec::with_capacity(num_stops);
        for [arrival, departure] in &t.times {
            arrivals.push(parse_time(arrival)?);
            departures.push(parse_time(departure)?);
        }
        let times = TripTimes::scheduled(trip, arrivals, departures).map_err(|source| {
            FixtureError::InvalidTripTimes {
                trip: t.id.clone(),
                source,
            }
        })?;
        trip_times.push(Arc::new(times));
    }

    Ok(TripPattern::new(
        id(&p.id),
        route,
        Arc::new(StopPattern::scheduled(pattern_stops)),
    )
    .with_scheduled_trip_times(trip_times))
}

fn lookup<T: Clone>(
    map: &HashMap<&str, T>,
    kind: &'static str,
    key: &str,
) -> Result<T, FixtureError> {
    map.get(key)
        .cloned()
        .ok_or_else(|| FixtureError::UnknownReference {
            kind,
            id: key.to_string(),
        })
}

/// Parses `HH:MM` or `HH:MM:SS` into seconds; hours may exceed 23.
fn parse_time(s: &str) -> Result<i32, FixtureError> {
    let invalid = || FixtureError::InvalidTime(s.to_string());
    let mut parts = s.split(':');
    let mut next = |max: i32| -> Result<Option<i32>, FixtureError> {
        match parts.next() {
            None => Ok(None),
            Some(p) => {
                let v: i32 = p.parse().map_err(|_| invalid())?;
                if v < 0 || v > max {
                    return Err(invalid());
                }
                Ok(Some(v))
            }
        }
    };

    let hours = next(47)?.ok_or_else(invalid)?;
    let minutes = next(59)?.ok_or_else(invalid)?;
    let seconds = next(59)?.unwrap_or(0);
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(hours * 3600 + minutes * 60 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "FeedId": "F",
        "TimeZone": "Europe/Oslo",
        "Agencies": [{ "Id": "AG", "Name": "Agency" }],
        "Stations": [{ "Id": "S", "Name": "Station" }],
        "Stops": [
            { "Id": "S_1", "Name": "S1", "ParentStation": "S" },
            { "Id": "X", "Name": "X" }
        ],
        "Routes": [{ "Id": "R", "Agency": "AG", "Mode": "BUS", "Submode": "localBus" }],
        "Services": [{ "Id": "WEEKDAY", "Dates": ["2023-02-17"] }],
        "Patterns": [{
            "Id": "P",
            "Route": "R",
            "Stops": ["S_1", "X"],
            "Trips": [{ "Id": "T", "Service": "WEEKDAY", "Times": [["08:00", "08:00"], ["08:10:30", "08:11"]] }]
        }],
        "DatedTrips": [{ "Id": "DT", "Trip": "T", "Date": "2023-02-17" }]
    }"#;

    #[test]
    fn parses_minimal_schedule() {
        let index = parse_fixture(MINIMAL).unwrap();
        let id = |s: &str| FeedScopedId::new("F", s);

        assert_eq!(index.time_zone(), chrono_tz::Europe::Oslo);
        assert_eq!(index.stop(&id("S_1")).unwrap().parent_station, Some(id("S")));
        assert_eq!(index.route(&id("R")).unwrap().submode, SubMode::of("localBus"));

        let pattern = index.pattern_for_trip(&id("T")).unwrap();
        assert_eq!(pattern.id, id("P"));
        let times = pattern.scheduled_trip_times(&id("T")).unwrap();
        assert_eq!(times.arrival(1), 8 * 3600 + 10 * 60 + 30);

        let date = NaiveDate::from_ymd_opt(2023, 2, 17).unwrap();
        assert!(index.runs_on(&id("WEEKDAY"), date));
        assert_eq!(index.trip_on_service_date(&id("DT")).unwrap().service_date, date);
        assert!(index.trip_on_service_date_for(&id("T"), date).is_some());
    }

    #[test]
    fn unknown_reference() {
        let json = MINIMAL.replace(r#""Route": "R""#, r#""Route": "NOPE""#);
        let err = parse_fixture(&json).unwrap_err();
        assert_eq!(err.to_string(), "unknown route 'NOPE'");
    }

    #[test]
    fn times_must_match_stops() {
        let json = MINIMAL.replace(r#", ["08:10:30", "08:11"]"#, "");
        let err = parse_fixture(&json).unwrap_err();
        assert!(matches!(err, FixtureError::StopCountMismatch { stops: 2, times: 1, .. }));
    }

    #[test]
    fn times_must_increase() {
        let json = MINIMAL.replace("08:10:30", "07:10:30");
        let err = parse_fixture(&json).unwrap_err();
        assert!(matches!(err, FixtureError::InvalidTripTimes { .. }));
    }

    #[test]
    fn time_parsing() {
        assert_eq!(parse_time("00:00").unwrap(), 0);
        assert_eq!(parse_time("10:19").unwrap(), 37140);
        assert_eq!(parse_time("24:30:15").unwrap(), 88215);
        assert!(parse_time("10").is_err());
        assert!(parse_time("10:60").is_err());
        assert!(parse_time("ab:00").is_err());
        assert!(parse_time("10:00:00:00").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        std::fs::write(&path, MINIMAL).unwrap();

        let index = load_fixture(&path).unwrap();
        assert_eq!(index.num_trips(), 1);

        let err = load_fixture(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, FixtureError::Io { .. }));
    }
}
