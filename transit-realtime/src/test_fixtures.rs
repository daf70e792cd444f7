//! A small transit model shared by unit tests.
//!
//! Stations A, B and C have two, two and one quays; stop D has no station.
//! Route RAIL_1 runs pattern P1 (A_1, B_1, C_1) with TRIP_1 at 10:00,
//! TRIP_2 at 11:00 and TRIP_NIGHT at 24:30, and pattern P2 (A_1, C_1) with
//! TRIP_3 at 11:00. All run on 2023-02-17 and 2023-02-18 in Europe/Oslo.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::domain::{FeedScopedId, Route, Stop, TripPattern, TripTimes};
use crate::schedule::{TransitIndex, parse_fixture};
use crate::siri::{
    EstimatedCall, EstimatedVehicleJourney, FramedVehicleJourneyRef, RecordedCall,
};

pub const FEED: &str = "F";

const SCHEDULE: &str = r#"{
    "FeedId": "F",
    "TimeZone": "Europe/Oslo",
    "Agencies": [{ "Id": "AGENCY", "Name": "Agency" }],
    "Operators": [
        { "Id": "OPERATOR", "Name": "Rail operator" },
        { "Id": "BUS_OPERATOR", "Name": "Bus operator" }
    ],
    "Stations": [
        { "Id": "A", "Name": "A" },
        { "Id": "B", "Name": "B" },
        { "Id": "C", "Name": "C" }
    ],
    "Stops": [
        { "Id": "A_1", "Name": "A track 1", "ParentStation": "A" },
        { "Id": "A_2", "Name": "A track 2", "ParentStation": "A" },
        { "Id": "B_1", "Name": "B track 1", "ParentStation": "B" },
        { "Id": "B_2", "Name": "B track 2", "ParentStation": "B" },
        { "Id": "C_1", "Name": "C track 1", "ParentStation": "C" },
        { "Id": "D", "Name": "D" }
    ],
    "Routes": [
        { "Id": "RAIL_1", "Agency": "AGENCY", "Operator": "OPERATOR", "ShortName": "R1", "Mode": "RAIL" },
        { "Id": "BUS_1", "Agency": "AGENCY", "Operator": "BUS_OPERATOR", "Mode": "BUS", "Submode": "localBus" }
    ],
    "Services": [{ "Id": "SERVICE_1", "Dates": ["2023-02-17", "2023-02-18"] }],
    "Patterns": [
        {
            "Id": "RAIL_1:P1",
            "Route": "RAIL_1",
            "Stops": ["A_1", "B_1", "C_1"],
            "Trips": [
                { "Id": "TRIP_1", "Service": "SERVICE_1", "Times": [["10:00", "10:00"], ["10:10", "10:12"], ["10:20", "10:20"]] },
                { "Id": "TRIP_2", "Service": "SERVICE_1", "Times": [["11:00", "11:00"], ["11:10", "11:12"], ["11:20", "11:20"]] },
                { "Id": "TRIP_NIGHT", "Service": "SERVICE_1", "Times": [["24:30", "24:30"], ["24:40", "24:42"], ["24:50", "24:50"]] }
            ]
        },
        {
            "Id": "RAIL_1:P2",
            "Route": "RAIL_1",
            "Stops": ["A_1", "C_1"],
            "Trips": [
                { "Id": "TRIP_3", "Service": "SERVICE_1", "Times": [["11:00", "11:00"], ["11:15", "11:15"]] }
            ]
        },
        {
            "Id": "BUS_1:P1",
            "Route": "BUS_1",
            "Stops": ["B_2", "D"],
            "Trips": [
                { "Id": "BUS_TRIP_1", "Service": "SERVICE_1", "Times": [["09:00", "09:00"], ["09:30", "09:30"]] }
            ]
        }
    ],
    "DatedTrips": [{ "Id": "TOSD_1", "Trip": "TRIP_1", "Date": "2023-02-17" }]
}"#;

pub struct TestModel {
    pub index: TransitIndex,
    pub route: Arc<Route>,
    pub bus_route: Arc<Route>,
    /// Pattern P1: A_1, B_1, C_1.
    pub pattern: Arc<TripPattern>,
}

impl TestModel {
    pub fn stop(&self, stop: &str) -> Arc<Stop> {
        self.index.stop(&id(stop)).unwrap().clone()
    }

    pub fn scheduled_times(&self, trip: &str) -> TripTimes {
        let pattern = self.index.pattern_for_trip(&id(trip)).unwrap();
        pattern.scheduled_trip_times(&id(trip)).unwrap().as_ref().clone()
    }

    pub fn trip_1_times(&self) -> TripTimes {
        self.scheduled_times("TRIP_1")
    }
}

pub fn model() -> TestModel {
    let index = parse_fixture(SCHEDULE).unwrap();
    TestModel {
        route: index.route(&id("RAIL_1")).unwrap().clone(),
        bus_route: index.route(&id("BUS_1")).unwrap().clone(),
        pattern: index.trip_pattern(&id("RAIL_1:P1")).unwrap().clone(),
        index,
    }
}

pub fn id(s: &str) -> FeedScopedId {
    FeedScopedId::new(FEED, s)
}

pub fn service_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 2, 17).unwrap()
}

pub fn secs(hours: i32, minutes: i32, seconds: i32) -> i32 {
    hours * 3600 + minutes * 60 + seconds
}

/// `HH:MM` or `HH:MM:SS` on the service date, in winter time.
pub fn time(hhmm: &str) -> DateTime<FixedOffset> {
    let hhmmss = if hhmm.len() == 5 {
        format!("{hhmm}:00")
    } else {
        hhmm.to_string()
    };
    DateTime::parse_from_rfc3339(&format!("2023-02-17T{hhmmss}+01:00")).unwrap()
}

/// A journey referencing `trip` on the service date, on line RAIL_1.
pub fn journey_for(trip: &str) -> EstimatedVehicleJourney {
    EstimatedVehicleJourney {
        line_ref: Some("RAIL_1".into()),
        framed_vehicle_journey_ref: Some(FramedVehicleJourneyRef {
            data_frame_ref: "2023-02-17".into(),
            dated_vehicle_journey_ref: trip.into(),
        }),
        monitored: Some(true),
        data_source: Some("TST".into()),
        ..Default::default()
    }
}

/// An estimated call; arrival and departure are `(aimed, expected)`.
pub fn estimated(
    stop: &str,
    arrival: Option<(&str, &str)>,
    departure: Option<(&str, &str)>,
) -> EstimatedCall {
    EstimatedCall {
        stop_point_ref: Some(stop.into()),
        aimed_arrival_time: arrival.map(|(aimed, _)| time(aimed)),
        expected_arrival_time: arrival.map(|(_, expected)| time(expected)),
        aimed_departure_time: departure.map(|(aimed, _)| time(aimed)),
        expected_departure_time: departure.map(|(_, expected)| time(expected)),
        ..Default::default()
    }
}

/// A recorded call; arrival and departure are `(aimed, actual)`.
pub fn recorded(
    stop: &str,
    arrival: Option<(&str, &str)>,
    departure: Option<(&str, &str)>,
) -> RecordedCall {
    RecordedCall {
        stop_point_ref: Some(stop.into()),
        aimed_arrival_time: arrival.map(|(aimed, _)| time(aimed)),
        actual_arrival_time: arrival.map(|(_, actual)| time(actual)),
        aimed_departure_time: departure.map(|(aimed, _)| time(aimed)),
        actual_departure_time: departure.map(|(_, actual)| time(actual)),
        ..Default::default()
    }
}
