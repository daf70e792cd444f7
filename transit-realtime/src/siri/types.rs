//! SIRI Estimated Timetable DTOs.
//!
//! These types map the JSON form of SIRI-ET deliveries. SIRI omits
//! elements rather than sending nulls, so nearly everything is optional
//! and lists default to empty.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::domain::TransitMode;

/// One delivery: a batch of journeys from a single producer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EstimatedTimetableDelivery {
    /// When the delivery was produced.
    pub response_timestamp: Option<DateTime<FixedOffset>>,

    /// Whether the delivery replaces all earlier data of the feed.
    #[serde(default)]
    pub full_dataset: bool,

    #[serde(default)]
    pub estimated_vehicle_journeys: Vec<EstimatedVehicleJourney>,
}

/// Realtime state of one vehicle journey.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EstimatedVehicleJourney {
    pub recorded_at_time: Option<DateTime<FixedOffset>>,

    /// Line (route) reference.
    pub line_ref: Option<String>,

    /// For replacement journeys: the line being replaced.
    pub external_line_ref: Option<String>,

    pub direction_ref: Option<String>,

    /// Dated reference to a scheduled journey.
    pub framed_vehicle_journey_ref: Option<FramedVehicleJourneyRef>,

    /// Reference to a dated vehicle journey (trip on service date).
    pub dated_vehicle_journey_ref: Option<String>,

    /// Id of a journey not in the schedule (extra journeys).
    pub estimated_vehicle_journey_code: Option<String>,

    /// Dated journeys this journey replaces.
    #[serde(default)]
    pub additional_vehicle_journey_refs: Vec<FramedVehicleJourneyRef>,

    pub operator_ref: Option<String>,

    /// Codespace of the producer.
    pub data_source: Option<String>,

    #[serde(default)]
    pub vehicle_modes: Vec<VehicleMode>,

    #[serde(default)]
    pub published_line_names: Vec<String>,

    #[serde(default)]
    pub destination_names: Vec<String>,

    /// Scheduled departure from the origin, used for fuzzy matching.
    pub origin_aimed_departure_time: Option<DateTime<FixedOffset>>,

    /// `false` means the journey is not tracked in realtime.
    pub monitored: Option<bool>,

    /// The whole journey is cancelled.
    pub cancellation: Option<bool>,

    /// The journey is not in the static schedule.
    pub extra_journey: Option<bool>,

    pub prediction_inaccurate: Option<bool>,

    #[serde(default)]
    pub recorded_calls: Vec<RecordedCall>,

    #[serde(default)]
    pub estimated_calls: Vec<EstimatedCall>,
}

impl EstimatedVehicleJourney {
    pub fn is_cancelled(&self) -> bool {
        self.cancellation == Some(true)
    }

    pub fn is_extra_journey(&self) -> bool {
        self.extra_journey == Some(true)
    }

    /// Explicitly flagged as not monitored.
    pub fn is_not_monitored(&self) -> bool {
        self.monitored == Some(false)
    }

    /// The id reported in errors and logs for this journey.
    pub fn reference(&self) -> Option<&str> {
        self.framed_vehicle_journey_ref
            .as_ref()
            .map(|r| r.dated_vehicle_journey_ref.as_str())
            .or(self.dated_vehicle_journey_ref.as_deref())
            .or(self.estimated_vehicle_journey_code.as_deref())
    }
}

/// A trip id together with the date it runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FramedVehicleJourneyRef {
    /// Service date, `YYYY-MM-DD`.
    pub data_frame_ref: String,
    pub dated_vehicle_journey_ref: String,
}

/// SIRI vehicle mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleMode {
    Air,
    Bus,
    Coach,
    Ferry,
    Metro,
    Rail,
    Tram,
    Underground,
}

impl VehicleMode {
    pub fn transit_mode(self) -> TransitMode {
        match self {
            VehicleMode::Air => TransitMode::Airplane,
            VehicleMode::Bus => TransitMode::Bus,
            VehicleMode::Coach => TransitMode::Coach,
            VehicleMode::Ferry => TransitMode::Ferry,
            VehicleMode::Metro | VehicleMode::Underground => TransitMode::Subway,
            VehicleMode::Rail => TransitMode::Rail,
            VehicleMode::Tram => TransitMode::Tram,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrivalBoardingActivity {
    Alighting,
    NoAlighting,
    PassThru,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepartureBoardingActivity {
    Boarding,
    NoBoarding,
    PassThru,
}

/// A call that has already happened.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordedCall {
    pub stop_point_ref: Option<String>,
    pub order: Option<u32>,
    pub cancellation: Option<bool>,
    pub extra_call: Option<bool>,
    pub prediction_inaccurate: Option<bool>,
    pub aimed_arrival_time: Option<DateTime<FixedOffset>>,
    pub expected_arrival_time: Option<DateTime<FixedOffset>>,
    pub actual_arrival_time: Option<DateTime<FixedOffset>>,
    pub aimed_departure_time: Option<DateTime<FixedOffset>>,
    pub expected_departure_time: Option<DateTime<FixedOffset>>,
    pub actual_departure_time: Option<DateTime<FixedOffset>>,
}

/// A call predicted to happen.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EstimatedCall {
    pub stop_point_ref: Option<String>,
    pub order: Option<u32>,
    pub cancellation: Option<bool>,
    pub extra_call: Option<bool>,
    pub prediction_inaccurate: Option<bool>,
    pub aimed_arrival_time: Option<DateTime<FixedOffset>>,
    pub expected_arrival_time: Option<DateTime<FixedOffset>>,
    pub aimed_departure_time: Option<DateTime<FixedOffset>>,
    pub expected_departure_time: Option<DateTime<FixedOffset>>,
    pub arrival_boarding_activity: Option<ArrivalBoardingActivity>,
    pub departure_boarding_activity: Option<DepartureBoardingActivity>,
    /// Destination shown on the vehicle from this call.
    pub destination_display: Option<String>,
}
