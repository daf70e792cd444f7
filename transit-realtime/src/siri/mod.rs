//! SIRI Estimated Timetable input.
//!
//! Deliveries arrive already decoded from JSON. Each
//! [`EstimatedVehicleJourney`] describes one journey: either a deviation
//! from a scheduled trip or a journey that is not in the schedule at all.
//! Its stops come as two lists (recorded and estimated calls) that
//! [`CallWrapper`] flattens into one sequence.

mod call;
mod mock;
mod types;

pub use call::{Call, CallWrapper};
pub use mock::{MockFeed, MockFeedError};
pub use types::{
    ArrivalBoardingActivity, DepartureBoardingActivity, EstimatedCall,
    EstimatedTimetableDelivery, EstimatedVehicleJourney, FramedVehicleJourneyRef, RecordedCall,
    VehicleMode,
};
