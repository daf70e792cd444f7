//! Reconciliation of realtime messages with the schedule.
//!
//! [`SiriTripUpdateAdapter`] decides for each journey whether it cancels,
//! updates, re-routes or adds a trip, builds the new trip times and writes
//! them to the snapshot buffer. [`worker`] runs an adapter as a background
//! task fed through a channel.

mod adapter;
mod added_trip;
mod config;
mod stop_pattern;
mod trip_times;
pub mod worker;

pub use adapter::{SiriTripUpdateAdapter, UpdateIncrementality};
pub use added_trip::{AddedTrip, AddedTripBuilder, resolve_submode};
pub use config::UpdaterConfig;
pub use stop_pattern::{CallMatch, derive_stop_pattern, dropoff_for, match_calls, pickup_for};
pub use trip_times::{AddedTripTimes, build_for_added_trip, build_for_update};
pub use worker::{Batch, UpdaterHandle, WorkerError};
