//! Realtime timetable reconciliation.
//!
//! Applies SIRI Estimated Timetable messages to a static transit schedule
//! and publishes the result as immutable, versioned timetable snapshots
//! that readers load without locking.

pub mod domain;
pub mod schedule;
pub mod siri;
pub mod snapshot;
pub mod updater;

#[cfg(test)]
mod test_fixtures;
