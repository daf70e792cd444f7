//! Versioned snapshots of realtime timetables.
//!
//! The updater writes into a buffer held by [`TimetableSnapshotManager`];
//! commits publish an immutable [`TimetableSnapshot`] that routing reads
//! without locking.

mod config;
mod manager;
mod overlay;
mod pattern_cache;
mod timetable_snapshot;

pub use config::SnapshotConfig;
pub use manager::{SnapshotBuffer, TimetableSnapshotManager};
pub use overlay::{TransitOverlay, service_id_for_date};
pub use pattern_cache::{TripPatternCache, TripPatternIdGenerator};
pub use timetable_snapshot::TimetableSnapshot;
