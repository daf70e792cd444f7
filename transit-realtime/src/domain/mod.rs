//! Domain types of the transit model.
//!
//! Static entities (stops, routes, trips, patterns) are immutable and shared
//! by `Arc`. Realtime data is expressed as new values of the same types:
//! a modified [`StopPattern`], a [`TripTimes`] row with a non-scheduled
//! [`RealTimeState`], a [`Timetable`] for one service date.

mod error;
mod id;
mod operator;
mod route;
mod stop;
mod stop_pattern;
mod time;
mod timetable;
mod trip;
mod trip_pattern;
mod trip_times;

pub use error::{UpdateError, UpdateErrorType, UpdateResult};
pub use id::{FeedScopedId, InvalidFeedScopedId};
pub use operator::{Agency, Operator};
pub use route::{Route, SubMode, TransitMode};
pub use stop::{Station, Stop};
pub use stop_pattern::{PickDrop, StopPattern, StopPatternBuilder};
pub use time::{
    SECONDS_PER_DAY, format_seconds, local_date, seconds_since_start_of_service,
    service_day_start,
};
pub use timetable::Timetable;
pub use trip::{Trip, TripOnServiceDate};
pub use trip_pattern::TripPattern;
pub use trip_times::{
    RealTimeState, TripTimes, TripTimesBuilder, TripTimesValidationError, ValidationErrorKind,
};
