//! The static schedule and lookups against it.
//!
//! [`TransitIndex`] holds the imported schedule. [`EntityResolver`]
//! combines it with the realtime overlay to turn message references into
//! entities, and [`fuzzy::match_trip`] finds trips for journeys that do
//! not reference one.

mod fixture;
pub mod fuzzy;
mod index;
mod resolver;

pub use fixture::{FixtureError, load_fixture, parse_fixture};
pub use index::{TransitIndex, TransitIndexBuilder};
pub use resolver::{Entity, EntityKind, EntityResolver, origin_departure};
