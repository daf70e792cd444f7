//! Organizations: the agencies that own routes and the operators that run them.

use chrono_tz::Tz;

use super::FeedScopedId;

/// The authority responsible for a set of routes.
///
/// The agency time zone is the zone in which service days start, so all
/// "seconds since start of service" values on its trips are relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agency {
    pub id: FeedScopedId,
    pub name: String,
    pub timezone: Tz,
}

impl Agency {
    pub fn new(id: FeedScopedId, name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            id,
            name: name.into(),
            timezone,
        }
    }
}

/// The company actually running vehicles on behalf of an agency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: FeedScopedId,
    pub name: String,
}

impl Operator {
    pub fn new(id: FeedScopedId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
