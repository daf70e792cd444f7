//! Stops and the stations that group them.

use super::FeedScopedId;

/// A station: a named group of stops (quays/platforms).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: FeedScopedId,
    pub name: String,
}

impl Station {
    pub fn new(id: FeedScopedId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A boardable stop point, optionally belonging to a station.
///
/// Stops that share a parent station are interchangeable for platform
/// changes: a realtime message may move a call to another quay of the
/// same station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    pub id: FeedScopedId,
    pub name: String,
    /// Parent station id, if the stop is part of one.
    pub parent_station: Option<FeedScopedId>,
}

impl Stop {
    /// Creates a stop without a parent station.
    pub fn new(id: FeedScopedId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_station: None,
        }
    }

    /// Returns a copy of this stop placed in the given station.
    pub fn with_parent_station(mut self, station: FeedScopedId) -> Self {
        self.parent_station = Some(station);
        self
    }

    /// True when both stops have a parent station and it is the same one.
    ///
    /// Stops without a parent are never part of the same station as
    /// anything, including themselves.
    pub fn is_part_of_same_station_as(&self, other: &Stop) -> bool {
        match (&self.parent_station, &other.parent_station) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
