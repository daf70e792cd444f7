//! Trips and dated trips.

use std::sync::Arc;

use chrono::NaiveDate;

use super::{FeedScopedId, Operator, Route, SubMode, TransitMode};

/// A scheduled vehicle journey along a route.
///
/// Mode, submode and operator default to those of the route; an added trip
/// may override them (a replacement bus on a rail line, for instance).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: FeedScopedId,
    pub route: Arc<Route>,
    pub service_id: FeedScopedId,
    pub headsign: Option<String>,
    pub short_name: Option<String>,
    pub mode: TransitMode,
    pub submode: SubMode,
    pub operator: Option<Arc<Operator>>,
}

impl Trip {
    pub fn new(id: FeedScopedId, route: Arc<Route>, service_id: FeedScopedId) -> Self {
        Self {
            id,
            mode: route.mode,
            submode: route.submode.clone(),
            operator: route.operator.clone(),
            route,
            service_id,
            headsign: None,
            short_name: None,
        }
    }

    pub fn with_headsign(mut self, headsign: Option<String>) -> Self {
        self.headsign = headsign;
        self
    }

    pub fn with_short_name(mut self, short_name: Option<String>) -> Self {
        self.short_name = short_name;
        self
    }

    pub fn with_mode(mut self, mode: TransitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_submode(mut self, submode: SubMode) -> Self {
        self.submode = submode;
        self
    }

    pub fn with_operator(mut self, operator: Option<Arc<Operator>>) -> Self {
        self.operator = operator;
        self
    }

    /// The operator running this trip: its own, or failing that the route's.
    pub fn operator(&self) -> Option<&Arc<Operator>> {
        self.operator.as_ref().or(self.route.operator.as_ref())
    }
}

/// A trip bound to one service date (a "dated vehicle journey").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripOnServiceDate {
    pub id: FeedScopedId,
    pub trip: Arc<Trip>,
    pub service_date: NaiveDate,
    /// Dated journeys this one replaces, if any.
    pub replacement_for: Vec<Arc<TripOnServiceDate>>,
}

impl TripOnServiceDate {
    pub fn new(id: FeedScopedId, trip: Arc<Trip>, service_date: NaiveDate) -> Self {
        Self {
            id,
            trip,
            service_date,
            replacement_for: Vec::new(),
        }
    }

    pub fn with_replacement_for(mut self, replaced: Vec<Arc<TripOnServiceDate>>) -> Self {
        self.replacement_for = replaced;
        self
    }
}
