//! Routes, transport modes and submodes.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use super::{Agency, FeedScopedId, Operator};

/// Main transport mode of a route or trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitMode {
    Rail,
    Bus,
    Coach,
    Tram,
    Subway,
    Ferry,
    Airplane,
    Funicular,
    Gondola,
}

impl fmt::Display for TransitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransitMode::Rail => "RAIL",
            TransitMode::Bus => "BUS",
            TransitMode::Coach => "COACH",
            TransitMode::Tram => "TRAM",
            TransitMode::Subway => "SUBWAY",
            TransitMode::Ferry => "FERRY",
            TransitMode::Airplane => "AIRPLANE",
            TransitMode::Funicular => "FUNICULAR",
            TransitMode::Gondola => "GONDOLA",
        };
        f.write_str(s)
    }
}

/// A finer-grained mode, e.g. `railReplacementBus`.
///
/// Submodes are open-ended strings in the source data. The empty value
/// is the "unknown" submode.
///
/// # Examples
///
/// ```
/// use transit_realtime::domain::SubMode;
///
/// assert!(SubMode::UNKNOWN.is_unknown());
/// assert_eq!(SubMode::of("localBus").as_str(), Some("localBus"));
/// assert_eq!(SubMode::from(None), SubMode::UNKNOWN);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SubMode(Option<Arc<str>>);

impl SubMode {
    /// The submode used when nothing more specific is known.
    pub const UNKNOWN: SubMode = SubMode(None);

    /// Bus service replacing a rail line.
    pub const RAIL_REPLACEMENT_BUS: &'static str = "railReplacementBus";

    /// Rail service replacing another rail service.
    pub const REPLACEMENT_RAIL_SERVICE: &'static str = "replacementRailService";

    pub fn of(name: &str) -> Self {
        SubMode(Some(Arc::from(name)))
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<Option<&str>> for SubMode {
    fn from(value: Option<&str>) -> Self {
        value.map(SubMode::of).unwrap_or_default()
    }
}

impl fmt::Display for SubMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("unknown"))
    }
}

/// A public transport line.
///
/// Routes from the static schedule are never modified. Routes created for
/// added trips are built once, registered in the realtime overlay and then
/// shared by `Arc` between every trip on the same line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: FeedScopedId,
    pub agency: Arc<Agency>,
    pub operator: Option<Arc<Operator>>,
    pub short_name: Option<String>,
    pub mode: TransitMode,
    pub submode: SubMode,
}

impl Route {
    pub fn new(id: FeedScopedId, agency: Arc<Agency>, mode: TransitMode) -> Self {
        Self {
            id,
            agency,
            operator: None,
            short_name: None,
            mode,
            submode: SubMode::UNKNOWN,
        }
    }

    pub fn with_operator(mut self, operator: Arc<Operator>) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    pub fn with_submode(mut self, submode: SubMode) -> Self {
        self.submode = submode;
        self
    }

    /// True when the route is run by the given operator.
    pub fn is_operated_by(&self, operator: &FeedScopedId) -> bool {
        self.operator.as_ref().is_some_and(|o| &o.id == operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agency() -> Arc<Agency> {
        Arc::new(Agency::new(
            FeedScopedId::new("F", "AGENCY"),
            "Agency",
            chrono_tz::Europe::Oslo,
        ))
    }

    #[test]
    fn submode_conversion() {
        assert_eq!(SubMode::from(Some("localBus")), SubMode::of("localBus"));
        assert!(SubMode::from(None).is_unknown());
        assert_eq!(SubMode::UNKNOWN.to_string(), "unknown");
    }

    #[test]
    fn route_operator_check() {
        let op = Arc::new(Operator::new(FeedScopedId::new("F", "OP"), "Op"));
        let route = Route::new(FeedScopedId::new("F", "R1"), agency(), TransitMode::Bus)
            .with_operator(op);

        assert!(route.is_operated_by(&FeedScopedId::new("F", "OP")));
        assert!(!route.is_operated_by(&FeedScopedId::new("F", "OTHER")));
    }

    #[test]
    fn route_defaults() {
        let route = Route::new(FeedScopedId::new("F", "R1"), agency(), TransitMode::Rail);
        assert!(route.operator.is_none());
        assert!(route.short_name.is_none());
        assert!(route.submode.is_unknown());
    }
}
