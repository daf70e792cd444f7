//! Stop patterns: the ordered stops of a trip together with boarding and
//! alighting permissions.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::{FeedScopedId, Stop};

/// Whether passengers may board (pickup) or alight (dropoff) at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PickDrop {
    #[default]
    Scheduled,
    None,
    Cancelled,
    CoordinateWithDriver,
}

impl PickDrop {
    /// True if a passenger can use this permission in a journey.
    pub fn is_routable(self) -> bool {
        matches!(self, PickDrop::Scheduled | PickDrop::CoordinateWithDriver)
    }
}

/// An immutable sequence of `(stop, pickup, dropoff)` entries.
///
/// Equality and hashing are positional over stop ids and permissions, so two
/// patterns built independently from the same data are interchangeable as
/// cache keys.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use transit_realtime::domain::{FeedScopedId, PickDrop, Stop, StopPattern};
///
/// let a = Arc::new(Stop::new(FeedScopedId::new("F", "A"), "A"));
/// let b = Arc::new(Stop::new(FeedScopedId::new("F", "B"), "B"));
/// let pattern = StopPattern::scheduled([a.clone(), b.clone()]);
///
/// let mut builder = pattern.to_builder();
/// builder.set_pickup(1, PickDrop::None);
/// let changed = builder.build();
///
/// assert_ne!(pattern, changed);
/// assert_eq!(pattern, StopPattern::scheduled([a, b]));
/// ```
#[derive(Debug, Clone)]
pub struct StopPattern {
    stops: Vec<Arc<Stop>>,
    pickups: Vec<PickDrop>,
    dropoffs: Vec<PickDrop>,
}

impl StopPattern {
    /// Creates a pattern from explicit entries.
    pub fn new(entries: impl IntoIterator<Item = (Arc<Stop>, PickDrop, PickDrop)>) -> Self {
        let mut stops = Vec::new();
        let mut pickups = Vec::new();
        let mut dropoffs = Vec::new();
        for (stop, pickup, dropoff) in entries {
            stops.push(stop);
            pickups.push(pickup);
            dropoffs.push(dropoff);
        }
        Self {
            stops,
            pickups,
            dropoffs,
        }
    }

    /// Creates a pattern where every stop allows both boarding and alighting.
    pub fn scheduled(stops: impl IntoIterator<Item = Arc<Stop>>) -> Self {
        Self::new(
            stops
                .into_iter()
                .map(|stop| (stop, PickDrop::Scheduled, PickDrop::Scheduled)),
        )
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn stops(&self) -> &[Arc<Stop>] {
        &self.stops
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn stop(&self, index: usize) -> &Arc<Stop> {
        &self.stops[index]
    }

    pub fn pickup(&self, index: usize) -> PickDrop {
        self.pickups[index]
    }

    pub fn dropoff(&self, index: usize) -> PickDrop {
        self.dropoffs[index]
    }

    /// True if no stop allows boarding and alighting in a usable way.
    pub fn is_all_stops_non_routable(&self) -> bool {
        self.pickups
            .iter()
            .zip(&self.dropoffs)
            .all(|(p, d)| !p.is_routable() && !d.is_routable())
    }

    pub fn stop_ids(&self) -> impl Iterator<Item = &FeedScopedId> {
        self.stops.iter().map(|s| &s.id)
    }

    pub fn to_builder(&self) -> StopPatternBuilder {
        StopPatternBuilder {
            pattern: self.clone(),
        }
    }
}

impl PartialEq for StopPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pickups == other.pickups
            && self.dropoffs == other.dropoffs
            && self.stop_ids().eq(other.stop_ids())
    }
}

impl Eq for StopPattern {}

impl Hash for StopPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stops.len().hash(state);
        for id in self.stop_ids() {
            id.hash(state);
        }
        self.pickups.hash(state);
        self.dropoffs.hash(state);
    }
}

/// Mutable copy of a [`StopPattern`], used to derive a modified pattern.
#[derive(Debug, Clone)]
pub struct StopPatternBuilder {
    pattern: StopPattern,
}

impl StopPatternBuilder {
    pub fn set_stop(&mut self, index: usize, stop: Arc<Stop>) {
        self.pattern.stops[index] = stop;
    }

    pub fn set_pickup(&mut self, index: usize, pickup: PickDrop) {
        self.pattern.pickups[index] = pickup;
    }

    pub fn set_dropoff(&mut self, index: usize, dropoff: PickDrop) {
        self.pattern.dropoffs[index] = dropoff;
    }

    /// Marks both permissions at `index` as cancelled.
    pub fn cancel_stop(&mut self, index: usize) {
        self.set_pickup(index, PickDrop::Cancelled);
        self.set_dropoff(index, PickDrop::Cancelled);
    }

    pub fn build(self) -> StopPattern {
        self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn stop(id: &str) -> Arc<Stop> {
        Arc::new(Stop::new(FeedScopedId::new("F", id), id))
    }

    #[test]
    fn equality_ignores_stop_names() {
        let a = StopPattern::scheduled([stop("A"), stop("B")]);
        let b = StopPattern::scheduled([
            Arc::new(Stop::new(FeedScopedId::new("F", "A"), "renamed")),
            stop("B"),
        ]);
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn order_matters() {
        let a = StopPattern::scheduled([stop("A"), stop("B")]);
        let b = StopPattern::scheduled([stop("B"), stop("A")]);
        assert_ne!(a, b);
    }

    #[test]
    fn cancel_stop_sets_both_permissions() {
        let mut builder = StopPattern::scheduled([stop("A"), stop("B")]).to_builder();
        builder.cancel_stop(0);
        let pattern = builder.build();

        assert_eq!(pattern.pickup(0), PickDrop::Cancelled);
        assert_eq!(pattern.dropoff(0), PickDrop::Cancelled);
        assert_eq!(pattern.pickup(1), PickDrop::Scheduled);
    }

    #[test]
    fn non_routable_detection() {
        let pattern = StopPattern::scheduled([stop("A"), stop("B")]);
        assert!(!pattern.is_all_stops_non_routable());

        let mut builder = pattern.to_builder();
        builder.cancel_stop(0);
        builder.set_pickup(1, PickDrop::None);
        builder.set_dropoff(1, PickDrop::None);
        assert!(builder.build().is_all_stops_non_routable());
    }

    #[test]
    fn coordinate_with_driver_is_routable() {
        assert!(PickDrop::CoordinateWithDriver.is_routable());
        assert!(!PickDrop::None.is_routable());
        assert!(!PickDrop::Cancelled.is_routable());
    }
}
