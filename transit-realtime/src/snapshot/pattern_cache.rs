//! Trip patterns created for realtime stop-pattern changes.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{FeedScopedId, Route, StopPattern, TripPattern};

/// Generates ids for trip patterns created from realtime data.
///
/// Ids have the form `{route id}:{counter}:RT` in the route's feed. The
/// counter is shared by all routes.
#[derive(Debug, Default)]
pub struct TripPatternIdGenerator {
    counter: u32,
}

impl TripPatternIdGenerator {
    pub fn generate(&mut self, route: &Route) -> FeedScopedId {
        self.counter += 1;
        FeedScopedId::new(
            route.id.feed_id(),
            format!("{}:{:03}:RT", route.id.id(), self.counter),
        )
    }
}

/// Patterns for modified trips, keyed by route and stop pattern.
///
/// Trips on the same route that change their stops the same way end up on
/// the same pattern.
#[derive(Debug, Default)]
pub struct TripPatternCache {
    patterns: HashMap<(FeedScopedId, StopPattern), Arc<TripPattern>>,
    ids: TripPatternIdGenerator,
}

impl TripPatternCache {
    /// Returns the cached pattern for `original`'s route with `stop_pattern`,
    /// creating it on first use.
    pub fn get_or_create(
        &mut self,
        original: &Arc<TripPattern>,
        stop_pattern: StopPattern,
    ) -> Arc<TripPattern> {
        let key = (original.route.id.clone(), stop_pattern);
        if let Some(pattern) = self.patterns.get(&key) {
            return pattern.clone();
        }

        let id = self.ids.generate(&original.route);
        debug!(pattern = %id, original = %original.id, "creating modified trip pattern");
        let pattern = Arc::new(
            TripPattern::new(id, original.route.clone(), Arc::new(key.1.clone()))
                .with_mode(original.mode, original.submode.clone())
                .created_by_realtime(Some(original.clone())),
        );
        self.patterns.insert(key, pattern.clone());
        pattern
    }

    /// Id generator shared with the added-trip builder.
    pub fn id_generator(&mut self) -> &mut TripPatternIdGenerator {
        &mut self.ids
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PickDrop;
    use crate::test_fixtures::{self, id};

    #[test]
    fn same_change_shares_pattern() {
        let model = test_fixtures::model();
        let mut cache = TripPatternCache::default();
        let mut builder = model.pattern.stop_pattern.to_builder();
        builder.set_stop(1, model.stop("B_2"));
        let changed = builder.build();

        let first = cache.get_or_create(&model.pattern, changed.clone());
        let second = cache.get_or_create(&model.pattern, changed);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id, id("RAIL_1:001:RT"));
        assert!(first.created_by_realtime);
        assert_eq!(first.original_trip_pattern.as_ref().map(|p| &p.id), Some(&model.pattern.id));
        assert!(first.scheduled_timetable.is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_changes_get_new_ids() {
        let model = test_fixtures::model();
        let mut cache = TripPatternCache::default();

        let mut builder = model.pattern.stop_pattern.to_builder();
        builder.set_stop(1, model.stop("B_2"));
        let platform = cache.get_or_create(&model.pattern, builder.build());

        let mut builder = model.pattern.stop_pattern.to_builder();
        builder.set_pickup(0, PickDrop::None);
        let no_boarding = cache.get_or_create(&model.pattern, builder.build());

        assert_eq!(platform.id, id("RAIL_1:001:RT"));
        assert_eq!(no_boarding.id, id("RAIL_1:002:RT"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn counter_shared_with_added_trips() {
        let model = test_fixtures::model();
        let mut cache = TripPatternCache::default();

        assert_eq!(cache.id_generator().generate(&model.bus_route), id("BUS_1:001:RT"));
        let mut builder = model.pattern.stop_pattern.to_builder();
        builder.cancel_stop(2);
        let cancelled = cache.get_or_create(&model.pattern, builder.build());
        assert_eq!(cancelled.id, id("RAIL_1:002:RT"));
    }
}
