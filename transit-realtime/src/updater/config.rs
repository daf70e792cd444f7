//! Configuration for a realtime updater.

use std::time::Duration;

/// Configuration of one feed's updater.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Feed whose schedule the messages refer to. Message references are
    /// resolved as local ids within this feed.
    pub feed_id: String,

    /// Name of the message source this updater reads. A full dataset only
    /// clears the realtime rows written under this name, so several
    /// updaters can share one schedule feed. Defaults to the feed id.
    pub source: String,

    /// Match journeys without a usable trip reference by line, operator
    /// and origin departure time.
    pub fuzzy_trip_matching: bool,

    /// How often the worker checks whether a deferred commit is due and
    /// purges expired data.
    pub commit_tick: Duration,
}

impl UpdaterConfig {
    pub fn new(feed_id: impl Into<String>, fuzzy_trip_matching: bool, commit_tick: Duration) -> Self {
        let feed_id = feed_id.into();
        Self {
            source: feed_id.clone(),
            feed_id,
            fuzzy_trip_matching,
            commit_tick,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self::new("RT", false, Duration::from_millis(500))
    }
}
