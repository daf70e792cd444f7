//! Application of SIRI-ET journeys to the timetable snapshot.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, trace, warn};

use crate::domain::{
    FeedScopedId, TripPattern, TripTimes, UpdateError, UpdateErrorType, UpdateResult,
};
use crate::schedule::{EntityResolver, TransitIndex, fuzzy};
use crate::siri::{CallWrapper, EstimatedVehicleJourney};
use crate::snapshot::{SnapshotBuffer, TimetableSnapshot, TimetableSnapshotManager, TripPatternCache};

use super::added_trip::{AddedTrip, AddedTripBuilder};
use super::stop_pattern::derive_stop_pattern;
use super::trip_times::build_for_update;
use super::UpdaterConfig;

/// Whether a batch describes changes or the full current state of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateIncrementality {
    /// Journeys not mentioned keep their realtime data.
    #[default]
    Differential,
    /// Everything the feed wrote earlier is dropped before applying.
    FullDataset,
}

/// What one accepted journey does to the snapshot buffer.
#[derive(Debug)]
enum Change {
    Add(AddedTrip),
    Update {
        trip_id: FeedScopedId,
        service_date: NaiveDate,
        /// The pattern the trip runs on in the schedule (or overlay).
        pattern: Arc<TripPattern>,
        /// Set when the row belongs on a pattern derived from `pattern`.
        modified: Option<Arc<TripPattern>>,
        times: TripTimes,
    },
}

/// Applies batches of estimated vehicle journeys from one feed.
///
/// Each journey is accepted or rejected on its own; a rejected journey
/// leaves the snapshot exactly as it was. Accepted changes are written to
/// the manager's buffer and published at the end of the batch, subject to
/// the minimum commit interval.
#[derive(Debug, Clone)]
pub struct SiriTripUpdateAdapter {
    index: Arc<TransitIndex>,
    manager: Arc<TimetableSnapshotManager>,
    config: UpdaterConfig,
}

impl SiriTripUpdateAdapter {
    pub fn new(
        index: Arc<TransitIndex>,
        manager: Arc<TimetableSnapshotManager>,
        config: UpdaterConfig,
    ) -> Self {
        Self {
            index,
            manager,
            config,
        }
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<TransitIndex> {
        &self.index
    }

    pub fn manager(&self) -> &Arc<TimetableSnapshotManager> {
        &self.manager
    }

    /// Applies a batch and reports the outcome of each journey.
    pub fn apply_batch(
        &self,
        journeys: &[EstimatedVehicleJourney],
        incrementality: UpdateIncrementality,
    ) -> UpdateResult {
        let mut buffer = self.manager.buffer();
        if incrementality == UpdateIncrementality::FullDataset {
            debug!(feed = %self.config.feed_id, source = %self.config.source, "full dataset, clearing source");
            buffer.snapshot.clear(&self.config.source);
        }

        let results: Vec<Result<(), UpdateError>> = journeys
            .iter()
            .map(|journey| {
                self.apply_journey(&mut buffer, journey)
                    .map_err(|err| err.with_producer(journey.data_source.clone()))
            })
            .collect();
        self.manager.commit_locked(&mut buffer, false);
        drop(buffer);

        let result = UpdateResult::of_results(results);
        if result.failed() > 0 {
            warn!(
                feed = %self.config.feed_id,
                successful = result.successful(),
                failed = result.failed(),
                errors = ?result.error_types(),
                "rejected journeys in batch"
            );
        } else {
            debug!(feed = %self.config.feed_id, successful = result.successful(), "applied batch");
        }
        result
    }

    fn apply_journey(
        &self,
        buffer: &mut SnapshotBuffer,
        journey: &EstimatedVehicleJourney,
    ) -> Result<(), UpdateError> {
        let resolver = EntityResolver::new(&self.index, &buffer.snapshot, &self.config.feed_id);
        let change = self.plan(&resolver, &mut buffer.pattern_cache, journey);
        match change {
            Ok(change) => {
                apply_change(&mut buffer.snapshot, change, &self.config.source);
                Ok(())
            }
            Err(err) => {
                debug!(journey = ?journey.reference(), error = %err, "rejected journey");
                Err(err)
            }
        }
    }

    /// Works out the change a journey makes without touching the snapshot.
    fn plan(
        &self,
        resolver: &EntityResolver<'_>,
        pattern_cache: &mut TripPatternCache,
        journey: &EstimatedVehicleJourney,
    ) -> Result<Change, UpdateError> {
        let reference_error = |error_type| {
            let error = UpdateError::new(error_type);
            match journey.reference() {
                Some(r) => error.with_trip_id(resolver.id(r)),
                None => error,
            }
        };

        if journey.is_not_monitored() && !journey.is_cancelled() {
            return Err(reference_error(UpdateErrorType::NotMonitored));
        }

        let trip = resolver.resolve_journey_trip(journey);
        if journey.is_extra_journey() {
            // An added trip is only updated on the date it was added for
            let service_date = resolver.resolve_service_date(journey, None);
            let known = trip.as_ref().is_some_and(|trip| {
                service_date.is_none_or(|date| resolver.is_known_on(&trip.id, date))
            });
            if !known {
                let added = AddedTripBuilder::from_journey(*resolver, journey, service_date)?
                    .build(pattern_cache.id_generator())?;
                return Ok(Change::Add(added));
            }
        }

        let (trip, matched_date) = match trip {
            Some(trip) => (trip, None),
            None if self.config.fuzzy_trip_matching => {
                let (trip, date) = resolver
                    .resolve_service_date(journey, None)
                    .and_then(|date| fuzzy::match_trip(resolver, journey, date))
                    .ok_or_else(|| reference_error(UpdateErrorType::NoFuzzyTripMatch))?;
                (trip, Some(date))
            }
            None => return Err(reference_error(UpdateErrorType::TripNotFound)),
        };
        let trip_error = |error_type| UpdateError::for_trip(error_type, trip.id.clone());

        let service_date = matched_date
            .or_else(|| resolver.resolve_service_date(journey, Some(&trip)))
            .ok_or_else(|| trip_error(UpdateErrorType::NoStartDate))?;
        let pattern = resolver
            .pattern_for_trip(&trip.id, service_date)
            .ok_or_else(|| trip_error(UpdateErrorType::TripNotFound))?;
        let scheduled = pattern
            .scheduled_trip_times(&trip.id)
            .cloned()
            .ok_or_else(|| trip_error(UpdateErrorType::TripNotFound))?;

        if journey.is_cancelled() {
            return Ok(Change::Update {
                trip_id: trip.id.clone(),
                service_date,
                pattern,
                modified: None,
                times: scheduled.cancel(),
            });
        }

        let calls = CallWrapper::of(journey);
        let prediction_inaccurate = journey.prediction_inaccurate == Some(true);
        let (modified, times) = match derive_stop_pattern(&pattern.stop_pattern, &calls, resolver) {
            None => {
                let times = build_for_update(
                    &pattern.stop_pattern,
                    &scheduled,
                    &calls,
                    resolver,
                    service_date,
                    false,
                    prediction_inaccurate,
                )?;
                (None, times)
            }
            Some(stop_pattern) => {
                let times = build_for_update(
                    &stop_pattern,
                    &scheduled,
                    &calls,
                    resolver,
                    service_date,
                    true,
                    prediction_inaccurate,
                )?;
                (Some(pattern_cache.get_or_create(&pattern, stop_pattern)), times)
            }
        };

        Ok(Change::Update {
            trip_id: trip.id.clone(),
            service_date,
            pattern,
            modified,
            times,
        })
    }
}

fn apply_change(snapshot: &mut TimetableSnapshot, change: Change, source: &str) {
    match change {
        Change::Add(added) => {
            debug!(trip = %added.trip.id, pattern = %added.trip_pattern.id, date = %added.service_date, "adding trip");
            snapshot.register_added_trip(
                added.trip_pattern.clone(),
                added.trip_on_service_date.clone(),
                added.new_route,
            );
            snapshot.update(&added.trip_pattern, added.times, added.service_date);
            snapshot.set_source(&added.trip.id, added.service_date, source, added.trip_pattern);
        }
        Change::Update {
            trip_id,
            service_date,
            pattern,
            modified,
            times,
        } => {
            if snapshot.revert_modified_pattern(&trip_id, service_date) {
                trace!(trip = %trip_id, date = %service_date, "reverted modified pattern");
            }
            snapshot.set_source(&trip_id, service_date, source, pattern.clone());
            match modified {
                Some(modified) => {
                    debug!(trip = %trip_id, pattern = %modified.id, date = %service_date, "moving trip to modified pattern");
                    snapshot.remove_trip(&pattern, &trip_id, service_date);
                    snapshot.update(&modified, times, service_date);
                    snapshot.set_modified_pattern(&trip_id, service_date, modified);
                }
                None => {
                    debug!(trip = %trip_id, date = %service_date, state = ?times.state(), "updating trip");
                    snapshot.update(&pattern, times, service_date);
                }
            }
        }
    }
}
