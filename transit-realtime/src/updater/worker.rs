//! Background task applying a feed's batches.

use chrono::{NaiveDate, Utc};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::domain::UpdateResult;
use crate::siri::{EstimatedTimetableDelivery, EstimatedVehicleJourney};

use super::{SiriTripUpdateAdapter, UpdateIncrementality};

/// Batches queued per worker before senders wait.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// A batch of journeys for one worker.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub journeys: Vec<EstimatedVehicleJourney>,
    pub incrementality: UpdateIncrementality,
}

impl From<EstimatedTimetableDelivery> for Batch {
    fn from(delivery: EstimatedTimetableDelivery) -> Self {
        Self {
            journeys: delivery.estimated_vehicle_journeys,
            incrementality: if delivery.full_dataset {
                UpdateIncrementality::FullDataset
            } else {
                UpdateIncrementality::Differential
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("updater worker has stopped")]
    Closed,

    #[error("updater worker failed: {0}")]
    Join(#[from] JoinError),
}

/// Handle to a running worker.
#[derive(Debug)]
pub struct UpdaterHandle {
    sender: mpsc::Sender<Batch>,
    task: JoinHandle<UpdateResult>,
}

impl UpdaterHandle {
    /// Queues a batch, waiting while the channel is full.
    pub async fn send(&self, batch: Batch) -> Result<(), WorkerError> {
        self.sender.send(batch).await.map_err(|_| WorkerError::Closed)
    }

    /// Closes the channel, waits for queued batches to be applied and
    /// returns the merged result of every batch.
    pub async fn finish(self) -> Result<UpdateResult, WorkerError> {
        drop(self.sender);
        Ok(self.task.await?)
    }
}

/// Spawns a worker that applies batches one at a time.
///
/// Between batches the worker wakes every
/// [`commit_tick`](super::UpdaterConfig::commit_tick) to publish commits
/// that were deferred by the minimum commit interval and to purge expired
/// data once per day. Must be called from within a tokio runtime.
pub fn spawn(adapter: SiriTripUpdateAdapter, capacity: usize) -> UpdaterHandle {
    let (sender, receiver) = mpsc::channel(capacity);
    let task = tokio::spawn(run(adapter, receiver));
    UpdaterHandle { sender, task }
}

async fn run(adapter: SiriTripUpdateAdapter, mut receiver: mpsc::Receiver<Batch>) -> UpdateResult {
    let feed = adapter.config().feed_id.clone();
    let source = adapter.config().source.clone();
    let time_zone = adapter.index().time_zone();
    let mut tick = tokio::time::interval(adapter.config().commit_tick);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut total = UpdateResult::default();
    let mut batches = 0usize;
    let mut last_purge: Option<NaiveDate> = None;
    info!(%feed, %source, "updater started");

    loop {
        tokio::select! {
            // Ticks first, so the day's purge runs before the first batch
            biased;

            _ = tick.tick() => {
                adapter.manager().commit_if_due();
                let today = Utc::now().with_timezone(&time_zone).date_naive();
                if last_purge != Some(today) {
                    adapter.manager().purge_expired_data(today);
                    last_purge = Some(today);
                }
            }
            batch = receiver.recv() => {
                let Some(batch) = batch else {
                    break;
                };
                batches += 1;
                debug!(%feed, journeys = batch.journeys.len(), incrementality = ?batch.incrementality, "applying batch");
                total.merge(adapter.apply_batch(&batch.journeys, batch.incrementality));
            }
        }
    }

    adapter.manager().force_commit();
    info!(
        %feed,
        %source,
        batches,
        successful = total.successful(),
        failed = total.failed(),
        "updater stopped"
    );
    total
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::domain::{RealTimeState, UpdateErrorType};
    use crate::snapshot::{SnapshotConfig, TimetableSnapshotManager};
    use crate::test_fixtures::{self, estimated, id, journey_for};
    use crate::updater::UpdaterConfig;

    fn adapter(min_commit_interval: Duration) -> SiriTripUpdateAdapter {
        let model = test_fixtures::model();
        // Purging would drop the fixture's dates
        let manager = TimetableSnapshotManager::new(SnapshotConfig::new(min_commit_interval, false));
        SiriTripUpdateAdapter::new(
            Arc::new(model.index),
            Arc::new(manager),
            UpdaterConfig::new(test_fixtures::FEED, false, Duration::from_millis(5)),
        )
    }

    fn cancel(trip: &str) -> EstimatedVehicleJourney {
        EstimatedVehicleJourney {
            cancellation: Some(true),
            ..journey_for(trip)
        }
    }

    fn batch(journeys: Vec<EstimatedVehicleJourney>) -> Batch {
        Batch {
            journeys,
            incrementality: UpdateIncrementality::Differential,
        }
    }

    #[tokio::test]
    async fn applies_batches_in_order() {
        let adapter = adapter(Duration::ZERO);
        let manager = adapter.manager().clone();
        let handle = spawn(adapter, DEFAULT_CHANNEL_CAPACITY);

        let delayed = EstimatedVehicleJourney {
            estimated_calls: vec![estimated("B_1", Some(("10:10", "10:12")), Some(("10:12", "10:13")))],
            ..journey_for("TRIP_1")
        };
        handle.send(batch(vec![cancel("TRIP_1")])).await.unwrap();
        handle.send(batch(vec![delayed, journey_for("NOPE")])).await.unwrap();

        let result = handle.finish().await.unwrap();
        assert_eq!(result.successful(), 2);
        assert_eq!(result.error_types(), [UpdateErrorType::TripNotFound]);

        let model = test_fixtures::model();
        let snapshot = manager.current_snapshot();
        let times = snapshot
            .resolve(&model.pattern, test_fixtures::service_date())
            .get(&id("TRIP_1"))
            .unwrap()
            .clone();
        assert_eq!(times.state(), RealTimeState::Updated);
        assert_eq!(times.arrival_delay(1), 120);
    }

    #[tokio::test]
    async fn deferred_commit_published_on_finish() {
        let adapter = adapter(Duration::from_secs(3600));
        let manager = adapter.manager().clone();
        let handle = spawn(adapter, 1);

        handle.send(batch(vec![cancel("TRIP_1")])).await.unwrap();
        handle.send(batch(vec![cancel("TRIP_2")])).await.unwrap();
        let result = handle.finish().await.unwrap();
        assert_eq!(result.successful(), 2);

        let model = test_fixtures::model();
        let snapshot = manager.current_snapshot();
        let table = snapshot.resolve(&model.pattern, test_fixtures::service_date());
        assert!(table.get(&id("TRIP_1")).unwrap().is_canceled());
        assert!(table.get(&id("TRIP_2")).unwrap().is_canceled());
        assert_eq!(snapshot.version(), 2);
    }

    #[test]
    fn batch_from_delivery() {
        let delivery = EstimatedTimetableDelivery {
            full_dataset: true,
            estimated_vehicle_journeys: vec![cancel("TRIP_1")],
            ..Default::default()
        };
        let batch = Batch::from(delivery);
        assert_eq!(batch.incrementality, UpdateIncrementality::FullDataset);
        assert_eq!(batch.journeys.len(), 1);
    }
}
