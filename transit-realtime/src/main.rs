use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use transit_realtime::domain::RealTimeState;
use transit_realtime::schedule::load_fixture;
use transit_realtime::siri::MockFeed;
use transit_realtime::snapshot::{SnapshotConfig, TimetableSnapshotManager};
use transit_realtime::updater::worker::{self, DEFAULT_CHANNEL_CAPACITY};
use transit_realtime::updater::{Batch, SiriTripUpdateAdapter, UpdaterConfig};

const DEFAULT_FEED_ID: &str = "RB";
const DEFAULT_SCHEDULE: &str = "demos/schedule.json";
const DEFAULT_MESSAGES: &str = "demos/messages";
const DEFAULT_MIN_COMMIT_MS: u64 = 1000;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        warn!("{name} not set, using {default}");
        default.to_string()
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let feed_id = env_or("REALTIME_FEED_ID", DEFAULT_FEED_ID);
    let schedule_path = PathBuf::from(env_or("REALTIME_SCHEDULE", DEFAULT_SCHEDULE));
    let message_dirs: Vec<PathBuf> = env_or("REALTIME_MESSAGES", DEFAULT_MESSAGES)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect();
    let min_commit_ms = std::env::var("REALTIME_MIN_COMMIT_MS")
        .ok()
        .and_then(|v| {
            v.parse().map_err(|_| warn!("REALTIME_MIN_COMMIT_MS is not a number: {v}")).ok()
        })
        .unwrap_or(DEFAULT_MIN_COMMIT_MS);
    let fuzzy_trip_matching = std::env::var("REALTIME_FUZZY_MATCHING")
        .is_ok_and(|v| matches!(v.as_str(), "1" | "true" | "yes"));

    // Load the static schedule (fail fast if unavailable)
    let index = match load_fixture(&schedule_path) {
        Ok(index) => Arc::new(index),
        Err(e) => {
            eprintln!("Failed to load schedule {}: {e}", schedule_path.display());
            return ExitCode::FAILURE;
        }
    };
    info!(
        stops = index.num_stops(),
        trips = index.num_trips(),
        "loaded schedule"
    );

    let mut feeds = Vec::with_capacity(message_dirs.len());
    for dir in &message_dirs {
        match MockFeed::new(dir) {
            Ok(feed) => {
                info!(dir = %dir.display(), deliveries = feed.len(), "loaded message feed");
                feeds.push((dir.display().to_string(), feed));
            }
            Err(e) => {
                eprintln!("Failed to load messages: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let manager = Arc::new(TimetableSnapshotManager::new(SnapshotConfig::new(
        Duration::from_millis(min_commit_ms),
        true,
    )));

    // One worker per directory, all resolving against the same schedule
    // feed. Each directory is its own source, so a full dataset in one
    // directory leaves the rows of the others alone.
    let runs = feeds.into_iter().map(|(source, feed)| {
        let config = UpdaterConfig::new(&feed_id, fuzzy_trip_matching, Duration::from_millis(100))
            .with_source(source);
        let adapter = SiriTripUpdateAdapter::new(index.clone(), manager.clone(), config);
        async move {
            let handle = worker::spawn(adapter, DEFAULT_CHANNEL_CAPACITY);
            for delivery in feed.into_deliveries() {
                handle.send(Batch::from(delivery)).await?;
            }
            handle.finish().await
        }
    });

    let mut failed = false;
    for result in join_all(runs).await {
        match result {
            Ok(result) => {
                info!(
                    successful = result.successful(),
                    failed = result.failed(),
                    "feed finished"
                );
                for (error_type, errors) in result.failures() {
                    for e in errors {
                        warn!(%error_type, producer = ?e.producer, "{e}");
                    }
                }
            }
            Err(e) => {
                error!("feed worker failed: {e}");
                failed = true;
            }
        }
    }

    let snapshot = manager.current_snapshot();
    info!(
        version = snapshot.version(),
        timetables = snapshot.len(),
        added_trips = snapshot.overlay().num_trips(),
        "final snapshot"
    );
    for table in snapshot.timetables() {
        for times in table.trip_times() {
            if times.state() != RealTimeState::Scheduled {
                println!("{times}");
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
