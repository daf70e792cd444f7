//! Mock SIRI feed for running without a live subscription.
//!
//! Loads recorded deliveries from JSON files and replays them in file name
//! order, one delivery per file.

use std::path::{Path, PathBuf};

use super::types::EstimatedTimetableDelivery;

/// Errors loading mock deliveries.
#[derive(Debug, thiserror::Error)]
pub enum MockFeedError {
    #[error("failed to read mock data directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no delivery files found in {0:?}")]
    Empty(PathBuf),
}

/// Deliveries loaded from a directory of JSON files.
#[derive(Debug, Clone)]
pub struct MockFeed {
    deliveries: Vec<(String, EstimatedTimetableDelivery)>,
}

impl MockFeed {
    /// Loads every `*.json` file in `data_dir`, sorted by file name.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, MockFeedError> {
        let data_dir = data_dir.as_ref();

        let entries = std::fs::read_dir(data_dir).map_err(|source| MockFeedError::ReadDir {
            path: data_dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| MockFeedError::ReadDir {
                path: data_dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut deliveries = Vec::with_capacity(paths.len());
        for path in paths {
            let json = std::fs::read_to_string(&path).map_err(|source| MockFeedError::Read {
                path: path.clone(),
                source,
            })?;
            let delivery: EstimatedTimetableDelivery =
                serde_json::from_str(&json).map_err(|source| MockFeedError::Parse {
                    path: path.clone(),
                    source,
                })?;

            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            deliveries.push((name, delivery));
        }

        if deliveries.is_empty() {
            return Err(MockFeedError::Empty(data_dir.to_path_buf()));
        }

        Ok(Self { deliveries })
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Names (file stems) of the loaded deliveries, in replay order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.deliveries.iter().map(|(name, _)| name.as_str())
    }

    pub fn into_deliveries(self) -> Vec<EstimatedTimetableDelivery> {
        self.deliveries.into_iter().map(|(_, d)| d).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("002.json"),
            r#"{"EstimatedVehicleJourneys": [{"LineRef": "second"}]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("001.json"),
            r#"{"FullDataset": true, "EstimatedVehicleJourneys": [{"LineRef": "first"}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let feed = MockFeed::new(dir.path()).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.names().collect::<Vec<_>>(), ["001", "002"]);

        let deliveries = feed.into_deliveries();
        assert!(deliveries[0].full_dataset);
        assert_eq!(
            deliveries[1].estimated_vehicle_journeys[0].line_ref.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MockFeed::new(dir.path()).unwrap_err();
        assert!(matches!(err, MockFeedError::Empty(_)));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

        let err = MockFeed::new(dir.path()).unwrap_err();
        assert!(matches!(err, MockFeedError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = MockFeed::new("/nonexistent/mock/dir").unwrap_err();
        assert!(matches!(err, MockFeedError::ReadDir { .. }));
    }
}
