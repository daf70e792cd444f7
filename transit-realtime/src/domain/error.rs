//! Update error types.
//!
//! Every rejected realtime message is reported as an [`UpdateError`]; a
//! batch is summarized as an [`UpdateResult`]. None of these abort a
//! batch: failures are recorded per message and processing continues.

use std::collections::HashMap;
use std::fmt;

use super::{FeedScopedId, TripTimesValidationError, ValidationErrorKind};

/// Why a realtime message was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UpdateErrorType {
    NoStartDate,
    TooFewStops,
    NoValidStops,
    NegativeDwellTime,
    NegativeHopTime,
    NotMonitored,
    TripNotFound,
    NoFuzzyTripMatch,
    /// Reserved for stop sequences that cannot be matched to the pattern.
    InvalidStopSequence,
    Unknown,
}

impl fmt::Display for UpdateErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateErrorType::NoStartDate => "NO_START_DATE",
            UpdateErrorType::TooFewStops => "TOO_FEW_STOPS",
            UpdateErrorType::NoValidStops => "NO_VALID_STOPS",
            UpdateErrorType::NegativeDwellTime => "NEGATIVE_DWELL_TIME",
            UpdateErrorType::NegativeHopTime => "NEGATIVE_HOP_TIME",
            UpdateErrorType::NotMonitored => "NOT_MONITORED",
            UpdateErrorType::TripNotFound => "TRIP_NOT_FOUND",
            UpdateErrorType::NoFuzzyTripMatch => "NO_FUZZY_TRIP_MATCH",
            UpdateErrorType::InvalidStopSequence => "INVALID_STOP_SEQUENCE",
            UpdateErrorType::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A rejected message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error_type}{}", describe(.trip_id, .stop_index))]
pub struct UpdateError {
    pub error_type: UpdateErrorType,
    pub trip_id: Option<FeedScopedId>,
    pub stop_index: Option<usize>,
    /// The data source that produced the message, if known.
    pub producer: Option<String>,
}

fn describe(trip_id: &Option<FeedScopedId>, stop_index: &Option<usize>) -> String {
    let mut out = String::new();
    if let Some(trip_id) = trip_id {
        out.push_str(&format!(" for trip {trip_id}"));
    }
    if let Some(stop_index) = stop_index {
        out.push_str(&format!(" at stop {stop_index}"));
    }
    out
}

impl UpdateError {
    pub fn new(error_type: UpdateErrorType) -> Self {
        Self {
            error_type,
            trip_id: None,
            stop_index: None,
            producer: None,
        }
    }

    pub fn for_trip(error_type: UpdateErrorType, trip_id: FeedScopedId) -> Self {
        Self::new(error_type).with_trip_id(trip_id)
    }

    pub fn with_trip_id(mut self, trip_id: FeedScopedId) -> Self {
        self.trip_id = Some(trip_id);
        self
    }

    pub fn with_producer(mut self, producer: Option<String>) -> Self {
        self.producer = producer;
        self
    }

    /// Converts a trip-times validation failure into the matching update
    /// error, keeping the stop index.
    pub fn from_validation(trip_id: FeedScopedId, err: TripTimesValidationError) -> Self {
        let error_type = match err.kind {
            ValidationErrorKind::NegativeDwellTime => UpdateErrorType::NegativeDwellTime,
            ValidationErrorKind::NegativeHopTime => UpdateErrorType::NegativeHopTime,
            ValidationErrorKind::StopCountMismatch => UpdateErrorType::Unknown,
        };
        Self {
            error_type,
            trip_id: Some(trip_id),
            stop_index: Some(err.stop_index),
            producer: None,
        }
    }
}

/// Outcome of applying a batch of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResult {
    successful: usize,
    failures: HashMap<UpdateErrorType, Vec<UpdateError>>,
}

impl UpdateResult {
    /// Tallies a sequence of per-message outcomes.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_realtime::domain::{UpdateError, UpdateErrorType, UpdateResult};
    ///
    /// let result = UpdateResult::of_results([
    ///     Ok(()),
    ///     Err(UpdateError::new(UpdateErrorType::TooFewStops)),
    ///     Ok(()),
    /// ]);
    /// assert_eq!(result.successful(), 2);
    /// assert_eq!(result.failed(), 1);
    /// assert_eq!(result.failures_of(UpdateErrorType::TooFewStops).len(), 1);
    /// ```
    pub fn of_results<T>(results: impl IntoIterator<Item = Result<T, UpdateError>>) -> Self {
        let mut out = Self::default();
        for result in results {
            match result {
                Ok(_) => out.successful += 1,
                Err(err) => out.failures.entry(err.error_type).or_default().push(err),
            }
        }
        out
    }

    pub fn successful(&self) -> usize {
        self.successful
    }

    pub fn failed(&self) -> usize {
        self.failures.values().map(Vec::len).sum()
    }

    pub fn failures(&self) -> &HashMap<UpdateErrorType, Vec<UpdateError>> {
        &self.failures
    }

    pub fn failures_of(&self, error_type: UpdateErrorType) -> &[UpdateError] {
        self.failures
            .get(&error_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Failure types present, in a stable order.
    pub fn error_types(&self) -> Vec<UpdateErrorType> {
        let mut types: Vec<_> = self.failures.keys().copied().collect();
        types.sort();
        types
    }

    /// Adds the counts of `other` to this result.
    pub fn merge(&mut self, other: UpdateResult) {
        self.successful += other.successful;
        for (error_type, errors) in other.failures {
            self.failures.entry(error_type).or_default().extend(errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = UpdateError::new(UpdateErrorType::NoStartDate);
        assert_eq!(err.to_string(), "NO_START_DATE");

        let err = UpdateError::for_trip(UpdateErrorType::TripNotFound, FeedScopedId::new("F", "T1"));
        assert_eq!(err.to_string(), "TRIP_NOT_FOUND for trip F:T1");

        let err = UpdateError::from_validation(
            FeedScopedId::new("F", "T1"),
            TripTimesValidationError {
                stop_index: 2,
                kind: ValidationErrorKind::NegativeHopTime,
            },
        );
        assert_eq!(err.to_string(), "NEGATIVE_HOP_TIME for trip F:T1 at stop 2");
    }

    #[test]
    fn merge_results() {
        let mut a = UpdateResult::of_results([Ok(()), Err(UpdateError::new(UpdateErrorType::Unknown))]);
        let b = UpdateResult::of_results([
            Err::<(), _>(UpdateError::new(UpdateErrorType::Unknown)),
            Err(UpdateError::new(UpdateErrorType::NotMonitored)),
        ]);
        a.merge(b);

        assert_eq!(a.successful(), 1);
        assert_eq!(a.failed(), 3);
        assert_eq!(
            a.error_types(),
            vec![UpdateErrorType::NotMonitored, UpdateErrorType::Unknown]
        );
    }

    #[test]
    fn empty_result() {
        let result = UpdateResult::default();
        assert_eq!(result.successful(), 0);
        assert!(result.failures_of(UpdateErrorType::TripNotFound).is_empty());
    }
}
