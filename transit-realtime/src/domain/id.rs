//! Feed-scoped identifier type.

use std::fmt;

/// Separator between the feed id and the local id in the textual form.
const SEPARATOR: char = ':';

/// Error returned when parsing an invalid feed-scoped id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid feed-scoped id: {reason}")]
pub struct InvalidFeedScopedId {
    reason: &'static str,
}

/// An identifier qualified by the feed it was imported from.
///
/// Every entity in the schedule and in the realtime overlay is keyed by
/// one of these. Two ids are equal when both the feed and the local part
/// are equal.
///
/// # Examples
///
/// ```
/// use transit_realtime::domain::FeedScopedId;
///
/// let id = FeedScopedId::parse("RB:NSB:Quay:1").unwrap();
/// assert_eq!(id.feed_id(), "RB");
/// assert_eq!(id.id(), "NSB:Quay:1");
/// assert_eq!(id.to_string(), "RB:NSB:Quay:1");
///
/// // Both halves must be present
/// assert!(FeedScopedId::parse("RB").is_err());
/// assert!(FeedScopedId::parse(":1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedScopedId {
    feed_id: String,
    id: String,
}

impl FeedScopedId {
    /// Creates an id from its two parts.
    pub fn new(feed_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            feed_id: feed_id.into(),
            id: id.into(),
        }
    }

    /// Parses the `FEED:id` form. Only the first separator splits; the
    /// local part may itself contain colons.
    pub fn parse(s: &str) -> Result<Self, InvalidFeedScopedId> {
        let (feed_id, id) = s.split_once(SEPARATOR).ok_or(InvalidFeedScopedId {
            reason: "missing ':' separator",
        })?;

        if feed_id.is_empty() {
            return Err(InvalidFeedScopedId {
                reason: "feed id must not be empty",
            });
        }
        if id.is_empty() {
            return Err(InvalidFeedScopedId {
                reason: "local id must not be empty",
            });
        }

        Ok(Self::new(feed_id, id))
    }

    /// The feed this id belongs to.
    pub fn feed_id(&self) -> &str {
        &self.feed_id
    }

    /// The id within the feed.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for FeedScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.feed_id, SEPARATOR, self.id)
    }
}
