// Imports
use serde::{Deserialize, Serialize};

/// Wall clock milliseconds since the Unix epoch.
///
/// Orders edits of the same annotation across sessions, the newer edit wins.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// A timestamp from milliseconds since the Unix epoch.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// The current wall clock time.
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    /// Milliseconds since the Unix epoch.
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// The timestamp formatted as RFC 3339 string, or the raw milliseconds if out of range.
    pub fn to_rfc3339(&self) -> String {
        chrono::DateTime::<chrono::Utc>::from_timestamp_millis(self.0)
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            .unwrap_or_else(|| format!("{}ms", self.0))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

/// Hands out local timestamps.
///
/// Stamps are strictly increasing, even when the wall clock stalls or goes backwards, and always newer than
/// every remote stamp observed so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stamper {
    last: Timestamp,
}

impl Stamper {
    /// The next local timestamp.
    pub fn stamp(&mut self) -> Timestamp {
        self.stamp_at(Timestamp::now())
    }

    /// The next local timestamp, given the current wall clock time.
    pub fn stamp_at(&mut self, now: Timestamp) -> Timestamp {
        let next = if now > self.last {
            now
        } else {
            Timestamp(self.last.0.saturating_add(1))
        };
        self.last = next;
        next
    }

    /// Advances past a timestamp that was produced elsewhere.
    pub fn observe(&mut self, timestamp: Timestamp) {
        self.last = self.last.max(timestamp);
    }

    /// The latest stamp handed out or observed.
    pub fn last(&self) -> Timestamp {
        self.last
    }
}
