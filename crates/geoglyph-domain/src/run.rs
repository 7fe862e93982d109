//! Run identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of one pipeline run (UUIDv7)
///
/// Serialized as the canonical hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(u128);

impl RunId {
    /// Generate a new UUIDv7-based RunId
    ///
    /// # Examples
    ///
    /// ```
    /// use geoglyph_domain::RunId;
    ///
    /// let id = RunId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Parse a RunId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid run id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Milliseconds since the Unix epoch at which the run started
    pub fn timestamp(&self) -> u64 {
        // UUIDv7: top 48 bits are Unix millisecond timestamp
        (self.0 >> 80) as u64
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl TryFrom<String> for RunId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_string(&value)
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.to_string()
    }
}
