//! SourceMarker: opaque tag identifying who submitted an operation batch.
//!
//! Markers are compared by value, so they survive a serialization boundary
//! unchanged. A generated marker displays as `input-sync:` followed by
//! 16 hex characters.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

const GENERATED_PREFIX: &str = "input-sync:";

/// Origin tag attached to every submitted batch.
///
/// # Examples
/// ```
/// use input_sync_core::SourceMarker;
///
/// let ours = SourceMarker::generate();
/// let theirs = SourceMarker::generate();
/// assert_ne!(ours, theirs);
///
/// let fixed = SourceMarker::from("ShareDBDOMInput");
/// assert_eq!(fixed.as_str(), "ShareDBDOMInput");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceMarker(String);

impl SourceMarker {
    /// Generate a new random marker, unique per engine instance.
    pub fn generate() -> Self {
        use rand::Rng;
        let id: u64 = rand::rng().random();
        Self(format!("{}{:016x}", GENERATED_PREFIX, id))
    }

    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this marker came from [`SourceMarker::generate`].
    pub fn is_generated(&self) -> bool {
        self.0
            .strip_prefix(GENERATED_PREFIX)
            .is_some_and(|hex| hex.len() == 16 && hex.chars().all(|c| c.is_ascii_hexdigit()))
    }
}

impl Display for SourceMarker {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceMarker {
    fn from(marker: &str) -> Self {
        Self(marker.to_string())
    }
}

impl From<String> for SourceMarker {
    fn from(marker: String) -> Self {
        Self(marker)
    }
}
