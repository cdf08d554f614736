//! Stable patch identifier.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, equality- and hash-comparable identifier for a patch within a
/// replicate. Created once when a patch is built; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeoKey(Uuid);

impl GeoKey {
    /// Generate a fresh, process-wide-unique key.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build a key from a previously generated id (e.g. one deserialized
    /// from a frozen snapshot, or from a test fixture).
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for GeoKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GeoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
