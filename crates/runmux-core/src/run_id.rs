//! Run identity and label generation.
//!
//! Every run is tracked under an opaque [`RunId`], unique for the lifetime
//! of the process. Ids combine a monotonic counter with a millisecond
//! timestamp for cheap, collision-resistant generation without a UUID
//! dependency. Human-readable labels ("Run: 1", "Run: 2", ...) come from a
//! separate monotonic sequence so labels stay short while ids stay unique.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// =============================================================================
// RunId
// =============================================================================

/// Unique identifier for a run.
///
/// Opaque to callers; the registry treats ids purely as keys. External
/// systems may supply their own ids — anything stringly unique works.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    /// Wrap an externally supplied id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// RunIdGenerator
// =============================================================================

/// Generator for process-unique run ids.
///
/// Ids look like `run-<millis hex>-<counter hex>`. The counter alone
/// guarantees uniqueness within the process; the timestamp makes ids from
/// different processes unlikely to collide in shared logs.
#[derive(Debug, Default)]
pub struct RunIdGenerator {
    counter: AtomicU64,
}

impl RunIdGenerator {
    /// Create a generator starting at counter 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next id.
    pub fn next_id(&self) -> RunId {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        let ts_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        RunId(format!("run-{ts_ms:x}-{counter:04x}"))
    }
}

// =============================================================================
// RunLabeler
// =============================================================================

/// Suffix appended to a run's label when its stream ends.
pub const FINISHED_SUFFIX: &str = " (finished)";

/// Generator for human-readable run labels ("Run: 1", "Run: 2", ...).
#[derive(Debug, Default)]
pub struct RunLabeler {
    counter: AtomicU64,
}

impl RunLabeler {
    /// Create a labeler starting at "Run: 1".
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next label.
    pub fn next_label(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("Run: {n}")
    }
}

/// A run label with the finished suffix appended.
#[must_use]
pub fn finished_label(label: &str) -> String {
    format!("{label}{FINISHED_SUFFIX}")
}

// =============================================================================
// Tests
// =============================================================================
