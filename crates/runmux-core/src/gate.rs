//! FIFO serialization of async operations.
//!
//! A [`SerialGate`] guarantees that at most one submitted operation is in
//! flight at any instant, regardless of how many callers submit
//! concurrently. Operations execute in submission order; the full
//! asynchronous extent of one operation completes before the next begins.
//!
//! Hosts use a gate to serialize lifecycle operations on a backing
//! toolchain process (start/stop/restart cycles), where two overlapping
//! restarts would corrupt state.
//!
//! # Non-reentrancy
//!
//! An operation must not submit to the same gate it is running under: the
//! inner submission queues behind the outer one, which never completes. This
//! is a documented caller responsibility, not a runtime-detected error.
//!
//! # Cancellation
//!
//! None. Once submitted, an operation cannot be dequeued before its turn.
//! Callers needing timeouts race their own timer around the operation body.
//!
//! # Example
//!
//! ```ignore
//! let gate = SerialGate::new();
//! let value = gate.run(|| async { restart_server().await }).await?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

// =============================================================================
// SerialGate
// =============================================================================

/// Mutual exclusion for async operations with FIFO ordering.
///
/// Built on a fair async mutex: waiters acquire the turn strictly in the
/// order their `run` calls reached the queue. Failures (an operation
/// returning `Err` or panicking) release the turn and advance the queue; the
/// failure is observed only by that operation's own caller.
#[derive(Debug, Default)]
pub struct SerialGate {
    /// Ownership of "being allowed to run". The mutex queues waiters FIFO.
    turn: Mutex<()>,
    submitted: AtomicU64,
    completed: AtomicU64,
    waiting: AtomicU64,
}

impl SerialGate {
    /// Create a new gate with no queued operations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` once every previously submitted operation has fully
    /// completed. Returns the operation's own outcome.
    ///
    /// The operation is a no-argument closure producing a future; the
    /// closure is not invoked until the gate grants the turn, so
    /// side-effecting prologues are also serialized.
    pub async fn run<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.waiting.fetch_add(1, Ordering::Relaxed);
        let guard = self.turn.lock().await;
        self.waiting.fetch_sub(1, Ordering::Relaxed);

        let outcome = operation().await;

        self.completed.fetch_add(1, Ordering::Relaxed);
        drop(guard);
        outcome
    }

    /// Snapshot of gate counters.
    #[must_use]
    pub fn stats(&self) -> SerialGateStats {
        SerialGateStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            waiting: self.waiting.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// SerialGateStats (serializable)
// =============================================================================

/// Serializable statistics about a gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialGateStats {
    /// Operations ever submitted.
    pub submitted: u64,
    /// Operations that ran to completion (including ones that returned an
    /// application-level error).
    pub completed: u64,
    /// Operations currently queued waiting for their turn.
    pub waiting: u64,
}

// =============================================================================
// Tests
// =============================================================================
