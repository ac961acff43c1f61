//! Bounded multi-run output tracker.
//!
//! A [`RunRegistry`] accepts output from any number of concurrently
//! executing runs, retains only the most recent runs (FIFO eviction beyond a
//! fixed capacity), and drives a single observer's view of the currently
//! selected run.
//!
//! The registry is a plain synchronous state machine: no internal locking,
//! no I/O, no suspension points. Hosts that share it across async tasks
//! wrap it in `Arc<Mutex<_>>` (see [`crate::intake`]).
//!
//! # Degradation, not errors
//!
//! Output can race with eviction, so an unknown run id is never an error:
//! appends and relabels for unknown ids are silent no-ops, and selecting an
//! unknown id shows an empty buffer. Eviction of the currently selected run
//! is likewise silent — later appends to it no-op and the observer learns
//! nothing until the next selection.

use std::collections::{HashMap, VecDeque};

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_MAX_RUNS;
use crate::observer::{RunLabelEntry, RunNotification, RunObserver};
use crate::run_id::RunId;

// =============================================================================
// RunContents
// =============================================================================

/// Accumulated state of one tracked run.
#[derive(Debug)]
struct RunContents {
    label: String,
    /// Appended fragments in arrival order. Fragments carry no framing
    /// guarantee; the full view is their concatenation.
    chunks: Vec<String>,
    bytes: u64,
    started_at: u64,
    started_at_human: String,
}

impl RunContents {
    fn new(label: String) -> Self {
        let now = chrono::Utc::now();
        Self {
            label,
            chunks: Vec::new(),
            bytes: 0,
            started_at: now.timestamp() as u64,
            started_at_human: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    fn full_contents(&self) -> String {
        self.chunks.concat()
    }

    fn push(&mut self, chunk: &str) {
        self.bytes += chunk.len() as u64;
        self.chunks.push(chunk.to_string());
    }
}

// =============================================================================
// RunRegistry
// =============================================================================

/// Bounded registry of run output streams with a single observer slot.
///
/// See the module docs for the behavioral contract. Capacity defaults to
/// [`DEFAULT_MAX_RUNS`]; the oldest run is evicted beyond it.
pub struct RunRegistry {
    capacity: usize,
    /// Tracked run ids in registration order (oldest first).
    order: VecDeque<RunId>,
    runs: HashMap<RunId, RunContents>,
    current: Option<RunId>,
    observer: Option<Box<dyn RunObserver>>,
    total_runs: u64,
    total_evicted: u64,
    total_chunks: u64,
    dropped_chunks: u64,
}

impl RunRegistry {
    /// Create a registry with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_RUNS)
    }

    /// Create a registry with an explicit capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            capacity,
            order: VecDeque::new(),
            runs: HashMap::new(),
            current: None,
            observer: None,
            total_runs: 0,
            total_evicted: 0,
            total_chunks: 0,
            dropped_chunks: 0,
        }
    }

    /// Register a new run with an empty buffer.
    ///
    /// The run joins the back of the history; the oldest runs are evicted
    /// until the history is back at capacity. Registration does not change
    /// the current selection — call [`Self::set_current_run`] for that.
    ///
    /// Re-registering a tracked id resets its buffer and label in place
    /// (ids are unique per process, so this only happens with misbehaving
    /// external id sources).
    pub fn begin_run(&mut self, run_id: RunId, label: impl Into<String>) {
        let label = label.into();
        self.total_runs += 1;
        if self.runs.contains_key(&run_id) {
            debug!(run_id = %run_id, "Run re-registered; resetting buffer");
            self.runs.insert(run_id.clone(), RunContents::new(label));
            return;
        }

        self.order.push_back(run_id.clone());
        self.runs.insert(run_id, RunContents::new(label));

        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.runs.remove(&evicted);
                self.total_evicted += 1;
                // The evicted run may be the selected one. Selection is left
                // untouched and the observer is not told; appends to the
                // evicted id silently no-op from here on.
                debug!(run_id = %evicted, "Evicted oldest run beyond capacity");
            }
        }
    }

    /// Append a text fragment to a run's buffer.
    ///
    /// Unknown ids (never registered, or already evicted) are silent no-ops.
    /// If the run is currently selected and an observer is attached, the
    /// observer receives an incremental append carrying only `chunk`.
    pub fn append_to_run(&mut self, run_id: &RunId, chunk: &str) {
        let Some(contents) = self.runs.get_mut(run_id) else {
            self.dropped_chunks += 1;
            return;
        };
        contents.push(chunk);
        self.total_chunks += 1;

        if self.current.as_ref() == Some(run_id) {
            let notification = RunNotification::Append {
                run_id: run_id.clone(),
                chunk: chunk.to_string(),
            };
            self.notify(notification);
        }
    }

    /// Select which run the observer's view mirrors.
    ///
    /// The attached observer receives a full replacement: the selected
    /// run's complete contents plus the label directory of every tracked
    /// run, oldest first. Selecting an unknown id is permitted and yields
    /// an empty-content replacement.
    pub fn set_current_run(&mut self, run_id: &RunId) {
        self.current = Some(run_id.clone());
        if self.observer.is_some() {
            let notification = self.replace_notification(run_id);
            self.notify(notification);
        }
    }

    /// Update a run's display label.
    ///
    /// Unknown ids are silent no-ops. The observer is notified only when
    /// the relabeled run is the currently selected one; other labels
    /// surface on the next full replacement.
    pub fn set_label(&mut self, run_id: &RunId, new_label: impl Into<String>) {
        let Some(contents) = self.runs.get_mut(run_id) else {
            return;
        };
        let new_label = new_label.into();
        contents.label = new_label.clone();

        if self.current.as_ref() == Some(run_id) {
            let notification = RunNotification::Relabel {
                run_id: run_id.clone(),
                label: new_label,
            };
            self.notify(notification);
        }
    }

    /// Attach an observer, replacing any previous one; `None` detaches.
    ///
    /// On attach, if a run is currently selected, the new observer is
    /// immediately caught up with the same full replacement it would get
    /// from [`Self::set_current_run`] on the already selected id.
    pub fn attach_observer(&mut self, observer: Option<Box<dyn RunObserver>>) {
        self.observer = observer;
        if self.observer.is_some() {
            if let Some(current) = self.current.clone() {
                let notification = self.replace_notification(&current);
                self.notify(notification);
            }
        }
    }

    // -- Accessors --

    /// Full contents of a run, or `None` if the id is not tracked.
    #[must_use]
    pub fn contents(&self, run_id: &RunId) -> Option<String> {
        self.runs.get(run_id).map(RunContents::full_contents)
    }

    /// Label directory for every tracked run, oldest first.
    #[must_use]
    pub fn labels(&self) -> Vec<RunLabelEntry> {
        self.order
            .iter()
            .filter_map(|id| {
                self.runs.get(id).map(|c| RunLabelEntry {
                    run_id: id.clone(),
                    label: c.label.clone(),
                })
            })
            .collect()
    }

    /// The currently selected run id, if any.
    #[must_use]
    pub fn current_run(&self) -> Option<&RunId> {
        self.current.as_ref()
    }

    /// Whether an id is tracked (registered and not evicted).
    #[must_use]
    pub fn contains(&self, run_id: &RunId) -> bool {
        self.runs.contains_key(run_id)
    }

    /// Number of tracked runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no runs are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of retained runs.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Summaries of every tracked run, oldest first.
    #[must_use]
    pub fn summaries(&self) -> Vec<RunSummary> {
        self.order
            .iter()
            .filter_map(|id| {
                self.runs.get(id).map(|c| RunSummary {
                    run_id: id.clone(),
                    label: c.label.clone(),
                    bytes: c.bytes,
                    chunks: c.chunks.len() as u64,
                    started_at: c.started_at,
                    started_at_human: c.started_at_human.clone(),
                })
            })
            .collect()
    }

    /// Snapshot of registry counters.
    #[must_use]
    pub fn stats(&self) -> RunRegistryStats {
        RunRegistryStats {
            capacity: self.capacity,
            tracked: self.order.len(),
            total_runs: self.total_runs,
            total_evicted: self.total_evicted,
            total_chunks: self.total_chunks,
            dropped_chunks: self.dropped_chunks,
        }
    }

    // -- Internals --

    fn replace_notification(&self, run_id: &RunId) -> RunNotification {
        RunNotification::Replace {
            run_id: run_id.clone(),
            contents: self.contents(run_id).unwrap_or_default(),
            labels: self.labels(),
        }
    }

    fn notify(&mut self, notification: RunNotification) {
        if let Some(observer) = self.observer.as_mut() {
            observer.notify(notification);
        }
    }
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RunRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunRegistry")
            .field("capacity", &self.capacity)
            .field("tracked", &self.order.len())
            .field("current", &self.current)
            .field("observer_attached", &self.observer.is_some())
            .finish()
    }
}

// =============================================================================
// RunSummary / RunRegistryStats (serializable)
// =============================================================================

/// Serializable summary of one tracked run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// The run's id.
    pub run_id: RunId,
    /// Current display label.
    pub label: String,
    /// Total bytes appended.
    pub bytes: u64,
    /// Number of appended fragments.
    pub chunks: u64,
    /// Unix timestamp when the run was registered.
    pub started_at: u64,
    /// Human-readable registration time.
    pub started_at_human: String,
}

/// Serializable statistics about a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRegistryStats {
    /// Maximum number of retained runs.
    pub capacity: usize,
    /// Currently tracked runs.
    pub tracked: usize,
    /// Runs ever registered.
    pub total_runs: u64,
    /// Runs evicted beyond capacity.
    pub total_evicted: u64,
    /// Fragments accepted into tracked runs.
    pub total_chunks: u64,
    /// Fragments dropped because their run id was unknown.
    pub dropped_chunks: u64,
}

// =============================================================================
// Tests
// =============================================================================
