//! Notification shapes and observer adapters.
//!
//! The registry drives a single attached observer — the viewer surface
//! mirroring the currently selected run. Notifications come in three shapes:
//!
//! - **Replace**: the full contents of the selected run plus the label
//!   directory for every tracked run (sent on selection and on attach).
//! - **Append**: one incremental chunk for the selected run.
//! - **Relabel**: a label change for the selected run.
//!
//! Notifications cross a process/UI boundary in host applications, so the
//! shapes are serde-serializable with a `kind` tag.

use serde::{Deserialize, Serialize};

use crate::run_id::RunId;

// =============================================================================
// Notification shapes
// =============================================================================

/// One entry in the run label directory, oldest run first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLabelEntry {
    /// The run's id.
    pub run_id: RunId,
    /// The run's current display label.
    pub label: String,
}

/// A notification delivered to the attached observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunNotification {
    /// Replace the whole view: the selected run changed (or an observer
    /// attached). Carries the run's full accumulated contents and the label
    /// directory for every tracked run, oldest first.
    Replace {
        run_id: RunId,
        contents: String,
        labels: Vec<RunLabelEntry>,
    },
    /// Append one chunk to the view of the selected run.
    Append { run_id: RunId, chunk: String },
    /// The selected run's label changed.
    Relabel { run_id: RunId, label: String },
}

impl RunNotification {
    /// The run this notification concerns.
    #[must_use]
    pub fn run_id(&self) -> &RunId {
        match self {
            Self::Replace { run_id, .. }
            | Self::Append { run_id, .. }
            | Self::Relabel { run_id, .. } => run_id,
        }
    }
}

// =============================================================================
// Observer capability
// =============================================================================

/// The single consumer of run notifications.
///
/// At most one observer is attached to a registry at a time; attaching a new
/// one replaces the previous. Implementations must not call back into the
/// registry from `notify` — the registry delivers notifications while
/// holding its own state.
pub trait RunObserver: Send {
    /// Receive one notification.
    fn notify(&mut self, notification: RunNotification);
}

impl<F> RunObserver for F
where
    F: FnMut(RunNotification) + Send,
{
    fn notify(&mut self, notification: RunNotification) {
        self(notification);
    }
}

/// Observer adapter that forwards notifications into an unbounded channel.
///
/// Useful for async hosts that consume notifications from a task: the
/// registry side stays synchronous while the receiver awaits. A closed
/// receiver drops notifications silently — the viewer went away, which is
/// the same as being detached.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: tokio::sync::mpsc::UnboundedSender<RunNotification>,
}

impl ChannelObserver {
    /// Create an observer and the receiving half.
    #[must_use]
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<RunNotification>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Wrap an existing sender.
    #[must_use]
    pub fn from_sender(sender: tokio::sync::mpsc::UnboundedSender<RunNotification>) -> Self {
        Self { sender }
    }
}

impl RunObserver for ChannelObserver {
    fn notify(&mut self, notification: RunNotification) {
        if self.sender.send(notification).is_err() {
            tracing::debug!("notification dropped: observer channel closed");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
