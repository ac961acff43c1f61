//! runmux-core: Core library for runmux
//!
//! This crate provides the core functionality for `rmx`, a collector for the
//! live output of concurrently executing task runs. Each run produces a
//! stream of text over time; the registry retains a bounded history of runs
//! and mirrors one selected run to a single attached viewer.
//!
//! # Architecture
//!
//! ```text
//! Task processes → Intake listener (TCP) → Run registry (bounded FIFO)
//!                                                 ↓
//!                                          Observer (viewer)
//! ```
//!
//! # Modules
//!
//! - `registry`: Bounded multi-run output tracker with a single observer slot
//! - `observer`: Notification shapes and observer adapters
//! - `intake`: Localhost listener that turns connections into runs
//! - `gate`: FIFO serialization of async operations
//! - `run_id`: Run identity and label generation
//! - `config`: Configuration management
//! - `logging`: Structured logging setup
//! - `error`: Crate error taxonomy
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod gate;
pub mod intake;
pub mod logging;
pub mod observer;
pub mod registry;
pub mod run_id;

pub use error::{Error, Result};
pub use observer::{RunNotification, RunObserver};
pub use registry::RunRegistry;
pub use run_id::RunId;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
