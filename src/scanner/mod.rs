//! Scanner Component
//!
//! The scan orchestration engine: a registry of live scans, a pipeline of
//! cancellable stages run on tokio tasks, and the orchestrator that starts,
//! reports on, cancels and retires them.
//!
//! ## Core Features
//!
//! - **ScanOrchestrator**: start, status and cancel for concurrent scans
//! - **Stage Pipeline**: ordered stages with cumulative progress checkpoints
//! - **Progress and ETA**: monotonic percentage, task counts, remaining time
//! - **Hierarchical Cancellation**: one child token per scan under the root
//! - **Collaborators**: storage port and event sink, both best effort

pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod instance;
pub(crate) mod orchestrator;
pub(crate) mod pipeline;
pub(crate) mod progress;
pub(crate) mod registry;
pub(crate) mod stage;
pub(crate) mod stages;
pub(crate) mod types;

pub mod api;
