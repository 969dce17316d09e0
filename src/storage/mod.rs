//! Storage Component
//!
//! The storage port the scan engine hands results and progress to, with an
//! in-memory implementation and a JSON-file-per-scan implementation.

pub(crate) mod error;
pub(crate) mod json_dir;
pub(crate) mod memory;
pub(crate) mod traits;

pub mod api;
