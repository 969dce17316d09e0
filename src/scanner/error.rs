//! Scanner Error Types

use thiserror::Error;

/// Errors surfaced by the orchestrator's public operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    /// Target URL could not be parsed or is not an http(s) URL
    #[error("Invalid target '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    /// Unknown or already retired scan identifier
    #[error("not found")]
    NotFound { scan_id: String },

    /// Identifier collision in the registry
    #[error("Scan '{scan_id}' is already registered")]
    AlreadyRegistered { scan_id: String },

    /// A lock was poisoned by a panicking holder
    #[error("Synchronisation error: {message}")]
    Synchronisation { message: String },

    /// The orchestrator was used outside a tokio runtime
    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

impl crate::core::error_handling::ContextualError for ScanError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ScanError::InvalidTarget { .. } | ScanError::NotFound { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ScanError::InvalidTarget { reason, .. } => Some(reason),
            ScanError::NotFound { .. } => Some("not found"),
            _ => None,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Failures inside a single stage; recovered by the pipeline as warnings
#[derive(Debug, Error)]
pub enum StageError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("DNS lookup for {host} failed: {message}")]
    Dns { host: String, message: String },

    #[error("{stage} interrupted by cancellation")]
    Interrupted { stage: &'static str },

    #[error("path '{path}' is excluded by configuration")]
    Excluded { path: String },

    #[error("{stage} skipped: no response was captured")]
    NoResponse { stage: &'static str },

    #[error("{0}")]
    Other(String),
}
