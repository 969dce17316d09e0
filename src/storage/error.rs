//! Storage Error Types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode or decode scan '{scan_id}': {source}")]
    Serialization {
        scan_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Scan '{scan_id}' has no stored result")]
    NotFound { scan_id: String },

    #[error("Synchronisation error: {message}")]
    Synchronisation { message: String },

    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },
}

impl crate::core::error_handling::ContextualError for StorageError {
    fn is_user_actionable(&self) -> bool {
        false // Persistence failures are system-level
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
