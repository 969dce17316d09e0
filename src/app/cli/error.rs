//! Configuration error types

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::error_handling::ContextualError;

/// Problems with the configuration file or its values. All of them are
/// fixable by the user, so each carries the line to show them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{message}")]
    NotFound { path: PathBuf, message: String },

    #[error("{message}")]
    Read {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Parse { path: PathBuf, message: String },

    #[error("{message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn not_found(path: &Path) -> Self {
        ConfigError::NotFound {
            path: path.to_path_buf(),
            message: format!(
                "The specified configuration file does not exist: {}",
                path.display()
            ),
        }
    }

    pub fn read(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Read {
            path: path.to_path_buf(),
            message: format!(
                "Error reading configuration file {}: {}",
                path.display(),
                source
            ),
            source,
        }
    }

    pub fn parse(path: &Path, error: &toml::de::Error) -> Self {
        ConfigError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "Error parsing configuration file {}: {}",
                path.display(),
                error.message()
            ),
        }
    }

    pub fn invalid(key: &str, reason: impl std::fmt::Display) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("Invalid value for '{}': {}", key, reason),
        }
    }

    fn message(&self) -> &str {
        match self {
            ConfigError::NotFound { message, .. }
            | ConfigError::Read { message, .. }
            | ConfigError::Parse { message, .. }
            | ConfigError::InvalidValue { message, .. } => message,
        }
    }
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(self.message())
    }
}
