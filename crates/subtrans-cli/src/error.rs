//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use std::io;
use std::path::PathBuf;
use subtrans_core::RepositoryError;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command arguments refer to things the repository does not have
    #[error("Invalid input: {}", problems.join("; "))]
    InvalidInput { problems: Vec<String> },

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from subtrans-core library
    #[error("{0}")]
    Core(#[from] subtrans_core::Error),

    /// Repository call failed outside of a translation run
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// No repository snapshot was given
    #[error("No repository configured. Pass --repository, set SUBTRANS_REPOSITORY or repository.path in the config file")]
    RepositoryNotConfigured,

    /// Repository snapshot does not exist
    #[error("Repository file not found: {}", path.display())]
    RepositoryNotFound { path: PathBuf },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput { .. } => 1,
            Self::Io(_) => 2,
            Self::Core(_) => 3,
            Self::Repository(_) => 4,
            Self::RepositoryNotConfigured => 5,
            Self::RepositoryNotFound { .. } => 6,
            Self::Config(_) => 7,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::RepositoryNotConfigured)
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failure_exits_with_one() {
        let err = Error::InvalidInput {
            problems: vec![
                "No location with id 999".to_string(),
                "No language with code xx-XX".to_string(),
            ],
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "Invalid input: No location with id 999; No language with code xx-XX"
        );
    }

    #[test]
    fn test_core_errors_keep_their_message() {
        let core = subtrans_core::Error::RootUnavailable {
            location_id: 2,
            language: "eng-GB".to_string(),
            source: RepositoryError::not_found("content", 50),
        };
        let err = Error::from(core);
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("2"));
    }

    #[test]
    fn test_format_error_without_color() {
        let err = Error::RepositoryNotConfigured;
        assert!(format_error(&err, false).starts_with("Error: No repository configured"));
        assert!(err.should_show_help());
    }
}
