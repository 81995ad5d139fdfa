//! Error types for the Subtrans core library
//!
//! Repository calls fail with [`RepositoryError`], which carries a coarse
//! [`ErrorKind`] so callers can decide per kind whether to skip a node,
//! report it, or abort. Crate-level operations (opening a snapshot,
//! collecting a subtree) fail with [`Error`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Classification of a repository failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The requested object (or translation) does not exist
    NotFound,
    /// The current user may not perform the operation
    PermissionDenied,
    /// The repository rejected the data (bad state, required field empty, ...)
    ValidationFailed,
    /// Anything else
    Unknown,
}

/// Error returned by the repository service traits
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Object not found
    #[error("Could not find '{object}' with identifier '{identifier}'")]
    NotFound {
        object: &'static str,
        identifier: String,
    },

    /// Current user lacks the permission
    #[error("User does not have access to '{action}' '{object}'")]
    PermissionDenied { action: String, object: String },

    /// Data or state rejected by the repository
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    /// Unclassified failure
    #[error("{message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl RepositoryError {
    pub fn not_found(object: &'static str, identifier: impl ToString) -> Self {
        Self::NotFound {
            object,
            identifier: identifier.to_string(),
        }
    }

    pub fn permission_denied(action: impl Into<String>, object: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
            object: object.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
            source: None,
        }
    }

    /// Coarse classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }
}

impl From<anyhow::Error> for RepositoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unknown {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Main error type for Subtrans operations
#[derive(Error, Debug)]
pub enum Error {
    /// A repository call failed where no local recovery applies
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The root of the subtree could not be loaded in the reference language
    #[error("Root location {location_id} is not available in '{language}': {source}")]
    RootUnavailable {
        location_id: u64,
        language: String,
        #[source]
        source: RepositoryError,
    },

    /// Snapshot file could not be read or written
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file is not a valid repository document
    #[error("Invalid repository snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Repository document is well-formed but inconsistent
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::PermissionDenied => write!(f, "permission_denied"),
            ErrorKind::ValidationFailed => write!(f, "validation_failed"),
            ErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_classification() {
        assert_eq!(
            RepositoryError::not_found("location", 42).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RepositoryError::permission_denied("edit", "content").kind(),
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            RepositoryError::validation("title is required").kind(),
            ErrorKind::ValidationFailed
        );
        assert_eq!(RepositoryError::unknown("boom").kind(), ErrorKind::Unknown);

        let from_anyhow: RepositoryError = anyhow::anyhow!("socket closed").into();
        assert_eq!(from_anyhow.kind(), ErrorKind::Unknown);
        assert_eq!(from_anyhow.to_string(), "socket closed");
    }

    #[test]
    fn test_error_display() {
        let err = RepositoryError::not_found("location", 42);
        assert_eq!(
            err.to_string(),
            "Could not find 'location' with identifier '42'"
        );

        let err = Error::RootUnavailable {
            location_id: 2,
            language: "eng-GB".to_string(),
            source: RepositoryError::not_found("content translation", "50/eng-GB"),
        };
        assert!(err.to_string().starts_with("Root location 2 is not available in 'eng-GB'"));
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
        assert_eq!(ErrorKind::ValidationFailed.to_string(), "validation_failed");
    }
}
