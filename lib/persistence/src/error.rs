//! Error types for snapshot store operations.

use std::fmt;

/// Errors from saving or loading flow snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The remote store answered with a non-success status.
    Http {
        /// The HTTP status code.
        status: u16,
        /// Response detail, if any.
        message: String,
    },
    /// The remote store could not be reached.
    Network {
        /// The transport error.
        message: String,
    },
    /// The local database failed.
    Database {
        /// The database error.
        message: String,
    },
    /// A snapshot could not be serialized or deserialized.
    Serialization {
        /// The codec error.
        message: String,
    },
    /// The background save task panicked or was cancelled.
    TaskFailed {
        /// The join error.
        message: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { status, message } => {
                write!(f, "save rejected with HTTP {status}: {message}")
            }
            Self::Network { message } => write!(f, "store unreachable: {message}"),
            Self::Database { message } => write!(f, "local database error: {message}"),
            Self::Serialization { message } => write!(f, "snapshot codec error: {message}"),
            Self::TaskFailed { message } => write!(f, "save task failed: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => Self::Network {
                message: err.to_string(),
            },
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
