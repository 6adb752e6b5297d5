//! Port for controlling a running flow.

use agentflow_core::RunId;
use async_trait::async_trait;
use std::fmt;

/// Errors from run control operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The runner refused the request.
    Rejected {
        /// Why the request was refused.
        message: String,
    },
    /// The runner could not be reached.
    Unreachable {
        /// The transport error.
        message: String,
    },
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { message } => write!(f, "run control rejected: {message}"),
            Self::Unreachable { message } => write!(f, "runner unreachable: {message}"),
        }
    }
}

impl std::error::Error for ControlError {}

/// Commands the overlay can send to a running flow.
#[async_trait]
pub trait ExecutionControl: Send + Sync {
    /// Pauses the run.
    async fn pause(&self, run_id: RunId) -> Result<(), ControlError>;

    /// Stops the run.
    async fn stop(&self, run_id: RunId) -> Result<(), ControlError>;
}
