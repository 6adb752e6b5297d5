//! Run status values and the execution event stream.

use agentflow_core::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-node status during a run.
///
/// Statuses only move forward: waiting, then running, then one of the
/// terminal states. [`NodeRunStatus::rank`] encodes that ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRunStatus {
    /// Not started yet.
    Waiting,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl NodeRunStatus {
    /// Position of this status in the forward-only progression.
    ///
    /// Both terminal states share a rank: once a node has finished, no
    /// further update applies, including flips between the terminals.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::Running => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Returns true if this status is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for NodeRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// An event from a running flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// A node's status changed.
    NodeStatus {
        /// The node the update is for.
        node_id: NodeId,
        /// The new status.
        status: NodeRunStatus,
        /// When the change happened.
        at: DateTime<Utc>,
    },
    /// The run's focus moved to a different node, or cleared.
    ActiveNode {
        /// The node now active, if any.
        node_id: Option<NodeId>,
        /// When the change happened.
        at: DateTime<Utc>,
    },
    /// The run started or stopped executing.
    Executing {
        /// Whether the run is executing.
        executing: bool,
        /// When the change happened.
        at: DateTime<Utc>,
    },
}

impl RunEvent {
    /// Returns the event timestamp.
    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::NodeStatus { at, .. } | Self::ActiveNode { at, .. } | Self::Executing { at, .. } => {
                *at
            }
        }
    }
}
