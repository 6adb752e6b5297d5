//! Error types for canvas graph and drag operations.

use crate::port::PortKind;
use agentflow_core::{EdgeId, NodeId};
use std::fmt;

/// Errors from graph mutations that violate structural constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The referenced node does not exist in the graph.
    NodeNotFound {
        /// The missing node.
        node_id: NodeId,
    },
    /// The referenced edge does not exist in the graph.
    EdgeNotFound {
        /// The missing edge.
        edge_id: EdgeId,
    },
    /// The edge would connect a node to itself.
    SelfLoop {
        /// The node on both ends.
        node_id: NodeId,
    },
    /// The port kinds cannot be connected in this direction.
    IncompatiblePorts {
        /// The kind the edge originates from.
        source: PortKind,
        /// The kind the edge terminates at.
        target: PortKind,
    },
    /// An edge between these ports already exists.
    DuplicateEdge {
        /// The source node.
        source: NodeId,
        /// The target node.
        target: NodeId,
    },
    /// The edge would create a directed cycle.
    CycleDetected {
        /// The source node of the rejected edge.
        source: NodeId,
        /// The target node of the rejected edge.
        target: NodeId,
    },
    /// A snapshot could not be restored into a valid graph.
    CorruptSnapshot {
        /// Why the snapshot was rejected.
        reason: String,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => {
                write!(f, "node not found: {node_id}")
            }
            Self::EdgeNotFound { edge_id } => {
                write!(f, "edge not found: {edge_id}")
            }
            Self::SelfLoop { node_id } => {
                write!(f, "edge would connect node {node_id} to itself")
            }
            Self::IncompatiblePorts { source, target } => {
                write!(f, "cannot connect {source} port to {target} port")
            }
            Self::DuplicateEdge { source, target } => {
                write!(f, "edge from {source} to {target} already exists")
            }
            Self::CycleDetected { source, target } => {
                write!(f, "edge from {source} to {target} would create a cycle")
            }
            Self::CorruptSnapshot { reason } => {
                write!(f, "snapshot cannot be restored: {reason}")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Errors from the drag interaction state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    /// A drag session is already active.
    SessionActive,
    /// No drag session is active.
    NoSession,
    /// Committing the drag violated a graph constraint.
    Graph(GraphError),
}

impl fmt::Display for DragError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionActive => write!(f, "a drag session is already active"),
            Self::NoSession => write!(f, "no drag session is active"),
            Self::Graph(err) => write!(f, "drag commit failed: {err}"),
        }
    }
}

impl std::error::Error for DragError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for DragError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}
