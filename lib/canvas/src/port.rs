//! Port system for canvas nodes.
//!
//! Ports are the connection points rendered on nodes. Compatibility is
//! kind-based: only an output port can drive an edge, and it can land on
//! an input port (data flow) or a tools port (tool attachment).

use agentflow_core::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a connection point on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// Receives data from an upstream node's output.
    Input,
    /// Receives tool attachments from tool nodes.
    Tools,
    /// Produces data for downstream inputs or tools ports.
    Output,
}

impl PortKind {
    /// Returns true if edges may originate from this kind.
    #[must_use]
    pub fn is_source(self) -> bool {
        matches!(self, Self::Output)
    }

    /// Returns true if edges may terminate at this kind.
    #[must_use]
    pub fn is_sink(self) -> bool {
        matches!(self, Self::Input | Self::Tools)
    }

    /// Checks whether an edge from `source` to `target` is kind-compatible.
    #[must_use]
    pub fn can_connect(source: Self, target: Self) -> bool {
        matches!((source, target), (Self::Output, Self::Input) | (Self::Output, Self::Tools))
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Tools => write!(f, "tools"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// A reference to a specific port on a specific node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// The node this port belongs to.
    pub node: NodeId,
    /// The kind of the port.
    pub kind: PortKind,
}

impl PortRef {
    /// Creates a reference to a node's output port.
    #[must_use]
    pub const fn output(node: NodeId) -> Self {
        Self {
            node,
            kind: PortKind::Output,
        }
    }

    /// Creates a reference to a node's input port.
    #[must_use]
    pub const fn input(node: NodeId) -> Self {
        Self {
            node,
            kind: PortKind::Input,
        }
    }

    /// Creates a reference to a node's tools port.
    #[must_use]
    pub const fn tools(node: NodeId) -> Self {
        Self {
            node,
            kind: PortKind::Tools,
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.kind)
    }
}
