//! Flow canvas state engine for the agentflow pipeline composer.
//!
//! This crate provides the graph model behind the visual canvas, including:
//!
//! - **Graph Model**: A versioned directed acyclic graph using petgraph,
//!   with typed ports and synchronous constraint validation
//! - **Node Types**: Agent and tool nodes with free-form JSON configuration
//! - **Port System**: Input, tools, and output connection points with
//!   kind-based compatibility rules
//! - **Drag Controller**: An explicit state machine for palette and
//!   node drags with a single authoritative commit point
//! - **Snapshots**: Serializable graph snapshots consumed by the
//!   persistence layer

pub mod drag;
pub mod error;
pub mod graph;
pub mod node;
pub mod port;

pub use drag::{DragController, DragPayload, DropOutcome, DropTarget};
pub use error::{DragError, GraphError};
pub use graph::{Connection, FlowGraph, FlowSnapshot};
pub use node::{Node, NodeCategory, NodeTemplate, NodeType, Position};
pub use port::{PortKind, PortRef};
