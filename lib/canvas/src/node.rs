//! Canvas node types.
//!
//! Nodes are the units placed on the canvas. Each node has:
//! - A unique ID within the flow
//! - A type (the palette key, e.g. "compliance" or "email-tool")
//! - A category (Agent or Tool)
//! - A position on the canvas
//! - Free-form JSON configuration edited in the config panel

use agentflow_core::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// A position on the canvas, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this position offset by the given deltas.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// The category of a canvas node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// An agent that performs work in the pipeline.
    Agent,
    /// A tool attached to an agent's tools port.
    Tool,
}

/// The palette type of a node.
///
/// Types are open-ended strings so the palette and the suggestion
/// compatibility table can be extended through configuration without
/// code changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeType(String);

impl NodeType {
    /// Creates a node type from a palette key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the palette key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A node placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node within the flow.
    pub id: NodeId,
    /// The palette type of this node.
    pub node_type: NodeType,
    /// The category of this node.
    pub category: NodeCategory,
    /// Human-readable label shown on the canvas.
    pub label: String,
    /// Position on the canvas.
    pub position: Position,
    /// Free-form configuration edited in the config panel.
    pub config: JsonValue,
}

impl Node {
    /// Creates a new node with an empty configuration.
    #[must_use]
    pub fn new(
        node_type: impl Into<NodeType>,
        category: NodeCategory,
        label: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            id: NodeId::new(),
            node_type: node_type.into(),
            category,
            label: label.into(),
            position,
            config: JsonValue::Object(serde_json::Map::new()),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: JsonValue) -> Self {
        self.config = config;
        self
    }
}

impl From<String> for NodeType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A palette entry: the template a new node is created from on drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// The palette type new nodes take.
    pub node_type: NodeType,
    /// The category new nodes take.
    pub category: NodeCategory,
    /// The default label for new nodes.
    pub label: String,
    /// The default configuration for new nodes.
    pub default_config: JsonValue,
}

impl NodeTemplate {
    /// Creates an agent template.
    #[must_use]
    pub fn agent(node_type: impl Into<NodeType>, label: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            category: NodeCategory::Agent,
            label: label.into(),
            default_config: JsonValue::Object(serde_json::Map::new()),
        }
    }

    /// Creates a tool template.
    #[must_use]
    pub fn tool(node_type: impl Into<NodeType>, label: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            category: NodeCategory::Tool,
            label: label.into(),
            default_config: JsonValue::Object(serde_json::Map::new()),
        }
    }

    /// Sets the default configuration.
    #[must_use]
    pub fn with_default_config(mut self, config: JsonValue) -> Self {
        self.default_config = config;
        self
    }

    /// Instantiates a fresh node from this template at the given position.
    #[must_use]
    pub fn instantiate(&self, position: Position) -> Node {
        Node {
            id: NodeId::new(),
            node_type: self.node_type.clone(),
            category: self.category,
            label: self.label.clone(),
            position,
            config: self.default_config.clone(),
        }
    }
}
