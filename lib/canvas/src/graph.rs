//! The versioned flow graph.
//!
//! [`FlowGraph`] owns the canvas document: a directed acyclic graph of
//! nodes connected port-to-port. Every accepted mutation increments the
//! graph version, which downstream layers use for change detection and
//! save stamping. All constraint checks are synchronous and happen
//! before any mutation is applied, so a rejected operation leaves the
//! graph exactly as it was.

use crate::error::GraphError;
use crate::node::{Node, NodeType, Position};
use crate::port::{PortKind, PortRef};
use agentflow_core::{EdgeId, NodeId};
use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};

/// A directed connection between two ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique identifier for this connection.
    pub id: EdgeId,
    /// The port the connection originates from.
    pub source: PortRef,
    /// The port the connection terminates at.
    pub target: PortRef,
}

/// A serializable snapshot of the full graph state.
///
/// Snapshots are what the persistence layer saves and restores. They
/// carry the version they were taken at so saved-state stamps line up
/// with the live graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSnapshot {
    /// All nodes in the graph.
    pub nodes: Vec<Node>,
    /// All connections in the graph.
    pub edges: Vec<Connection>,
    /// The graph version this snapshot was taken at.
    pub version: u64,
}

/// The canvas graph: nodes, typed connections, and a mutation version.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    graph: DiGraph<Node, Connection>,
    node_indices: HashMap<NodeId, NodeIndex>,
    edge_indices: HashMap<EdgeId, EdgeIndex>,
    version: u64,
}

impl FlowGraph {
    /// Creates an empty graph at version 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current graph version.
    ///
    /// The version starts at 0 and increments once per accepted mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of connections in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if the graph contains the given node.
    #[must_use]
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.node_indices.contains_key(&node_id)
    }

    /// Looks up a node by ID.
    #[must_use]
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.node_indices.get(&node_id).map(|idx| &self.graph[*idx])
    }

    /// Iterates over all nodes in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Iterates over all connections in the graph.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.graph.edge_weights()
    }

    /// Returns the set of node IDs currently in the graph.
    #[must_use]
    pub fn node_ids(&self) -> HashSet<NodeId> {
        self.node_indices.keys().copied().collect()
    }

    /// Returns the set of node types currently present in the graph.
    #[must_use]
    pub fn node_types_present(&self) -> HashSet<NodeType> {
        self.graph
            .node_weights()
            .map(|node| node.node_type.clone())
            .collect()
    }

    /// Returns the number of connections terminating at the given port.
    #[must_use]
    pub fn port_occupancy(&self, port: PortRef) -> usize {
        let Some(idx) = self.node_indices.get(&port.node) else {
            return 0;
        };
        self.graph
            .edges_directed(*idx, Direction::Incoming)
            .filter(|edge| edge.weight().target.kind == port.kind)
            .count()
    }

    /// Adds a node to the graph and returns its ID.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let node_id = node.id;
        let idx = self.graph.add_node(node);
        self.node_indices.insert(node_id, idx);
        self.version += 1;
        node_id
    }

    /// Removes a node and all connections touching it.
    ///
    /// The cascade counts as a single mutation: the version increments
    /// once no matter how many connections were removed with the node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node, GraphError> {
        let idx = *self
            .node_indices
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;

        // remove_node swaps indices, so petgraph invalidates our lookup
        // maps. Rebuild both after the removal.
        let node = self
            .graph
            .remove_node(idx)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        self.rebuild_indices();
        self.version += 1;
        Ok(node)
    }

    /// Connects two ports, returning the new connection's ID.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] if either node is missing, the edge
    /// would be a self-loop, the port kinds are incompatible, an edge
    /// between these ports already exists, or the edge would create a
    /// directed cycle. A rejected edge leaves the graph unchanged.
    pub fn add_edge(&mut self, source: PortRef, target: PortRef) -> Result<EdgeId, GraphError> {
        let (source_idx, target_idx) = self.validate_edge(source, target)?;

        let connection = Connection {
            id: EdgeId::new(),
            source,
            target,
        };
        let edge_id = connection.id;
        let idx = self.graph.add_edge(source_idx, target_idx, connection);
        self.edge_indices.insert(edge_id, idx);
        self.version += 1;
        Ok(edge_id)
    }

    /// Removes a connection by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeNotFound`] if the connection does not
    /// exist.
    pub fn remove_edge(&mut self, edge_id: EdgeId) -> Result<Connection, GraphError> {
        let idx = *self
            .edge_indices
            .get(&edge_id)
            .ok_or(GraphError::EdgeNotFound { edge_id })?;

        let connection = self
            .graph
            .remove_edge(idx)
            .ok_or(GraphError::EdgeNotFound { edge_id })?;
        self.rebuild_indices();
        self.version += 1;
        Ok(connection)
    }

    /// Adds a node and connects it to an existing port as one atomic
    /// mutation.
    ///
    /// This backs palette drops onto a port: the node only enters the
    /// graph if the connection is also legal. The edge direction follows
    /// the anchor's kind: dropping onto a sink port connects the new
    /// node's output into it, dropping onto an output port connects it
    /// to the new node's input.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] if the connection would be rejected; in
    /// that case the node is not added and the version does not change.
    pub fn add_node_with_edge(
        &mut self,
        node: Node,
        anchor: PortRef,
    ) -> Result<(NodeId, EdgeId), GraphError> {
        let anchor_idx = *self
            .node_indices
            .get(&anchor.node)
            .ok_or(GraphError::NodeNotFound { node_id: anchor.node })?;

        let (source, target) = if anchor.kind.is_sink() {
            (PortRef::output(node.id), anchor)
        } else {
            (anchor, PortRef::input(node.id))
        };

        if !PortKind::can_connect(source.kind, target.kind) {
            return Err(GraphError::IncompatiblePorts {
                source: source.kind,
                target: target.kind,
            });
        }

        // The new node has no other connections, so the edge cannot
        // form a cycle or duplicate an existing one. Validation beyond
        // the anchor lookup and kind check is unnecessary.
        let node_id = node.id;
        let node_idx = self.graph.add_node(node);
        self.node_indices.insert(node_id, node_idx);
        self.version += 1;

        let (source_idx, target_idx) = if anchor.kind.is_sink() {
            (node_idx, anchor_idx)
        } else {
            (anchor_idx, node_idx)
        };
        let connection = Connection {
            id: EdgeId::new(),
            source,
            target,
        };
        let edge_id = connection.id;
        let edge_idx = self.graph.add_edge(source_idx, target_idx, connection);
        self.edge_indices.insert(edge_id, edge_idx);
        self.version += 1;

        Ok((node_id, edge_id))
    }

    /// Moves a node to a new canvas position.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn move_node(&mut self, node_id: NodeId, position: Position) -> Result<(), GraphError> {
        let idx = *self
            .node_indices
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        self.graph[idx].position = position;
        self.version += 1;
        Ok(())
    }

    /// Replaces a node's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn update_config(&mut self, node_id: NodeId, config: JsonValue) -> Result<(), GraphError> {
        let idx = *self
            .node_indices
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        self.graph[idx].config = config;
        self.version += 1;
        Ok(())
    }

    /// Renames a node's canvas label.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn rename_node(
        &mut self,
        node_id: NodeId,
        label: impl Into<String>,
    ) -> Result<(), GraphError> {
        let idx = *self
            .node_indices
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        self.graph[idx].label = label.into();
        self.version += 1;
        Ok(())
    }

    /// Takes a serializable snapshot of the current graph state.
    #[must_use]
    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            nodes: self.graph.node_weights().cloned().collect(),
            edges: self.graph.edge_weights().cloned().collect(),
            version: self.version,
        }
    }

    /// Restores a graph from a snapshot, re-validating every connection.
    ///
    /// The restored graph keeps the snapshot's version so change
    /// detection against saved state stays consistent.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CorruptSnapshot`] if the snapshot contains
    /// dangling connections, incompatible port kinds, or a cycle.
    pub fn restore(snapshot: &FlowSnapshot) -> Result<Self, GraphError> {
        let mut restored = Self::new();
        for node in &snapshot.nodes {
            let node_id = node.id;
            if restored.node_indices.contains_key(&node_id) {
                return Err(GraphError::CorruptSnapshot {
                    reason: format!("duplicate node {node_id}"),
                });
            }
            let idx = restored.graph.add_node(node.clone());
            restored.node_indices.insert(node_id, idx);
        }

        for connection in &snapshot.edges {
            let (source_idx, target_idx) = restored
                .validate_edge(connection.source, connection.target)
                .map_err(|err| GraphError::CorruptSnapshot {
                    reason: err.to_string(),
                })?;
            let idx = restored
                .graph
                .add_edge(source_idx, target_idx, connection.clone());
            restored.edge_indices.insert(connection.id, idx);
        }

        restored.version = snapshot.version;
        Ok(restored)
    }

    /// Validates an edge before insertion, returning the endpoint
    /// indices on success.
    fn validate_edge(
        &self,
        source: PortRef,
        target: PortRef,
    ) -> Result<(NodeIndex, NodeIndex), GraphError> {
        let source_idx = *self
            .node_indices
            .get(&source.node)
            .ok_or(GraphError::NodeNotFound { node_id: source.node })?;
        let target_idx = *self
            .node_indices
            .get(&target.node)
            .ok_or(GraphError::NodeNotFound { node_id: target.node })?;

        if source.node == target.node {
            return Err(GraphError::SelfLoop { node_id: source.node });
        }
        if !PortKind::can_connect(source.kind, target.kind) {
            return Err(GraphError::IncompatiblePorts {
                source: source.kind,
                target: target.kind,
            });
        }

        let duplicate = self
            .graph
            .edges_connecting(source_idx, target_idx)
            .any(|edge| edge.weight().source == source && edge.weight().target == target);
        if duplicate {
            return Err(GraphError::DuplicateEdge {
                source: source.node,
                target: target.node,
            });
        }

        // A path from the target back to the source means the new edge
        // would close a cycle.
        if has_path_connecting(&self.graph, target_idx, source_idx, None) {
            return Err(GraphError::CycleDetected {
                source: source.node,
                target: target.node,
            });
        }

        Ok((source_idx, target_idx))
    }

    fn rebuild_indices(&mut self) {
        self.node_indices = self
            .graph
            .node_indices()
            .map(|idx| (self.graph[idx].id, idx))
            .collect();
        self.edge_indices = self
            .graph
            .edge_indices()
            .map(|idx| (self.graph[idx].id, idx))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeCategory;

    fn agent(node_type: &str) -> Node {
        Node::new(
            node_type,
            NodeCategory::Agent,
            node_type.to_owned(),
            Position::default(),
        )
    }

    fn tool(node_type: &str) -> Node {
        Node::new(
            node_type,
            NodeCategory::Tool,
            node_type.to_owned(),
            Position::default(),
        )
    }

    #[test]
    fn empty_graph_starts_at_version_zero() {
        let graph = FlowGraph::new();
        assert_eq!(graph.version(), 0);
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn reverse_edge_rejected_as_cycle() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("compliance"));
        let b = graph.add_node(agent("recruitment"));

        graph
            .add_edge(PortRef::output(a), PortRef::input(b))
            .expect("forward edge should be accepted");
        assert_eq!(graph.version(), 3);

        let err = graph
            .add_edge(PortRef::output(b), PortRef::input(a))
            .expect_err("reverse edge should be rejected");
        assert_eq!(err, GraphError::CycleDetected { source: b, target: a });
        assert_eq!(graph.version(), 3);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn transitive_cycle_rejected() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));
        let b = graph.add_node(agent("screening"));
        let c = graph.add_node(agent("interview"));

        graph
            .add_edge(PortRef::output(a), PortRef::input(b))
            .expect("a -> b");
        graph
            .add_edge(PortRef::output(b), PortRef::input(c))
            .expect("b -> c");

        let err = graph
            .add_edge(PortRef::output(c), PortRef::input(a))
            .expect_err("c -> a closes a cycle");
        assert!(matches!(err, GraphError::CycleDetected { .. }));
    }

    #[test]
    fn self_loop_rejected() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));

        let err = graph
            .add_edge(PortRef::output(a), PortRef::input(a))
            .expect_err("self loop");
        assert_eq!(err, GraphError::SelfLoop { node_id: a });
    }

    #[test]
    fn sink_cannot_drive_edge() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));
        let b = graph.add_node(agent("screening"));

        let err = graph
            .add_edge(PortRef::input(a), PortRef::output(b))
            .expect_err("input is not a source");
        assert!(matches!(err, GraphError::IncompatiblePorts { .. }));
    }

    #[test]
    fn tool_attaches_to_tools_port() {
        let mut graph = FlowGraph::new();
        let agent_id = graph.add_node(agent("sourcing"));
        let tool_id = graph.add_node(tool("email-tool"));

        graph
            .add_edge(PortRef::output(tool_id), PortRef::tools(agent_id))
            .expect("tool output to tools port");
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn duplicate_edge_rejected() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));
        let b = graph.add_node(agent("screening"));

        graph
            .add_edge(PortRef::output(a), PortRef::input(b))
            .expect("first edge");
        let err = graph
            .add_edge(PortRef::output(a), PortRef::input(b))
            .expect_err("duplicate");
        assert_eq!(err, GraphError::DuplicateEdge { source: a, target: b });
    }

    #[test]
    fn remove_node_cascades_connections() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));
        let b = graph.add_node(agent("screening"));
        let c = graph.add_node(agent("interview"));
        graph
            .add_edge(PortRef::output(a), PortRef::input(b))
            .expect("a -> b");
        graph
            .add_edge(PortRef::output(b), PortRef::input(c))
            .expect("b -> c");
        let version_before = graph.version();

        let removed = graph.remove_node(b).expect("remove");
        assert_eq!(removed.id, b);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        // Cascade is one mutation.
        assert_eq!(graph.version(), version_before + 1);
    }

    #[test]
    fn lookups_survive_node_removal() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));
        let b = graph.add_node(agent("screening"));
        let c = graph.add_node(agent("interview"));

        graph.remove_node(a).expect("remove first");

        // Index maps must be rebuilt after petgraph's swap removal.
        assert!(graph.contains_node(b));
        assert!(graph.contains_node(c));
        assert_eq!(graph.node(c).expect("c present").node_type.as_str(), "interview");
        graph
            .add_edge(PortRef::output(b), PortRef::input(c))
            .expect("edge between survivors");
    }

    #[test]
    fn remove_edge_by_id() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));
        let b = graph.add_node(agent("screening"));
        let edge = graph
            .add_edge(PortRef::output(a), PortRef::input(b))
            .expect("edge");

        let connection = graph.remove_edge(edge).expect("remove");
        assert_eq!(connection.id, edge);
        assert_eq!(graph.edge_count(), 0);

        let err = graph.remove_edge(edge).expect_err("already gone");
        assert_eq!(err, GraphError::EdgeNotFound { edge_id: edge });
    }

    #[test]
    fn add_node_with_edge_onto_input_port() {
        let mut graph = FlowGraph::new();
        let existing = graph.add_node(agent("screening"));
        let version_before = graph.version();

        let (node_id, edge_id) = graph
            .add_node_with_edge(agent("sourcing"), PortRef::input(existing))
            .expect("atomic drop");

        assert!(graph.contains_node(node_id));
        let connection = graph
            .connections()
            .find(|conn| conn.id == edge_id)
            .expect("connection present");
        // Drop onto a sink: the new node feeds the anchor.
        assert_eq!(connection.source, PortRef::output(node_id));
        assert_eq!(connection.target, PortRef::input(existing));
        assert_eq!(graph.version(), version_before + 2);
    }

    #[test]
    fn add_node_with_edge_onto_output_port() {
        let mut graph = FlowGraph::new();
        let existing = graph.add_node(agent("sourcing"));

        let (node_id, edge_id) = graph
            .add_node_with_edge(agent("screening"), PortRef::output(existing))
            .expect("atomic drop");

        let connection = graph
            .connections()
            .find(|conn| conn.id == edge_id)
            .expect("connection present");
        assert_eq!(connection.source, PortRef::output(existing));
        assert_eq!(connection.target, PortRef::input(node_id));
    }

    #[test]
    fn add_node_with_edge_missing_anchor_leaves_graph_unchanged() {
        let mut graph = FlowGraph::new();
        let ghost = NodeId::new();

        let err = graph
            .add_node_with_edge(agent("sourcing"), PortRef::input(ghost))
            .expect_err("anchor missing");
        assert_eq!(err, GraphError::NodeNotFound { node_id: ghost });
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.version(), 0);
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));
        let b = graph.add_node(agent("screening"));
        let t = graph.add_node(tool("email-tool"));
        graph
            .add_edge(PortRef::output(a), PortRef::input(b))
            .expect("a -> b");
        graph
            .add_edge(PortRef::output(t), PortRef::tools(a))
            .expect("tool -> a");

        let snapshot = graph.snapshot();
        let restored = FlowGraph::restore(&snapshot).expect("restore");

        assert_eq!(restored.version(), graph.version());
        assert_eq!(restored.node_count(), 3);
        assert_eq!(restored.edge_count(), 2);
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn restore_rejects_dangling_connection() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));
        let b = graph.add_node(agent("screening"));
        graph
            .add_edge(PortRef::output(a), PortRef::input(b))
            .expect("edge");

        let mut snapshot = graph.snapshot();
        snapshot.nodes.retain(|node| node.id != b);

        let err = FlowGraph::restore(&snapshot).expect_err("dangling edge");
        assert!(matches!(err, GraphError::CorruptSnapshot { .. }));
    }

    #[test]
    fn restore_rejects_cycle() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));
        let b = graph.add_node(agent("screening"));
        graph
            .add_edge(PortRef::output(a), PortRef::input(b))
            .expect("edge");

        let mut snapshot = graph.snapshot();
        snapshot.edges.push(Connection {
            id: EdgeId::new(),
            source: PortRef::output(b),
            target: PortRef::input(a),
        });

        let err = FlowGraph::restore(&snapshot).expect_err("cyclic snapshot");
        assert!(matches!(err, GraphError::CorruptSnapshot { .. }));
    }

    #[test]
    fn config_and_label_updates_bump_version() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(agent("sourcing"));
        assert_eq!(graph.version(), 1);

        graph
            .update_config(a, serde_json::json!({"prompt": "find candidates"}))
            .expect("config");
        graph.rename_node(a, "Talent Sourcing").expect("rename");
        graph
            .move_node(a, Position::new(120.0, 40.0))
            .expect("move");

        assert_eq!(graph.version(), 4);
        let node = graph.node(a).expect("node present");
        assert_eq!(node.label, "Talent Sourcing");
        assert_eq!(node.position, Position::new(120.0, 40.0));
    }

    #[test]
    fn node_types_present() {
        let mut graph = FlowGraph::new();
        graph.add_node(agent("sourcing"));
        graph.add_node(agent("sourcing"));
        graph.add_node(tool("email-tool"));

        let present = graph.node_types_present();
        assert_eq!(present.len(), 2);
        assert!(present.contains(&NodeType::new("sourcing")));
        assert!(present.contains(&NodeType::new("email-tool")));
    }

    #[test]
    fn port_occupancy_counts_incoming_by_kind() {
        let mut graph = FlowGraph::new();
        let agent_id = graph.add_node(agent("sourcing"));
        let upstream = graph.add_node(agent("intake"));
        let tool_id = graph.add_node(tool("email-tool"));
        graph
            .add_edge(PortRef::output(upstream), PortRef::input(agent_id))
            .expect("data edge");
        graph
            .add_edge(PortRef::output(tool_id), PortRef::tools(agent_id))
            .expect("tool edge");

        assert_eq!(graph.port_occupancy(PortRef::input(agent_id)), 1);
        assert_eq!(graph.port_occupancy(PortRef::tools(agent_id)), 1);
        assert_eq!(graph.port_occupancy(PortRef::input(upstream)), 0);
    }
}
