//! Drag interaction state machine.
//!
//! A [`DragController`] tracks one drag session at a time: it begins
//! with a payload (a palette template or an existing node), tracks a
//! ghost position while the pointer moves, and ends at exactly one
//! commit point (a drop) or an abort (cancel, or a drop the target
//! refuses). The graph is only mutated at the commit point, so a
//! cancelled or refused drag leaves the document untouched.

use crate::error::DragError;
use crate::graph::FlowGraph;
use crate::node::{NodeCategory, NodeTemplate, Position};
use crate::port::{PortKind, PortRef};
use agentflow_core::{EdgeId, NodeId};

/// What is being dragged.
#[derive(Debug, Clone, PartialEq)]
pub enum DragPayload {
    /// A palette template; dropping creates a new node.
    Palette(NodeTemplate),
    /// An existing node; dropping moves it.
    Existing(NodeId),
}

/// A port the pointer is hovering over during a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget {
    /// The node the port belongs to.
    pub node: NodeId,
    /// The kind of the hovered port.
    pub kind: PortKind,
    /// Maximum number of connections the port accepts, if bounded.
    pub capacity: Option<usize>,
    /// Number of connections already terminating at the port.
    pub occupancy: usize,
}

impl DropTarget {
    /// Creates a drop target for a port with unbounded capacity.
    #[must_use]
    pub fn new(node: NodeId, kind: PortKind) -> Self {
        Self {
            node,
            kind,
            capacity: None,
            occupancy: 0,
        }
    }

    /// Bounds the port's capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize, occupancy: usize) -> Self {
        self.capacity = Some(capacity);
        self.occupancy = occupancy;
        self
    }

    /// Checks whether this port accepts the given payload.
    ///
    /// Only palette payloads can land on a port; dragging an existing
    /// node is a move, never a connect. Tools ports only accept tool
    /// templates, data ports only accept agent templates, and a full
    /// port accepts nothing.
    #[must_use]
    pub fn accepts(&self, payload: &DragPayload) -> bool {
        let DragPayload::Palette(template) = payload else {
            return false;
        };
        if let Some(capacity) = self.capacity {
            if self.occupancy >= capacity {
                return false;
            }
        }
        match self.kind {
            PortKind::Tools => template.category == NodeCategory::Tool,
            PortKind::Input | PortKind::Output => template.category == NodeCategory::Agent,
        }
    }
}

/// The result of committing a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// A palette drop on empty canvas added a node.
    NodeAdded {
        /// The new node.
        node_id: NodeId,
    },
    /// A palette drop on a port added a node and connected it.
    NodeLinked {
        /// The new node.
        node_id: NodeId,
        /// The new connection.
        edge_id: EdgeId,
    },
    /// An existing node was moved.
    NodeMoved {
        /// The moved node.
        node_id: NodeId,
    },
    /// The drop target refused the payload; nothing changed.
    Aborted,
}

#[derive(Debug, Clone)]
enum DragState {
    Idle,
    Dragging { payload: DragPayload, ghost: Position },
}

/// Tracks a single drag session from begin to commit or abort.
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    /// Creates an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    /// Returns true if a drag session is active.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Returns the ghost position of the active session, if any.
    #[must_use]
    pub fn ghost(&self) -> Option<Position> {
        match &self.state {
            DragState::Dragging { ghost, .. } => Some(*ghost),
            DragState::Idle => None,
        }
    }

    /// Returns the payload of the active session, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&DragPayload> {
        match &self.state {
            DragState::Dragging { payload, .. } => Some(payload),
            DragState::Idle => None,
        }
    }

    /// Begins a drag session.
    ///
    /// # Errors
    ///
    /// Returns [`DragError::SessionActive`] if a session is already in
    /// progress; the active session is left untouched.
    pub fn begin(&mut self, payload: DragPayload, origin: Position) -> Result<(), DragError> {
        if self.is_dragging() {
            return Err(DragError::SessionActive);
        }
        self.state = DragState::Dragging {
            payload,
            ghost: origin,
        };
        Ok(())
    }

    /// Updates the ghost position while the pointer moves.
    ///
    /// Ignored when no session is active, so stray move events after a
    /// commit are harmless.
    pub fn track(&mut self, position: Position) {
        if let DragState::Dragging { ghost, .. } = &mut self.state {
            *ghost = position;
        }
    }

    /// Aborts the active session without touching the graph.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Commits the drag onto empty canvas.
    ///
    /// A palette payload adds a new node at the ghost position; an
    /// existing-node payload moves that node there. The session ends
    /// whether the commit succeeds or fails.
    ///
    /// # Errors
    ///
    /// Returns [`DragError::NoSession`] if no session is active, or a
    /// wrapped [`GraphError`](crate::GraphError) if the graph rejects
    /// the mutation.
    pub fn drop_on_canvas(&mut self, graph: &mut FlowGraph) -> Result<DropOutcome, DragError> {
        let (payload, ghost) = self.take_session()?;
        match payload {
            DragPayload::Palette(template) => {
                let node_id = graph.add_node(template.instantiate(ghost));
                Ok(DropOutcome::NodeAdded { node_id })
            }
            DragPayload::Existing(node_id) => {
                graph.move_node(node_id, ghost)?;
                Ok(DropOutcome::NodeMoved { node_id })
            }
        }
    }

    /// Commits the drag onto a port.
    ///
    /// If the target refuses the payload the session ends and the graph
    /// is untouched; the caller gets [`DropOutcome::Aborted`] rather
    /// than an error because a refused drop is a normal interaction.
    /// An accepted palette drop adds the node and connects it to the
    /// port as one atomic mutation.
    ///
    /// # Errors
    ///
    /// Returns [`DragError::NoSession`] if no session is active, or a
    /// wrapped [`GraphError`](crate::GraphError) if the graph rejects
    /// the atomic add-and-connect.
    pub fn drop_on_target(
        &mut self,
        graph: &mut FlowGraph,
        target: &DropTarget,
    ) -> Result<DropOutcome, DragError> {
        let DragState::Dragging { payload, .. } = &self.state else {
            return Err(DragError::NoSession);
        };
        if !target.accepts(payload) {
            self.state = DragState::Idle;
            return Ok(DropOutcome::Aborted);
        }

        let (payload, ghost) = self.take_session()?;
        match payload {
            DragPayload::Palette(template) => {
                let anchor = PortRef {
                    node: target.node,
                    kind: target.kind,
                };
                let (node_id, edge_id) =
                    graph.add_node_with_edge(template.instantiate(ghost), anchor)?;
                Ok(DropOutcome::NodeLinked { node_id, edge_id })
            }
            // accepts() refuses existing payloads, so this arm is only
            // reachable if a target claims otherwise.
            DragPayload::Existing(_) => Ok(DropOutcome::Aborted),
        }
    }

    fn take_session(&mut self) -> Result<(DragPayload, Position), DragError> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging { payload, ghost } => Ok((payload, ghost)),
            DragState::Idle => Err(DragError::NoSession),
        }
    }
}
