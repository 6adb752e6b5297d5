//! The run overlay state machine.
//!
//! [`RunOverlay`] tracks the execution state shown over the canvas. It
//! is pure: applying an event mutates the overlay and returns effects
//! for the caller (the driver) to act on. The node set is frozen when
//! the overlay starts; nodes added to the canvas mid-run never appear
//! in the overlay, and events for unknown nodes are dropped.

use crate::event::{NodeRunStatus, RunEvent};
use agentflow_core::{NodeId, RunId};
use std::collections::{HashMap, HashSet};

/// A side effect requested by the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEffect {
    /// Scroll the canvas to bring a node into view.
    ScrollTo(NodeId),
    /// Start the auto-dismiss countdown; the run stopped executing.
    ScheduleDismiss,
    /// Cancel a pending auto-dismiss; the run resumed.
    CancelDismiss,
}

/// Execution overlay state for one run.
#[derive(Debug, Clone)]
pub struct RunOverlay {
    run_id: RunId,
    frozen: HashSet<NodeId>,
    statuses: HashMap<NodeId, NodeRunStatus>,
    active: Option<NodeId>,
    executing: bool,
}

impl RunOverlay {
    /// Starts an overlay for a run over the given node set.
    ///
    /// Every node starts waiting and the run is considered executing
    /// from the first instant.
    #[must_use]
    pub fn start(run_id: RunId, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let frozen: HashSet<NodeId> = nodes.into_iter().collect();
        let statuses = frozen
            .iter()
            .map(|id| (*id, NodeRunStatus::Waiting))
            .collect();
        Self {
            run_id,
            frozen,
            statuses,
            active: None,
            executing: true,
        }
    }

    /// Returns the run this overlay tracks.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Returns a node's current status, if the node is in the run.
    #[must_use]
    pub fn status(&self, node_id: NodeId) -> Option<NodeRunStatus> {
        self.statuses.get(&node_id).copied()
    }

    /// Returns the currently active node, if any.
    #[must_use]
    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    /// Returns whether the run is executing.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.executing
    }

    /// Returns the number of nodes in the run.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.frozen.len()
    }

    /// Returns how many nodes have reached a terminal status.
    #[must_use]
    pub fn finished_count(&self) -> usize {
        self.statuses
            .values()
            .filter(|status| status.is_terminal())
            .count()
    }

    /// Iterates over per-node statuses.
    pub fn statuses(&self) -> impl Iterator<Item = (NodeId, NodeRunStatus)> + '_ {
        self.statuses.iter().map(|(id, status)| (*id, *status))
    }

    /// Applies a run event, returning the effects it triggered.
    ///
    /// Status updates are monotonic: an update whose rank does not
    /// advance the node's current status is dropped. Active-node
    /// changes request a scroll once per distinct change. Executing
    /// transitions schedule or cancel the auto-dismiss countdown.
    pub fn apply(&mut self, event: &RunEvent) -> Vec<OverlayEffect> {
        match event {
            RunEvent::NodeStatus {
                node_id, status, ..
            } => {
                self.apply_status(*node_id, *status);
                Vec::new()
            }
            RunEvent::ActiveNode { node_id, .. } => self.apply_active(*node_id),
            RunEvent::Executing { executing, .. } => self.apply_executing(*executing),
        }
    }

    fn apply_status(&mut self, node_id: NodeId, status: NodeRunStatus) {
        let Some(current) = self.statuses.get_mut(&node_id) else {
            tracing::warn!(node_id = %node_id, run_id = %self.run_id, "status for node outside the run");
            return;
        };
        if status.rank() > current.rank() {
            *current = status;
        } else if status != *current {
            tracing::warn!(
                node_id = %node_id,
                run_id = %self.run_id,
                from = %*current,
                to = %status,
                "dropping non-monotonic status update",
            );
        }
    }

    fn apply_active(&mut self, node_id: Option<NodeId>) -> Vec<OverlayEffect> {
        match node_id {
            Some(id) if !self.frozen.contains(&id) => {
                tracing::warn!(node_id = %id, run_id = %self.run_id, "active node outside the run");
                Vec::new()
            }
            Some(id) if self.active != Some(id) => {
                self.active = Some(id);
                vec![OverlayEffect::ScrollTo(id)]
            }
            Some(_) => Vec::new(),
            None => {
                self.active = None;
                Vec::new()
            }
        }
    }

    fn apply_executing(&mut self, executing: bool) -> Vec<OverlayEffect> {
        if executing == self.executing {
            return Vec::new();
        }
        self.executing = executing;
        if executing {
            vec![OverlayEffect::CancelDismiss]
        } else {
            vec![OverlayEffect::ScheduleDismiss]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn status_event(node_id: NodeId, status: NodeRunStatus) -> RunEvent {
        RunEvent::NodeStatus {
            node_id,
            status,
            at: Utc::now(),
        }
    }

    fn active_event(node_id: Option<NodeId>) -> RunEvent {
        RunEvent::ActiveNode {
            node_id,
            at: Utc::now(),
        }
    }

    fn executing_event(executing: bool) -> RunEvent {
        RunEvent::Executing {
            executing,
            at: Utc::now(),
        }
    }

    #[test]
    fn all_nodes_start_waiting() {
        let nodes = [NodeId::new(), NodeId::new(), NodeId::new()];
        let overlay = RunOverlay::start(RunId::new(), nodes);

        assert!(overlay.is_executing());
        assert_eq!(overlay.node_count(), 3);
        for node in nodes {
            assert_eq!(overlay.status(node), Some(NodeRunStatus::Waiting));
        }
    }

    #[test]
    fn status_only_moves_forward() {
        let node = NodeId::new();
        let mut overlay = RunOverlay::start(RunId::new(), [node]);

        overlay.apply(&status_event(node, NodeRunStatus::Running));
        assert_eq!(overlay.status(node), Some(NodeRunStatus::Running));

        // A late waiting update must not regress the node.
        overlay.apply(&status_event(node, NodeRunStatus::Waiting));
        assert_eq!(overlay.status(node), Some(NodeRunStatus::Running));

        overlay.apply(&status_event(node, NodeRunStatus::Completed));
        assert_eq!(overlay.status(node), Some(NodeRunStatus::Completed));

        // Terminal states never flip.
        overlay.apply(&status_event(node, NodeRunStatus::Failed));
        assert_eq!(overlay.status(node), Some(NodeRunStatus::Completed));
    }

    #[test]
    fn events_for_unknown_nodes_are_dropped() {
        let node = NodeId::new();
        let stranger = NodeId::new();
        let mut overlay = RunOverlay::start(RunId::new(), [node]);

        overlay.apply(&status_event(stranger, NodeRunStatus::Running));
        assert_eq!(overlay.status(stranger), None);

        let effects = overlay.apply(&active_event(Some(stranger)));
        assert!(effects.is_empty());
        assert_eq!(overlay.active(), None);
    }

    #[test]
    fn scroll_fires_once_per_active_change() {
        let a = NodeId::new();
        let b = NodeId::new();
        let mut overlay = RunOverlay::start(RunId::new(), [a, b]);

        let effects = overlay.apply(&active_event(Some(a)));
        assert_eq!(effects, vec![OverlayEffect::ScrollTo(a)]);

        // The same active node repeated does not scroll again.
        let effects = overlay.apply(&active_event(Some(a)));
        assert!(effects.is_empty());

        let effects = overlay.apply(&active_event(Some(b)));
        assert_eq!(effects, vec![OverlayEffect::ScrollTo(b)]);

        let effects = overlay.apply(&active_event(None));
        assert!(effects.is_empty());
        assert_eq!(overlay.active(), None);
    }

    #[test]
    fn executing_transitions_drive_dismissal() {
        let mut overlay = RunOverlay::start(RunId::new(), [NodeId::new()]);

        // Already executing; a repeat is a no-op.
        assert!(overlay.apply(&executing_event(true)).is_empty());

        let effects = overlay.apply(&executing_event(false));
        assert_eq!(effects, vec![OverlayEffect::ScheduleDismiss]);
        assert!(!overlay.is_executing());

        let effects = overlay.apply(&executing_event(true));
        assert_eq!(effects, vec![OverlayEffect::CancelDismiss]);
        assert!(overlay.is_executing());
    }

    #[test]
    fn finished_count_tracks_terminals() {
        let a = NodeId::new();
        let b = NodeId::new();
        let mut overlay = RunOverlay::start(RunId::new(), [a, b]);

        overlay.apply(&status_event(a, NodeRunStatus::Completed));
        assert_eq!(overlay.finished_count(), 1);
        overlay.apply(&status_event(b, NodeRunStatus::Failed));
        assert_eq!(overlay.finished_count(), 2);
    }
}
