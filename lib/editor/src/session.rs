//! Editor session wiring.

use crate::config::EditorConfig;
use agentflow_canvas::{
    Connection, DragController, DragError, DragPayload, DropOutcome, DropTarget, FlowGraph,
    FlowSnapshot, GraphError, Node, PortKind, PortRef, Position,
};
use agentflow_core::{EdgeId, FlowId, NodeId, RunId};
use agentflow_monitor::RunOverlay;
use agentflow_persistence::{AutoSaveHandle, AutoSavePipeline, SaveStatus, StoreSelector};
use agentflow_suggest::{
    Candidate, Suggestion, SuggestionContext, SuggestionEngine, SuggestionHandle, SuggestionRanker,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::watch;

/// One user's editing session over a flow.
///
/// The session owns the graph and the drag controller, and fans every
/// accepted mutation out to the auto-save pipeline and the suggestion
/// engine. Rejected mutations fan out nothing.
pub struct EditorSession {
    flow_id: FlowId,
    graph: FlowGraph,
    drag: DragController,
    selected: Option<NodeId>,
    autosave: AutoSaveHandle,
    suggest: SuggestionHandle,
}

impl EditorSession {
    /// Creates a session over already-spawned service handles.
    #[must_use]
    pub fn new(flow_id: FlowId, autosave: AutoSaveHandle, suggest: SuggestionHandle) -> Self {
        Self {
            flow_id,
            graph: FlowGraph::new(),
            drag: DragController::new(),
            selected: None,
            autosave,
            suggest,
        }
    }

    /// Spawns the auto-save pipeline and suggestion engine and wraps
    /// them in a fresh session. `fallback` is the candidate list the
    /// engine substitutes when the ranker fails.
    #[must_use]
    pub fn start(
        flow_id: FlowId,
        stores: StoreSelector,
        ranker: Arc<dyn SuggestionRanker>,
        fallback: Vec<Candidate>,
        config: &EditorConfig,
    ) -> Self {
        let autosave =
            AutoSavePipeline::spawn(stores, flow_id, config.persistence.autosave.clone());
        let suggest = SuggestionEngine::spawn(ranker, fallback, config.suggest.clone());
        Self::new(flow_id, autosave, suggest)
    }

    /// Returns the flow being edited.
    #[must_use]
    pub fn flow_id(&self) -> FlowId {
        self.flow_id
    }

    /// Returns the live graph.
    #[must_use]
    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    /// Returns the selected node, if any.
    #[must_use]
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Replaces the session's graph from a saved snapshot.
    ///
    /// Restoring is not an edit: it does not feed the auto-save
    /// pipeline. The selection is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CorruptSnapshot`] if the snapshot cannot
    /// be restored.
    pub fn restore_from(&mut self, snapshot: &FlowSnapshot) -> Result<(), GraphError> {
        self.graph = FlowGraph::restore(snapshot)?;
        self.drag.cancel();
        self.selected = None;
        self.suggest.context_changed(None);
        Ok(())
    }

    /// Adds a node to the canvas.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let node_id = self.graph.add_node(node);
        self.after_change();
        node_id
    }

    /// Removes a node and its connections.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node, GraphError> {
        let node = self.graph.remove_node(node_id)?;
        self.after_change();
        Ok(node)
    }

    /// Connects two ports.
    ///
    /// # Errors
    ///
    /// Propagates the [`GraphError`] if the connection is rejected; a
    /// rejected connection changes nothing and saves nothing.
    pub fn connect(&mut self, source: PortRef, target: PortRef) -> Result<EdgeId, GraphError> {
        let edge_id = self.graph.add_edge(source, target)?;
        self.after_change();
        Ok(edge_id)
    }

    /// Removes a connection.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EdgeNotFound`] if the connection does not
    /// exist.
    pub fn disconnect(&mut self, edge_id: EdgeId) -> Result<Connection, GraphError> {
        let connection = self.graph.remove_edge(edge_id)?;
        self.after_change();
        Ok(connection)
    }

    /// Moves a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn move_node(&mut self, node_id: NodeId, position: Position) -> Result<(), GraphError> {
        self.graph.move_node(node_id, position)?;
        self.after_change();
        Ok(())
    }

    /// Replaces a node's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn update_config(&mut self, node_id: NodeId, config: JsonValue) -> Result<(), GraphError> {
        self.graph.update_config(node_id, config)?;
        self.after_change();
        Ok(())
    }

    /// Renames a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if the node does not exist.
    pub fn rename_node(
        &mut self,
        node_id: NodeId,
        label: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.graph.rename_node(node_id, label)?;
        self.after_change();
        Ok(())
    }

    /// Begins a drag session.
    ///
    /// # Errors
    ///
    /// Returns [`DragError::SessionActive`] if one is already running.
    pub fn begin_drag(&mut self, payload: DragPayload, origin: Position) -> Result<(), DragError> {
        self.drag.begin(payload, origin)
    }

    /// Updates the drag ghost position.
    pub fn track_drag(&mut self, position: Position) {
        self.drag.track(position);
    }

    /// Aborts the drag session.
    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Commits the drag onto empty canvas.
    ///
    /// # Errors
    ///
    /// Propagates [`DragError`] from the controller or the graph.
    pub fn drop_on_canvas(&mut self) -> Result<DropOutcome, DragError> {
        let outcome = self.drag.drop_on_canvas(&mut self.graph)?;
        if outcome != DropOutcome::Aborted {
            self.after_change();
        }
        Ok(outcome)
    }

    /// Commits the drag onto a port.
    ///
    /// # Errors
    ///
    /// Propagates [`DragError`] from the controller or the graph.
    pub fn drop_on_target(&mut self, target: &DropTarget) -> Result<DropOutcome, DragError> {
        let outcome = self.drag.drop_on_target(&mut self.graph, target)?;
        if outcome != DropOutcome::Aborted {
            self.after_change();
        }
        Ok(outcome)
    }

    /// Builds the drop target for a port from the live graph.
    ///
    /// Input ports hold a single connection; tools and output ports
    /// are unbounded. Occupancy counts the connections already
    /// terminating at the port.
    #[must_use]
    pub fn drop_target_for(&self, port: PortRef) -> DropTarget {
        DropTarget {
            node: port.node,
            kind: port.kind,
            capacity: match port.kind {
                PortKind::Input => Some(1),
                PortKind::Tools | PortKind::Output => None,
            },
            occupancy: self.graph.port_occupancy(port),
        }
    }

    /// Changes the selection, driving the suggestion engine.
    pub fn select_node(&mut self, node_id: Option<NodeId>) {
        self.selected = node_id.filter(|id| self.graph.contains_node(*id));
        self.push_context();
    }

    /// Starts an execution overlay for a run over the current node
    /// set.
    ///
    /// The set is frozen here: nodes added while the run is underway
    /// will not appear in the overlay.
    #[must_use]
    pub fn begin_run(&self, run_id: RunId) -> RunOverlay {
        RunOverlay::start(run_id, self.graph.node_ids())
    }

    /// Returns a watch receiver for the auto-save status.
    #[must_use]
    pub fn save_status(&self) -> watch::Receiver<SaveStatus> {
        self.autosave.status()
    }

    /// Returns a watch receiver for the suggestion list.
    #[must_use]
    pub fn suggestions(&self) -> watch::Receiver<Vec<Suggestion>> {
        self.suggest.suggestions()
    }

    /// Stops the session's background services, flushing unsaved work.
    pub async fn shutdown(self) {
        self.autosave.shutdown().await;
        self.suggest.shutdown().await;
    }

    fn after_change(&mut self) {
        if let Some(selected) = self.selected {
            if !self.graph.contains_node(selected) {
                self.selected = None;
            }
        }
        self.autosave.graph_changed(self.graph.snapshot());
        self.push_context();
    }

    fn push_context(&self) {
        let context = self
            .selected
            .and_then(|id| self.graph.node(id))
            .map(|node| SuggestionContext {
                current: node.node_type.clone(),
                present: self.graph.node_types_present(),
            });
        self.suggest.context_changed(context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_canvas::{NodeCategory, NodeTemplate, NodeType};
    use agentflow_persistence::{
        BackendKind, SaveRecord, SessionProvider, SnapshotStore, StoreError,
    };
    use agentflow_suggest::{CompatibilityTable, TableRanker};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use tokio::time::Duration;

    struct MemoryStore {
        saves: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl SnapshotStore for MemoryStore {
        fn backend(&self) -> BackendKind {
            BackendKind::Local
        }

        async fn save(
            &self,
            flow_id: FlowId,
            snapshot: &FlowSnapshot,
        ) -> Result<SaveRecord, StoreError> {
            self.saves.lock().expect("saves lock").push(snapshot.version);
            Ok(SaveRecord {
                flow_id,
                version: snapshot.version,
                saved_at: Utc::now(),
                backend: BackendKind::Local,
            })
        }

        async fn load(&self, _flow_id: FlowId) -> Result<Option<FlowSnapshot>, StoreError> {
            Ok(None)
        }
    }

    struct NoSession;

    #[async_trait]
    impl SessionProvider for NoSession {
        async fn current_user(&self) -> Option<agentflow_core::UserId> {
            None
        }
    }

    fn start_session() -> (EditorSession, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore {
            saves: Mutex::new(Vec::new()),
        });
        let stores = StoreSelector::new(
            Arc::clone(&store) as Arc<dyn SnapshotStore>,
            Arc::clone(&store) as Arc<dyn SnapshotStore>,
            Arc::new(NoSession),
        );
        let table = CompatibilityTable::builtin();
        let fallback = table.fallback.clone();
        let ranker = TableRanker::new(table, Duration::ZERO);
        let session = EditorSession::start(
            FlowId::new(),
            stores,
            Arc::new(ranker),
            fallback,
            &EditorConfig::default(),
        );
        (session, store)
    }

    fn agent(node_type: &str) -> Node {
        Node::new(
            node_type,
            NodeCategory::Agent,
            node_type.to_owned(),
            Position::default(),
        )
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn edits_feed_the_autosave_pipeline() {
        let (mut session, store) = start_session();

        session.add_node(agent("sourcing"));
        settle(1).await;
        assert_eq!(*session.save_status().borrow(), SaveStatus::Pending);

        settle(5_010).await;
        assert_eq!(*store.saves.lock().expect("saves lock"), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_edits_save_nothing() {
        let (mut session, store) = start_session();
        let a = session.add_node(agent("sourcing"));
        let b = session.add_node(agent("screening"));
        session
            .connect(PortRef::output(a), PortRef::input(b))
            .expect("edge");
        settle(10_000).await;
        let saved_so_far = store.saves.lock().expect("saves lock").len();

        let err = session
            .connect(PortRef::output(b), PortRef::input(a))
            .expect_err("cycle");
        assert!(matches!(err, GraphError::CycleDetected { .. }));

        settle(10_000).await;
        assert_eq!(store.saves.lock().expect("saves lock").len(), saved_so_far);
    }

    #[tokio::test(start_paused = true)]
    async fn selection_drives_suggestions() {
        let (mut session, _store) = start_session();
        let sourcing = session.add_node(agent("sourcing"));
        session.add_node(agent("screening"));

        session.select_node(Some(sourcing));
        settle(10).await;

        let suggestions = session.suggestions().borrow().clone();
        // The builtin entry for sourcing is screening, email, tracker;
        // screening is already on the canvas.
        assert_eq!(suggestions.len(), 2);
        assert!(
            suggestions
                .iter()
                .all(|s| s.candidate.node_type != NodeType::new("screening"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn removing_selected_node_clears_selection() {
        let (mut session, _store) = start_session();
        let sourcing = session.add_node(agent("sourcing"));
        session.select_node(Some(sourcing));
        settle(10).await;

        session.remove_node(sourcing).expect("remove");
        settle(10).await;

        assert_eq!(session.selected(), None);
        assert!(session.suggestions().borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_overlay_freezes_the_node_set() {
        let (mut session, _store) = start_session();
        let a = session.add_node(agent("sourcing"));
        session.add_node(agent("screening"));

        let overlay = session.begin_run(RunId::new());
        session.add_node(agent("interview"));

        assert_eq!(overlay.node_count(), 2);
        assert!(overlay.status(a).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_is_not_an_edit() {
        let (mut session, store) = start_session();
        session.add_node(agent("sourcing"));
        settle(10_000).await;
        let saved_so_far = store.saves.lock().expect("saves lock").len();

        let snapshot = session.graph().snapshot();
        session.restore_from(&snapshot).expect("restore");
        settle(10_000).await;

        assert_eq!(store.saves.lock().expect("saves lock").len(), saved_so_far);
        assert_eq!(session.graph().version(), snapshot.version);
    }

    #[tokio::test(start_paused = true)]
    async fn occupied_input_port_refuses_another_drop() {
        let (mut session, _store) = start_session();
        let a = session.add_node(agent("sourcing"));
        let b = session.add_node(agent("screening"));
        session
            .connect(PortRef::output(a), PortRef::input(b))
            .expect("edge");

        let target = session.drop_target_for(PortRef::input(b));
        assert_eq!(target.capacity, Some(1));
        assert_eq!(target.occupancy, 1);

        session
            .begin_drag(
                DragPayload::Palette(NodeTemplate::agent("interview", "Interview Agent")),
                Position::default(),
            )
            .expect("begin");
        let outcome = session.drop_on_target(&target).expect("drop");
        assert_eq!(outcome, DropOutcome::Aborted);
        assert_eq!(session.graph().node_count(), 2);

        // The tools port on the same node stays open.
        let tools = session.drop_target_for(PortRef::tools(b));
        assert_eq!(tools.capacity, None);
        assert!(tools.accepts(&DragPayload::Palette(NodeTemplate::tool("email-tool", "Email"))));
    }

    #[tokio::test(start_paused = true)]
    async fn palette_drag_commits_through_the_session() {
        let (mut session, store) = start_session();

        session
            .begin_drag(
                DragPayload::Palette(NodeTemplate::agent("sourcing", "Sourcing Agent")),
                Position::new(0.0, 0.0),
            )
            .expect("begin");
        session.track_drag(Position::new(160.0, 80.0));
        let outcome = session.drop_on_canvas().expect("drop");
        assert!(matches!(outcome, DropOutcome::NodeAdded { .. }));

        settle(5_010).await;
        assert_eq!(*store.saves.lock().expect("saves lock"), vec![1]);
    }
}
