//! The snapshot store port and per-save backend selection.

use crate::error::StoreError;
use agentflow_canvas::FlowSnapshot;
use agentflow_core::{FlowId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which store family handled a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// The remote HTTP store, used while a session is present.
    Remote,
    /// The local SQLite store, used without a session.
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// A record of one completed save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    /// The flow that was saved.
    pub flow_id: FlowId,
    /// The graph version the saved snapshot was taken at.
    pub version: u64,
    /// When the save completed.
    pub saved_at: DateTime<Utc>,
    /// Which backend handled the save.
    pub backend: BackendKind,
}

/// Persistence port for flow snapshots.
///
/// Implementations must tolerate concurrent callers; the auto-save
/// pipeline guarantees at most one in-flight save per pipeline, but
/// loads can race with saves.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Identifies the backend for save stamping and logging.
    fn backend(&self) -> BackendKind;

    /// Persists a snapshot as the current state of the flow.
    async fn save(
        &self,
        flow_id: FlowId,
        snapshot: &FlowSnapshot,
    ) -> Result<SaveRecord, StoreError>;

    /// Loads the current snapshot of the flow, if one has been saved.
    async fn load(&self, flow_id: FlowId) -> Result<Option<FlowSnapshot>, StoreError>;
}

/// Port for querying the current user session.
///
/// Session presence is checked per save, not once at startup, so a
/// login or logout mid-session redirects subsequent saves without a
/// restart.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns the signed-in user, if any.
    async fn current_user(&self) -> Option<UserId>;
}

/// Routes each save to the remote or local store by session presence.
#[derive(Clone)]
pub struct StoreSelector {
    remote: Arc<dyn SnapshotStore>,
    local: Arc<dyn SnapshotStore>,
    session: Arc<dyn SessionProvider>,
}

impl StoreSelector {
    /// Creates a selector over the given stores and session source.
    #[must_use]
    pub fn new(
        remote: Arc<dyn SnapshotStore>,
        local: Arc<dyn SnapshotStore>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            remote,
            local,
            session,
        }
    }

    /// Picks the store for the next save.
    pub async fn pick(&self) -> Arc<dyn SnapshotStore> {
        if self.session.current_user().await.is_some() {
            Arc::clone(&self.remote)
        } else {
            Arc::clone(&self.local)
        }
    }

    /// Loads the current snapshot from the backend a save would use
    /// right now. Used to restore the canvas on open.
    ///
    /// # Errors
    ///
    /// Propagates the selected store's [`StoreError`].
    pub async fn load_current(&self, flow_id: FlowId) -> Result<Option<FlowSnapshot>, StoreError> {
        self.pick().await.load(flow_id).await
    }
}
