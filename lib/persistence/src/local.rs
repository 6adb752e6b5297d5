//! Local snapshot store backed by SQLite.
//!
//! The local store keeps a single `current-flow` row so offline work
//! always resumes from the latest snapshot. The schema is created on
//! connect; there is no migration history to manage for one table.

use crate::error::StoreError;
use crate::store::{BackendKind, SaveRecord, SnapshotStore};
use agentflow_canvas::FlowSnapshot;
use agentflow_core::FlowId;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const CURRENT_SLOT: &str = "current-flow";

/// SQLite-backed snapshot store.
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Connects to the database and ensures the snapshot table exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection or schema
    /// setup fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wraps an existing pool, ensuring the snapshot table exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if schema setup fails.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS flow_snapshots (
                slot TEXT PRIMARY KEY,
                flow_id TEXT NOT NULL,
                document TEXT NOT NULL,
                version INTEGER NOT NULL,
                saved_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for LocalStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn save(
        &self,
        flow_id: FlowId,
        snapshot: &FlowSnapshot,
    ) -> Result<SaveRecord, StoreError> {
        let document = serde_json::to_string(snapshot)?;
        let saved_at = Utc::now();

        sqlx::query(
            "INSERT INTO flow_snapshots (slot, flow_id, document, version, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(slot) DO UPDATE SET
                flow_id = excluded.flow_id,
                document = excluded.document,
                version = excluded.version,
                saved_at = excluded.saved_at",
        )
        .bind(CURRENT_SLOT)
        .bind(flow_id.to_string())
        .bind(document)
        .bind(i64::try_from(snapshot.version).unwrap_or(i64::MAX))
        .bind(saved_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(SaveRecord {
            flow_id,
            version: snapshot.version,
            saved_at,
            backend: BackendKind::Local,
        })
    }

    async fn load(&self, _flow_id: FlowId) -> Result<Option<FlowSnapshot>, StoreError> {
        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM flow_snapshots WHERE slot = ?1")
                .bind(CURRENT_SLOT)
                .fetch_optional(&self.pool)
                .await?;

        match document {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_canvas::{FlowGraph, Node, NodeCategory, PortRef, Position};

    async fn in_memory_store() -> LocalStore {
        LocalStore::connect("sqlite::memory:")
            .await
            .expect("connect in-memory sqlite")
    }

    fn sample_snapshot() -> FlowSnapshot {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(Node::new(
            "sourcing",
            NodeCategory::Agent,
            "Sourcing Agent",
            Position::new(80.0, 80.0),
        ));
        let b = graph.add_node(Node::new(
            "screening",
            NodeCategory::Agent,
            "Screening Agent",
            Position::new(280.0, 80.0),
        ));
        graph
            .add_edge(PortRef::output(a), PortRef::input(b))
            .expect("edge");
        graph.snapshot()
    }

    #[tokio::test]
    async fn load_before_any_save_is_none() {
        let store = in_memory_store().await;
        let loaded = store.load(FlowId::new()).await.expect("load");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let store = in_memory_store().await;
        let flow_id = FlowId::new();
        let snapshot = sample_snapshot();

        let record = store.save(flow_id, &snapshot).await.expect("save");
        assert_eq!(record.version, snapshot.version);
        assert_eq!(record.backend, BackendKind::Local);

        let loaded = store.load(flow_id).await.expect("load").expect("present");
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn second_save_overwrites_current_slot() {
        let store = in_memory_store().await;
        let flow_id = FlowId::new();
        let first = sample_snapshot();
        store.save(flow_id, &first).await.expect("first save");

        let mut graph = FlowGraph::restore(&first).expect("restore");
        graph.add_node(Node::new(
            "interview",
            NodeCategory::Agent,
            "Interview Agent",
            Position::new(480.0, 80.0),
        ));
        let second = graph.snapshot();
        store.save(flow_id, &second).await.expect("second save");

        let loaded = store.load(flow_id).await.expect("load").expect("present");
        assert_eq!(loaded, second);
        assert!(loaded.version > first.version);
    }
}
