//! Remote snapshot store over HTTP.
//!
//! Saves PUT the full snapshot to `{base}/flows/current` and loads GET
//! the same resource. The server owns conflict handling; this client
//! only reports success or failure.

use crate::error::StoreError;
use crate::store::{BackendKind, SaveRecord, SnapshotStore};
use agentflow_canvas::FlowSnapshot;
use agentflow_core::FlowId;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The wire document for the current flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FlowDocument {
    flow_id: FlowId,
    #[serde(flatten)]
    snapshot: FlowSnapshot,
}

/// HTTP-backed snapshot store.
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteStore {
    /// Creates a store against the given API base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn current_flow_url(&self) -> String {
        format!("{}/flows/current", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SnapshotStore for RemoteStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn save(
        &self,
        flow_id: FlowId,
        snapshot: &FlowSnapshot,
    ) -> Result<SaveRecord, StoreError> {
        let document = FlowDocument {
            flow_id,
            snapshot: snapshot.clone(),
        };
        let response = self
            .client
            .put(self.current_flow_url())
            .json(&document)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(SaveRecord {
            flow_id,
            version: snapshot.version,
            saved_at: Utc::now(),
            backend: BackendKind::Remote,
        })
    }

    async fn load(&self, _flow_id: FlowId) -> Result<Option<FlowSnapshot>, StoreError> {
        let response = self.client.get(self.current_flow_url()).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let document: FlowDocument = response.json().await?;
        Ok(Some(document.snapshot))
    }
}
