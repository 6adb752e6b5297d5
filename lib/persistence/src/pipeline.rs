//! The auto-save pipeline.
//!
//! A background task that turns a stream of graph changes into saves:
//!
//! - Changes are debounced with a trailing timer; every change restarts
//!   it, and the save fires once the canvas has been quiet long enough.
//! - At most one save is in flight. A change arriving mid-save waits
//!   out its debounce window like any other; only a window that elapses
//!   while a save is still running parks its snapshot, which then
//!   dispatches the moment the in-flight save settles.
//! - The store is picked per save from session presence, so signing in
//!   or out redirects the very next save.
//! - Failures surface as a status notice and clear on their own; there
//!   is no automatic retry. The next graph change drives the next
//!   attempt.

use crate::config::AutoSaveConfig;
use crate::error::StoreError;
use crate::store::{SaveRecord, StoreSelector};
use agentflow_canvas::FlowSnapshot;
use agentflow_core::FlowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

/// The externally visible state of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveStatus {
    /// Nothing to save and no notice showing.
    Idle,
    /// A change is waiting out the debounce timer.
    Pending,
    /// A save is in flight.
    Saving,
    /// The last save succeeded; clears to [`SaveStatus::Idle`] after
    /// the configured notice window.
    Saved {
        /// The graph version that was saved.
        version: u64,
        /// When the save completed.
        at: DateTime<Utc>,
    },
    /// The last save failed; clears to [`SaveStatus::Idle`] after the
    /// configured notice window without retrying.
    Error {
        /// Why the save failed.
        message: String,
    },
}

enum PipelineMsg {
    Changed(FlowSnapshot),
    Shutdown,
}

/// Handle to a running auto-save pipeline.
pub struct AutoSaveHandle {
    tx: mpsc::UnboundedSender<PipelineMsg>,
    status_rx: watch::Receiver<SaveStatus>,
    task: JoinHandle<()>,
}

impl AutoSaveHandle {
    /// Feeds a fresh snapshot into the pipeline.
    ///
    /// Snapshots supersede each other: only the most recent one at
    /// save time is persisted.
    pub fn graph_changed(&self, snapshot: FlowSnapshot) {
        if self.tx.send(PipelineMsg::Changed(snapshot)).is_err() {
            tracing::warn!("auto-save pipeline has stopped; dropping change");
        }
    }

    /// Returns a watch receiver for the pipeline status.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.status_rx.clone()
    }

    /// Returns the current pipeline status.
    #[must_use]
    pub fn current_status(&self) -> SaveStatus {
        self.status_rx.borrow().clone()
    }

    /// Stops the pipeline, flushing any unsaved snapshot first.
    pub async fn shutdown(self) {
        let _ = self.tx.send(PipelineMsg::Shutdown);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "auto-save pipeline ended abnormally");
        }
    }
}

/// The debounced, single-flight save loop.
pub struct AutoSavePipeline {
    stores: StoreSelector,
    flow_id: FlowId,
    config: AutoSaveConfig,
    status_tx: watch::Sender<SaveStatus>,
}

impl AutoSavePipeline {
    /// Spawns the pipeline task and returns its handle.
    #[must_use]
    pub fn spawn(stores: StoreSelector, flow_id: FlowId, config: AutoSaveConfig) -> AutoSaveHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);
        let pipeline = Self {
            stores,
            flow_id,
            config,
            status_tx,
        };
        let task = tokio::spawn(pipeline.run(rx));
        AutoSaveHandle {
            tx,
            status_rx,
            task,
        }
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<PipelineMsg>) {
        // Snapshot waiting out the debounce timer.
        let mut pending: Option<FlowSnapshot> = None;
        let mut debounce_at: Option<Instant> = None;
        // Snapshot parked while a save is in flight.
        let mut queued: Option<FlowSnapshot> = None;
        let mut in_flight: Option<JoinHandle<Result<SaveRecord, StoreError>>> = None;
        // When the current Saved/Error notice clears back to Idle.
        let mut notice_at: Option<Instant> = None;

        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(PipelineMsg::Changed(snapshot)) => {
                        // Latest snapshot wins, and every change
                        // restarts the trailing timer, in-flight save
                        // or not. A newer change also supersedes a
                        // snapshot already parked for dispatch.
                        pending = Some(snapshot);
                        queued = None;
                        debounce_at = Some(
                            Instant::now() + Duration::from_millis(self.config.debounce_ms),
                        );
                        if in_flight.is_none() {
                            notice_at = None;
                            self.publish(SaveStatus::Pending);
                        }
                    }
                    Some(PipelineMsg::Shutdown) | None => break,
                },
                () = sleep_until_opt(debounce_at) => {
                    debounce_at = None;
                    if let Some(snapshot) = pending.take() {
                        if in_flight.is_some() {
                            // The window elapsed mid-save; park the
                            // snapshot to go out as soon as the save
                            // settles.
                            queued = Some(snapshot);
                        } else {
                            in_flight = Some(self.dispatch(snapshot));
                            notice_at = None;
                            self.publish(SaveStatus::Saving);
                        }
                    }
                }
                result = join_save(&mut in_flight) => {
                    in_flight = None;
                    match result {
                        Ok(record) => {
                            tracing::debug!(
                                version = record.version,
                                backend = %record.backend,
                                "flow saved",
                            );
                            self.publish(SaveStatus::Saved {
                                version: record.version,
                                at: record.saved_at,
                            });
                            notice_at = Some(
                                Instant::now()
                                    + Duration::from_millis(self.config.saved_notice_ms),
                            );
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "flow save failed");
                            self.publish(SaveStatus::Error {
                                message: err.to_string(),
                            });
                            notice_at = Some(
                                Instant::now()
                                    + Duration::from_millis(self.config.error_notice_ms),
                            );
                        }
                    }
                    // A parked snapshot already waited out its window;
                    // it goes straight out.
                    if let Some(snapshot) = queued.take() {
                        in_flight = Some(self.dispatch(snapshot));
                        notice_at = None;
                        self.publish(SaveStatus::Saving);
                    }
                }
                () = sleep_until_opt(notice_at) => {
                    notice_at = None;
                    self.publish(SaveStatus::Idle);
                }
            }
        }

        self.flush(pending, queued, in_flight).await;
    }

    fn dispatch(&self, snapshot: FlowSnapshot) -> JoinHandle<Result<SaveRecord, StoreError>> {
        let stores = self.stores.clone();
        let flow_id = self.flow_id;
        tokio::spawn(async move {
            let store = stores.pick().await;
            store.save(flow_id, &snapshot).await
        })
    }

    /// Final flush on shutdown: settle any in-flight save, then save
    /// the newest unsaved snapshot inline.
    async fn flush(
        &self,
        pending: Option<FlowSnapshot>,
        queued: Option<FlowSnapshot>,
        in_flight: Option<JoinHandle<Result<SaveRecord, StoreError>>>,
    ) {
        if let Some(task) = in_flight {
            match task.await {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => tracing::warn!(error = %err, "flow save failed during shutdown"),
                Err(err) => tracing::warn!(error = %err, "save task failed during shutdown"),
            }
        }
        if let Some(snapshot) = queued.or(pending) {
            let store = self.stores.pick().await;
            if let Err(err) = store.save(self.flow_id, &snapshot).await {
                tracing::warn!(error = %err, "final save on shutdown failed");
            }
        }
    }

    fn publish(&self, status: SaveStatus) {
        self.status_tx.send_replace(status);
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn join_save(
    in_flight: &mut Option<JoinHandle<Result<SaveRecord, StoreError>>>,
) -> Result<SaveRecord, StoreError> {
    match in_flight.as_mut() {
        Some(task) => match task.await {
            Ok(result) => result,
            Err(err) => Err(StoreError::TaskFailed {
                message: err.to_string(),
            }),
        },
        None => std::future::pending().await,
    }
}
