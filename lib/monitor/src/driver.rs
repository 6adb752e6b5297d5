//! The overlay driver task.
//!
//! [`OverlayDriver`] owns a [`RunOverlay`] and the auto-dismiss timer,
//! consuming run events and publishing [`OverlayView`] values over a
//! watch channel for the canvas to render.

use crate::config::MonitorConfig;
use crate::control::{ControlError, ExecutionControl};
use crate::event::{NodeRunStatus, RunEvent};
use crate::overlay::{OverlayEffect, RunOverlay};
use agentflow_core::{NodeId, RunId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

/// A renderable view of the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayView {
    /// The run being shown.
    pub run_id: RunId,
    /// Per-node statuses.
    pub statuses: HashMap<NodeId, NodeRunStatus>,
    /// The active node, if any.
    pub active: Option<NodeId>,
    /// Whether the run is executing.
    pub executing: bool,
    /// A node the canvas should scroll into view, set on the view
    /// published for the change that activated it.
    pub scroll_target: Option<NodeId>,
    /// Whether the overlay is shown at all.
    pub visible: bool,
}

enum DriverMsg {
    Event(RunEvent),
    Dismiss,
    Shutdown,
}

/// Handle to a running overlay driver.
pub struct OverlayHandle {
    tx: mpsc::UnboundedSender<DriverMsg>,
    view_rx: watch::Receiver<OverlayView>,
    control: Arc<dyn ExecutionControl>,
    run_id: RunId,
    task: JoinHandle<()>,
}

impl OverlayHandle {
    /// Feeds a run event into the overlay.
    pub fn apply(&self, event: RunEvent) {
        if self.tx.send(DriverMsg::Event(event)).is_err() {
            tracing::warn!(run_id = %self.run_id, "overlay driver has stopped; dropping event");
        }
    }

    /// Dismisses the overlay immediately, cancelling any pending
    /// auto-dismiss.
    pub fn dismiss(&self) {
        if self.tx.send(DriverMsg::Dismiss).is_err() {
            tracing::warn!(run_id = %self.run_id, "overlay driver has stopped; dropping dismiss");
        }
    }

    /// Returns a watch receiver for overlay views.
    #[must_use]
    pub fn view(&self) -> watch::Receiver<OverlayView> {
        self.view_rx.clone()
    }

    /// Returns the current overlay view.
    #[must_use]
    pub fn current_view(&self) -> OverlayView {
        self.view_rx.borrow().clone()
    }

    /// Pauses the run.
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] if the runner refuses or cannot be
    /// reached.
    pub async fn pause(&self) -> Result<(), ControlError> {
        self.control.pause(self.run_id).await
    }

    /// Stops the run.
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] if the runner refuses or cannot be
    /// reached.
    pub async fn stop(&self) -> Result<(), ControlError> {
        self.control.stop(self.run_id).await
    }

    /// Stops the driver task.
    pub async fn shutdown(self) {
        let _ = self.tx.send(DriverMsg::Shutdown);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "overlay driver ended abnormally");
        }
    }
}

/// Drives a [`RunOverlay`] from an event stream.
pub struct OverlayDriver;

impl OverlayDriver {
    /// Spawns a driver for the given overlay and returns its handle.
    #[must_use]
    pub fn spawn(
        overlay: RunOverlay,
        control: Arc<dyn ExecutionControl>,
        config: MonitorConfig,
    ) -> OverlayHandle {
        let run_id = overlay.run_id();
        let (tx, rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(view_of(&overlay, None, true));
        let task = tokio::spawn(run(overlay, config, view_tx, rx));
        OverlayHandle {
            tx,
            view_rx,
            control,
            run_id,
            task,
        }
    }
}

async fn run(
    mut overlay: RunOverlay,
    config: MonitorConfig,
    view_tx: watch::Sender<OverlayView>,
    mut rx: mpsc::UnboundedReceiver<DriverMsg>,
) {
    let mut dismiss_at: Option<Instant> = None;
    let mut visible = true;

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(DriverMsg::Event(event)) => {
                    let mut scroll_target = None;
                    for effect in overlay.apply(&event) {
                        match effect {
                            OverlayEffect::ScrollTo(node_id) => scroll_target = Some(node_id),
                            OverlayEffect::ScheduleDismiss => {
                                dismiss_at = Some(
                                    Instant::now()
                                        + Duration::from_millis(config.auto_dismiss_ms),
                                );
                            }
                            OverlayEffect::CancelDismiss => {
                                dismiss_at = None;
                                visible = true;
                            }
                        }
                    }
                    view_tx.send_replace(view_of(&overlay, scroll_target, visible));
                }
                Some(DriverMsg::Dismiss) => {
                    dismiss_at = None;
                    visible = false;
                    view_tx.send_replace(view_of(&overlay, None, visible));
                }
                Some(DriverMsg::Shutdown) | None => break,
            },
            () = sleep_until_opt(dismiss_at) => {
                dismiss_at = None;
                visible = false;
                view_tx.send_replace(view_of(&overlay, None, visible));
            }
        }
    }
}

fn view_of(overlay: &RunOverlay, scroll_target: Option<NodeId>, visible: bool) -> OverlayView {
    OverlayView {
        run_id: overlay.run_id(),
        statuses: overlay.statuses().collect(),
        active: overlay.active(),
        executing: overlay.is_executing(),
        scroll_target,
        visible,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
