//! Execution monitoring overlay for the flow canvas.
//!
//! While a flow runs, the canvas shows a read-only overlay of per-node
//! progress. This crate provides:
//!
//! - **Run Events**: The event stream a running flow emits
//! - **Run Overlay**: A pure state machine over a node set frozen at
//!   run start, with monotonic per-node status and effect emission
//! - **Overlay Driver**: A background task that owns the auto-dismiss
//!   timer and publishes overlay views over a watch channel
//! - **Execution Control**: A port for pausing or stopping a run

pub mod config;
pub mod control;
pub mod driver;
pub mod event;
pub mod overlay;

pub use config::MonitorConfig;
pub use control::{ControlError, ExecutionControl};
pub use driver::{OverlayDriver, OverlayHandle, OverlayView};
pub use event::{NodeRunStatus, RunEvent};
pub use overlay::{OverlayEffect, RunOverlay};
