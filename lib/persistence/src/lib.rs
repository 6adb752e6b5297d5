//! Snapshot persistence for the flow canvas.
//!
//! This crate saves and restores [`FlowSnapshot`](agentflow_canvas::FlowSnapshot)
//! documents. It provides:
//!
//! - **Snapshot Stores**: A [`SnapshotStore`] port with a remote HTTP
//!   implementation and a local SQLite implementation
//! - **Backend Selection**: Per-save routing to the remote store when a
//!   user session is present, falling back to local otherwise
//! - **Auto-Save Pipeline**: A debounced, single-flight background save
//!   loop publishing its status over a watch channel

pub mod config;
pub mod error;
pub mod local;
pub mod pipeline;
pub mod remote;
pub mod store;

pub use config::{AutoSaveConfig, PersistenceConfig};
pub use error::StoreError;
pub use local::LocalStore;
pub use pipeline::{AutoSaveHandle, AutoSavePipeline, SaveStatus};
pub use remote::RemoteStore;
pub use store::{BackendKind, SaveRecord, SessionProvider, SnapshotStore, StoreSelector};
