//! The editor session.
//!
//! [`EditorSession`] is the seam between the canvas state engine and
//! the services around it: every accepted graph mutation fans out to
//! the auto-save pipeline, selection changes drive the suggestion
//! engine, and starting a run freezes the node set into an execution
//! overlay.

pub mod config;
pub mod session;

pub use config::EditorConfig;
pub use session::EditorSession;
