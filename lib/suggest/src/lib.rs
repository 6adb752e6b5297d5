//! Next-node suggestions for the flow canvas.
//!
//! When a node is selected, the canvas offers a short list of nodes
//! that commonly follow it. This crate provides:
//!
//! - **Compatibility Table**: A static mapping from node type to ranked
//!   follow-up candidates, with a fallback list for unknown types
//! - **Ranker Port**: A [`SuggestionRanker`] trait with a table-backed
//!   implementation that simulates lookup latency
//! - **Suggestion Engine**: A background task that re-ranks on every
//!   selection change, discards stale results, and publishes the top
//!   suggestions over a watch channel

pub mod config;
pub mod engine;
pub mod ranker;
pub mod table;

pub use config::SuggestConfig;
pub use engine::{Suggestion, SuggestionEngine, SuggestionHandle};
pub use ranker::{SuggestError, SuggestionContext, SuggestionRanker, TableRanker};
pub use table::{Candidate, CompatibilityTable};
