//! Core domain types and utilities for the agentflow platform.
//!
//! This crate provides the foundational types, error handling, and shared
//! utilities used throughout the agentflow pipeline composer.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{EdgeId, FlowId, NodeId, ParseIdError, RunId, SuggestionId, UserId};
