//! The ranking port and its table-backed implementation.

use crate::table::{Candidate, CompatibilityTable};
use agentflow_canvas::NodeType;
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use tokio::time::Duration;

/// What suggestions are being ranked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionContext {
    /// The type of the selected node.
    pub current: NodeType,
    /// Node types already present on the canvas. Candidates of these
    /// types are never suggested.
    pub present: HashSet<NodeType>,
}

/// Errors from a ranking backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestError {
    /// Why ranking failed.
    pub message: String,
}

impl fmt::Display for SuggestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "suggestion ranking failed: {}", self.message)
    }
}

impl std::error::Error for SuggestError {}

/// Produces ranked follow-up candidates for a selection.
#[async_trait]
pub trait SuggestionRanker: Send + Sync {
    /// Ranks candidates for the given context, best first.
    async fn rank(&self, context: &SuggestionContext) -> Result<Vec<Candidate>, SuggestError>;
}

/// Drops candidates whose type is already on the canvas and orders the
/// rest best first.
#[must_use]
pub fn filter_and_sort(pool: &[Candidate], present: &HashSet<NodeType>) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = pool
        .iter()
        .filter(|candidate| !present.contains(&candidate.node_type))
        .cloned()
        .collect();
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}

/// Ranker over the static compatibility table.
pub struct TableRanker {
    table: CompatibilityTable,
    latency: Duration,
}

impl TableRanker {
    /// Creates a ranker that answers after a simulated lookup latency.
    #[must_use]
    pub fn new(table: CompatibilityTable, latency: Duration) -> Self {
        Self { table, latency }
    }
}

#[async_trait]
impl SuggestionRanker for TableRanker {
    async fn rank(&self, context: &SuggestionContext) -> Result<Vec<Candidate>, SuggestError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut candidates =
            filter_and_sort(self.table.candidates_for(&context.current), &context.present);
        if candidates.is_empty() {
            // The fallback is subject to the same filter; an empty
            // result is legitimate.
            candidates = filter_and_sort(&self.table.fallback, &context.present);
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(current: &str, present: &[&str]) -> SuggestionContext {
        SuggestionContext {
            current: NodeType::new(current),
            present: present.iter().map(|name| NodeType::new(*name)).collect(),
        }
    }

    fn ranker() -> TableRanker {
        TableRanker::new(CompatibilityTable::builtin(), Duration::ZERO)
    }

    #[tokio::test]
    async fn present_types_are_filtered_out() {
        let ranked = ranker()
            .rank(&context("sourcing", &["sourcing", "screening"]))
            .await
            .expect("rank");

        assert!(
            ranked
                .iter()
                .all(|candidate| candidate.node_type != NodeType::new("screening"))
        );
        assert!(!ranked.is_empty());
    }

    #[tokio::test]
    async fn results_come_best_first() {
        let ranked = ranker()
            .rank(&context("interview", &["interview"]))
            .await
            .expect("rank");

        for pair in ranked.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        assert_eq!(ranked[0].node_type, NodeType::new("compliance"));
    }

    #[tokio::test]
    async fn exhausted_entry_falls_back() {
        // Everything that follows compliance is already on the canvas;
        // the fallback list fills the gap, still filtered.
        let ranked = ranker()
            .rank(&context("compliance", &["compliance", "offer", "tracker-tool"]))
            .await
            .expect("rank");

        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].node_type, NodeType::new("sourcing"));
    }

    #[tokio::test]
    async fn fallback_is_filtered_too() {
        // Everything in the fallback list is already on the canvas, so
        // an unknown type legitimately yields nothing.
        let ranked = ranker()
            .rank(&context(
                "mystery",
                &["sourcing", "screening", "email-tool"],
            ))
            .await
            .expect("rank");
        assert!(ranked.is_empty());
    }
}
