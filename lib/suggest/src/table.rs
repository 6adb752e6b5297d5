//! The static compatibility table.

use agentflow_canvas::{NodeCategory, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A candidate follow-up node with a confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The palette type of the candidate.
    pub node_type: NodeType,
    /// The category of the candidate.
    pub category: NodeCategory,
    /// Label shown in the suggestion chip.
    pub label: String,
    /// Why this candidate is being offered, shown alongside the chip.
    pub rationale: String,
    /// How strongly this candidate follows the current node, in 0..=1.
    pub confidence: f64,
}

impl Candidate {
    /// Creates an agent candidate.
    #[must_use]
    pub fn agent(node_type: &str, label: &str, rationale: &str, confidence: f64) -> Self {
        Self {
            node_type: NodeType::new(node_type),
            category: NodeCategory::Agent,
            label: label.to_owned(),
            rationale: rationale.to_owned(),
            confidence,
        }
    }

    /// Creates a tool candidate.
    #[must_use]
    pub fn tool(node_type: &str, label: &str, rationale: &str, confidence: f64) -> Self {
        Self {
            node_type: NodeType::new(node_type),
            category: NodeCategory::Tool,
            label: label.to_owned(),
            rationale: rationale.to_owned(),
            confidence,
        }
    }
}

/// Maps a node type to the candidates that commonly follow it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatibilityTable {
    /// Per-type candidate lists.
    pub entries: HashMap<NodeType, Vec<Candidate>>,
    /// Candidates offered when the current type has no entry.
    pub fallback: Vec<Candidate>,
}

impl CompatibilityTable {
    /// Looks up the candidate list for a node type, falling back to
    /// the default list when the type has no entry.
    #[must_use]
    pub fn candidates_for(&self, node_type: &NodeType) -> &[Candidate] {
        self.entries
            .get(node_type)
            .map_or(&self.fallback, Vec::as_slice)
    }

    /// The built-in table for the recruiting pipeline palette.
    #[must_use]
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            NodeType::new("sourcing"),
            vec![
                Candidate::agent(
                    "screening",
                    "Screening Agent",
                    "Sourced candidates usually go straight into screening",
                    0.92,
                ),
                Candidate::tool(
                    "email-tool",
                    "Email",
                    "Reach out to newly sourced candidates",
                    0.55,
                ),
                Candidate::tool(
                    "tracker-tool",
                    "Applicant Tracker",
                    "Log sourced candidates in the tracker",
                    0.50,
                ),
            ],
        );
        entries.insert(
            NodeType::new("screening"),
            vec![
                Candidate::agent(
                    "interview",
                    "Interview Agent",
                    "Screened candidates move on to interviews",
                    0.90,
                ),
                Candidate::tool(
                    "calendar-tool",
                    "Calendar",
                    "Book screening calls on the calendar",
                    0.60,
                ),
                Candidate::tool(
                    "email-tool",
                    "Email",
                    "Send screening results to candidates",
                    0.45,
                ),
            ],
        );
        entries.insert(
            NodeType::new("interview"),
            vec![
                Candidate::agent(
                    "compliance",
                    "Compliance Agent",
                    "Interviews feed the compliance review",
                    0.85,
                ),
                Candidate::agent(
                    "offer",
                    "Offer Agent",
                    "Strong interviews can go straight to an offer",
                    0.75,
                ),
                Candidate::tool(
                    "calendar-tool",
                    "Calendar",
                    "Schedule interview rounds on the calendar",
                    0.50,
                ),
            ],
        );
        entries.insert(
            NodeType::new("compliance"),
            vec![
                Candidate::agent(
                    "offer",
                    "Offer Agent",
                    "Cleared candidates proceed to an offer",
                    0.88,
                ),
                Candidate::tool(
                    "tracker-tool",
                    "Applicant Tracker",
                    "Record compliance outcomes in the tracker",
                    0.40,
                ),
            ],
        );
        entries.insert(
            NodeType::new("offer"),
            vec![
                Candidate::tool(
                    "email-tool",
                    "Email",
                    "Deliver the offer letter by email",
                    0.65,
                ),
                Candidate::tool(
                    "tracker-tool",
                    "Applicant Tracker",
                    "Mark the offer stage in the tracker",
                    0.60,
                ),
            ],
        );

        Self {
            entries,
            fallback: vec![
                Candidate::agent(
                    "sourcing",
                    "Sourcing Agent",
                    "Most pipelines start by sourcing candidates",
                    0.40,
                ),
                Candidate::agent(
                    "screening",
                    "Screening Agent",
                    "Screening is a common early pipeline stage",
                    0.35,
                ),
                Candidate::tool(
                    "email-tool",
                    "Email",
                    "Email fits almost every pipeline stage",
                    0.30,
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_type_has_an_entry() {
        let table = CompatibilityTable::builtin();
        let candidates = table.candidates_for(&NodeType::new("sourcing"));
        assert!(!candidates.is_empty());
        assert_eq!(candidates[0].node_type, NodeType::new("screening"));
    }

    #[test]
    fn every_candidate_carries_a_rationale() {
        let table = CompatibilityTable::builtin();
        let all = table.entries.values().flatten().chain(&table.fallback);
        for candidate in all {
            assert!(
                !candidate.rationale.is_empty(),
                "{} has no rationale",
                candidate.node_type
            );
        }
    }

    #[test]
    fn unknown_type_uses_fallback() {
        let table = CompatibilityTable::builtin();
        let candidates = table.candidates_for(&NodeType::new("mystery"));
        assert_eq!(candidates, table.fallback.as_slice());
    }
}
