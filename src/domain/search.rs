//! Search query state produced by the ranker.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKey};

/// A search result annotated with whether it connects to the current board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub entity: Entity,
    pub connectable: bool,
}

impl RankedResult {
    pub fn key(&self) -> EntityKey {
        self.entity.key()
    }
}

/// Outcome of one submitted query.
///
/// Each submission produces a fresh state that replaces the previous one;
/// states are never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQueryState {
    pub raw_term: String,
    pub normalized_term: String,
    pub results: Vec<RankedResult>,
    pub exact_match: Option<RankedResult>,
    /// "Did you mean" title
    pub suggestion: Option<String>,
    pub no_match_found: bool,
}

impl SearchQueryState {
    /// State for an emptied search input
    pub fn cleared() -> Self {
        Self::default()
    }

    /// State after a query the provider could not answer
    pub fn no_match(raw_term: &str) -> Self {
        Self {
            raw_term: raw_term.to_string(),
            normalized_term: normalize_term(raw_term),
            no_match_found: true,
            ..Self::default()
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.raw_term.is_empty() && self.results.is_empty() && !self.no_match_found
    }

    /// Split results into (connectable, not connectable), keeping order
    pub fn partition(&self) -> (Vec<&RankedResult>, Vec<&RankedResult>) {
        self.results.iter().partition(|r| r.connectable)
    }

    pub fn find(&self, key: &EntityKey) -> Option<&RankedResult> {
        self.results.iter().find(|r| r.key() == *key)
    }
}

/// Lower-cased, whitespace-trimmed query term
pub fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}
