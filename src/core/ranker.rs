//! Search result ranking: connectability annotation, exact-match
//! narrowing and "did you mean" suggestions.

use tracing::debug;

use crate::domain::{normalize_term, Board, Entity, RankedResult, SearchQueryState, StartActors};

use super::connectivity::{is_connectable_to_board, is_connectable_to_start_pair};

/// Terms must be longer than this many characters to get a suggestion
pub const SUGGESTION_MIN_CHARS: usize = 3;

/// Rank raw provider results for `query_term`.
///
/// Provider order is preserved. Each result is annotated against the board,
/// or against the start actors while the board is still empty. An exact
/// title match (trimmed, case-insensitive) suppresses every other result.
pub fn rank(
    raw_results: Vec<Entity>,
    query_term: &str,
    board: &Board,
    start_actors: &StartActors,
) -> SearchQueryState {
    let normalized_term = normalize_term(query_term);

    if raw_results.is_empty() {
        return SearchQueryState::no_match(query_term);
    }

    let results: Vec<RankedResult> = raw_results
        .into_iter()
        .map(|entity| {
            let connectable = if board.is_empty() {
                is_connectable_to_start_pair(&entity, start_actors)
            } else {
                is_connectable_to_board(&entity, board)
            };
            RankedResult { entity, connectable }
        })
        .collect();

    let exact_match = results
        .iter()
        .find(|r| r.entity.title.trim().to_lowercase() == normalized_term)
        .cloned();

    if let Some(exact) = exact_match {
        debug!(key = %exact.key(), "Exact match narrows results");
        return SearchQueryState {
            raw_term: query_term.to_string(),
            normalized_term,
            results: vec![exact.clone()],
            exact_match: Some(exact),
            suggestion: None,
            no_match_found: false,
        };
    }

    let suggestion = if normalized_term.chars().count() > SUGGESTION_MIN_CHARS {
        results
            .first()
            .map(|top| top.entity.title.clone())
            .filter(|title| title.trim().to_lowercase() != normalized_term)
    } else {
        None
    };

    SearchQueryState {
        raw_term: query_term.to_string(),
        normalized_term,
        results,
        exact_match: None,
        suggestion,
        no_match_found: false,
    }
}
