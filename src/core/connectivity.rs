//! Connectivity evaluation between candidates and the board.
//!
//! A person connects to a movie or show when either side's credits name
//! the other. People never connect to people directly, nor works to works.
//! Guest appearances count as connections; the flag only affects display.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Board, BoardNode, Entity, EntityKey, StartActors};

use super::credits::{references, validate, ConnectivityError};

fn can_link(a: &Entity, b: &Entity) -> bool {
    a.media_type.is_work() != b.media_type.is_work()
}

/// Checked form of [`is_connectable_to_node`]; surfaces malformed data
pub fn try_is_connectable_to_node(candidate: &Entity, node: &Entity) -> Result<bool, ConnectivityError> {
    validate(candidate)?;
    validate(node)?;

    if candidate.key() == node.key() || !can_link(candidate, node) {
        return Ok(false);
    }

    Ok(references(candidate, &node.key())? || references(node, &candidate.key())?)
}

/// Does `candidate` share a credit with `node`?
///
/// Malformed entity data is logged and treated as "not connectable" so one
/// bad record never blocks evaluation of the rest.
pub fn is_connectable_to_node(candidate: &Entity, node: &Entity) -> bool {
    match try_is_connectable_to_node(candidate, node) {
        Ok(connectable) => connectable,
        Err(e) => {
            warn!(candidate = %candidate.key(), node = %node.key(), "Connectivity evaluation failed: {}", e);
            false
        }
    }
}

/// True when the board is empty or the candidate connects to any node
pub fn is_connectable_to_board(candidate: &Entity, board: &Board) -> bool {
    board.is_empty()
        || board
            .nodes()
            .any(|node| is_connectable_to_node(candidate, &node.entity))
}

/// Bootstrap query used before the board exists.
///
/// With no start actor selected every candidate is connectable; otherwise
/// the candidate must connect to at least one of the selected actors.
pub fn is_connectable_to_start_pair(candidate: &Entity, start_actors: &StartActors) -> bool {
    if start_actors.is_empty() {
        return true;
    }
    start_actors
        .selected()
        .any(|actor| is_connectable_to_node(candidate, actor))
}

/// Board nodes the candidate connects to, in board order
pub fn connected_nodes<'a>(candidate: &Entity, board: &'a Board) -> Vec<&'a BoardNode> {
    board
        .nodes()
        .filter(|node| is_connectable_to_node(candidate, &node.entity))
        .collect()
}

/// What a [`ConnectableIndex`] was computed against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "key", rename_all = "snake_case")]
pub enum IndexScope {
    /// Connectable to one selected board node
    Node(EntityKey),
    /// Connectable to any board node
    Board,
}

/// Cached key → connectable answers for a set of candidates.
///
/// Derived data only: built from a board snapshot and tagged with the
/// board version it saw, so [`ConnectableIndex::is_stale`] can tell when
/// it needs rebuilding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectableIndex {
    scope: IndexScope,
    board_version: u64,
    everything_connectable: bool,
    entries: HashMap<EntityKey, bool>,
}

impl ConnectableIndex {
    /// Connectability of each candidate to one node of the board
    pub fn for_node<'a>(
        node: &BoardNode,
        board: &Board,
        candidates: impl IntoIterator<Item = &'a Entity>,
    ) -> Self {
        let entries: HashMap<EntityKey, bool> = candidates
            .into_iter()
            .map(|c| (c.key(), is_connectable_to_node(c, &node.entity)))
            .collect();
        debug!(node = %node.key, candidates = entries.len(), "Rebuilt node connectable index");

        Self {
            scope: IndexScope::Node(node.key),
            board_version: board.version(),
            everything_connectable: false,
            entries,
        }
    }

    /// Connectability of each candidate to the board as a whole
    pub fn for_board<'a>(board: &Board, candidates: impl IntoIterator<Item = &'a Entity>) -> Self {
        let entries: HashMap<EntityKey, bool> = candidates
            .into_iter()
            .map(|c| (c.key(), is_connectable_to_board(c, board)))
            .collect();
        debug!(candidates = entries.len(), version = board.version(), "Rebuilt board connectable index");

        Self {
            scope: IndexScope::Board,
            board_version: board.version(),
            everything_connectable: board.is_empty(),
            entries,
        }
    }

    pub fn scope(&self) -> &IndexScope {
        &self.scope
    }

    pub fn board_version(&self) -> u64 {
        self.board_version
    }

    /// Unknown keys are not connectable, except on an empty board
    pub fn is_connectable(&self, key: &EntityKey) -> bool {
        self.everything_connectable || self.entries.get(key).copied().unwrap_or(false)
    }

    pub fn is_stale(&self, board: &Board) -> bool {
        self.board_version != board.version()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys answered "connectable", sorted
    pub fn connectable_keys(&self) -> Vec<EntityKey> {
        let mut keys: Vec<EntityKey> = self
            .entries
            .iter()
            .filter(|(_, connectable)| **connectable)
            .map(|(key, _)| *key)
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActorSlot, CreditRef, MediaType, Position};

    fn hanks() -> Entity {
        Entity::person(31, "Tom Hanks").with_person_credits(
            vec![CreditRef::new(MediaType::Movie, 862, "Toy Story")],
            vec![CreditRef::new(MediaType::Show, 1668, "Friends").with_character("Guest")],
        )
    }

    fn board_with(entities: Vec<Entity>) -> Board {
        let mut board = Board::new();
        for entity in entities {
            board.insert(BoardNode::new(entity, Position::default()));
        }
        board
    }

    #[test]
    fn test_movie_connects_to_person_node() {
        assert!(is_connectable_to_node(&Entity::movie(862, "Toy Story"), &hanks()));
        assert!(!is_connectable_to_node(&Entity::movie(13, "Forrest Gump"), &hanks()));
    }

    #[test]
    fn test_same_numeric_id_different_type_does_not_connect() {
        assert!(!is_connectable_to_node(&Entity::show(862, "Not Toy Story"), &hanks()));
    }

    #[test]
    fn test_guest_appearance_still_connects() {
        assert!(is_connectable_to_node(&Entity::show(1668, "Friends"), &hanks()));
    }

    #[test]
    fn test_people_do_not_connect_directly() {
        let other = Entity::person(2, "Tim Allen").with_person_credits(
            vec![CreditRef::new(MediaType::Movie, 862, "Toy Story")],
            vec![],
        );
        assert!(!is_connectable_to_node(&other, &hanks()));
    }

    #[test]
    fn test_entity_never_connects_to_itself() {
        assert!(!is_connectable_to_node(&hanks(), &hanks()));
    }

    #[test]
    fn test_malformed_entity_is_not_connectable() {
        let broken = Entity::movie(862, "Toy Story").with_person_credits(vec![], vec![]);
        assert!(try_is_connectable_to_node(&broken, &hanks()).is_err());
        assert!(!is_connectable_to_node(&broken, &hanks()));
    }

    #[test]
    fn test_empty_board_connects_everything() {
        let board = Board::new();
        assert!(is_connectable_to_board(&Entity::movie(1, "Anything"), &board));
    }

    #[test]
    fn test_connected_nodes_lists_matches() {
        let toy_story = Entity::movie(862, "Toy Story")
            .with_cast(vec![CreditRef::new(MediaType::Person, 2, "Tim Allen")]);
        let board = board_with(vec![hanks(), toy_story, Entity::person(3, "Unrelated")]);

        let allen = Entity::person(2, "Tim Allen");
        let matches: Vec<EntityKey> = connected_nodes(&allen, &board).iter().map(|n| n.key).collect();
        assert_eq!(matches, vec![EntityKey::movie(862)]);
    }

    #[test]
    fn test_start_pair() {
        let mut actors = StartActors::new();
        assert!(is_connectable_to_start_pair(&Entity::movie(1, "Anything"), &actors));

        actors.set(ActorSlot::First, Some(hanks()));
        assert!(is_connectable_to_start_pair(&Entity::movie(862, "Toy Story"), &actors));
        assert!(!is_connectable_to_start_pair(&Entity::movie(1, "Anything"), &actors));
    }

    #[test]
    fn test_index_staleness() {
        let mut board = board_with(vec![hanks()]);
        let candidates = vec![Entity::movie(862, "Toy Story"), Entity::movie(1, "Other")];
        let index = ConnectableIndex::for_board(&board, &candidates);

        assert!(index.is_connectable(&EntityKey::movie(862)));
        assert!(!index.is_connectable(&EntityKey::movie(1)));
        assert!(!index.is_stale(&board));

        board.insert(BoardNode::new(Entity::movie(1, "Other"), Position::default()));
        assert!(index.is_stale(&board));
    }

    #[test]
    fn test_node_index_scope() {
        let board = board_with(vec![hanks()]);
        let node = board.get(&EntityKey::person(31)).unwrap();
        let candidates = vec![Entity::movie(862, "Toy Story"), Entity::show(1668, "Friends")];
        let index = ConnectableIndex::for_node(node, &board, &candidates);

        assert_eq!(index.scope(), &IndexScope::Node(EntityKey::person(31)));
        assert_eq!(
            index.connectable_keys(),
            vec![EntityKey::movie(862), EntityKey::show(1668)]
        );
    }
}
