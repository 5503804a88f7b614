//! Connectivity Integration Tests
//!
//! Symmetry, empty-board behavior, malformed data and derived indices.

mod common;

use connect_stars::core::{
    all_connectable, credit_edges_of, is_connectable_to_board, is_connectable_to_node,
    is_connectable_to_start_pair, try_is_connectable_to_node, ConnectableIndex, ConnectivityError,
};
use connect_stars::domain::{
    ActorSlot, Board, BoardNode, CreditRef, Entity, EntityKey, MediaType, Position, StartActors,
};

use common::{allen, forrest_gump, hanks, toy_story};

fn board_of(entities: Vec<Entity>) -> Board {
    let mut board = Board::new();
    for entity in entities {
        board.insert(BoardNode::new(entity, Position::default()));
    }
    board
}

#[test]
fn test_tom_hanks_connects_to_toy_story() {
    let toy_story_bare = Entity::movie(862, "Toy Story");
    assert!(is_connectable_to_node(&toy_story_bare, &hanks()));
}

#[test]
fn test_symmetry_when_only_person_lists_credit() {
    let person = Entity::person(1, "P").with_person_credits(vec![CreditRef::new(MediaType::Movie, 2, "M")], vec![]);
    let movie = Entity::movie(2, "M");

    assert!(is_connectable_to_node(&movie, &person));
    assert!(is_connectable_to_node(&person, &movie));
}

#[test]
fn test_symmetry_when_only_work_lists_credit() {
    let person = Entity::person(31, "Tom Hanks");
    assert!(is_connectable_to_node(&person, &toy_story()));
    assert!(is_connectable_to_node(&toy_story(), &person));
}

#[test]
fn test_same_kind_never_connects() {
    assert!(!is_connectable_to_node(&hanks(), &allen()));
    assert!(!is_connectable_to_node(&toy_story(), &forrest_gump()));
    assert!(!is_connectable_to_node(&hanks(), &hanks()));
}

#[test]
fn test_empty_board_accepts_anything() {
    let board = Board::new();
    assert!(is_connectable_to_board(&Entity::movie(1, "Anything"), &board));
    assert!(is_connectable_to_board(&Entity::person(2, "Anyone"), &board));
}

#[test]
fn test_board_connectability() {
    let board = board_of(vec![hanks()]);
    assert!(is_connectable_to_board(&Entity::movie(13, "Forrest Gump"), &board));
    assert!(!is_connectable_to_board(&Entity::movie(1, "Unrelated"), &board));
}

#[test]
fn test_start_pair_bootstrap() {
    let mut actors = StartActors::new();
    assert!(is_connectable_to_start_pair(&Entity::movie(1, "Anything"), &actors));

    actors.set(ActorSlot::Second, Some(allen()));
    assert!(is_connectable_to_start_pair(&Entity::show(1234, "Home Improvement"), &actors));
    assert!(!is_connectable_to_start_pair(&Entity::movie(13, "Forrest Gump"), &actors));
}

#[test]
fn test_malformed_entity_is_not_connectable() {
    // Person carrying a work-shaped credit block
    let malformed = Entity::person(31, "Broken").with_cast(vec![CreditRef::new(MediaType::Person, 1, "X")]);

    assert!(matches!(
        try_is_connectable_to_node(&malformed, &toy_story()),
        Err(ConnectivityError::MalformedCredits { .. })
    ));
    assert!(!is_connectable_to_node(&malformed, &toy_story()));

    // One bad node doesn't hide the good ones
    let board = board_of(vec![malformed, forrest_gump()]);
    assert!(is_connectable_to_board(&Entity::person(31, "Tom Hanks"), &board));
}

#[test]
fn test_credit_edges_idempotent() {
    let person = hanks();
    let first = credit_edges_of(&person).unwrap();
    let second = credit_edges_of(&person).unwrap();
    assert_eq!(first, second);
    // Most popular first
    assert_eq!(first.movies[0].id, 13);
}

#[test]
fn test_index_tracks_board_version() {
    let mut board = board_of(vec![hanks()]);
    let candidates = vec![Entity::movie(862, "Toy Story"), Entity::movie(1, "Unrelated")];

    let index = ConnectableIndex::for_board(&board, candidates.iter());
    assert!(index.is_connectable(&EntityKey::movie(862)));
    assert!(!index.is_connectable(&EntityKey::movie(1)));
    assert!(!index.is_stale(&board));

    board.insert(BoardNode::new(allen(), Position::default()));
    assert!(index.is_stale(&board));
}

#[test]
fn test_node_index() {
    let board = board_of(vec![hanks(), allen()]);
    let node = board.get(&EntityKey::person(12898)).unwrap();
    let candidates = vec![Entity::movie(862, "Toy Story"), Entity::movie(13, "Forrest Gump")];

    let index = ConnectableIndex::for_node(node, &board, candidates.iter());
    assert_eq!(index.connectable_keys(), vec![EntityKey::movie(862)]);
}

#[test]
fn test_universe_dedupes_and_partitions() {
    let board = board_of(vec![hanks(), allen()]);
    let universe = all_connectable(&board);

    // Toy Story is credited by both actors but listed once
    assert_eq!(
        universe
            .movies
            .iter()
            .filter(|m| m.key() == EntityKey::movie(862))
            .count(),
        1
    );
    assert_eq!(universe.movies.len(), 2);
    assert_eq!(universe.shows.len(), 1);
    assert!(universe.people.is_empty());
    assert_eq!(universe.board_version, board.version());
}
