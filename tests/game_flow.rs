//! Game Flow Integration Tests
//!
//! The board state machine end to end, without a provider.

mod common;

use connect_stars::core::{
    is_connectable_to_board, BoardLayout, ConnectableIndex, GameError, GamePhase, GameState,
};
use connect_stars::domain::{ActorSlot, Entity, EntityKey, Position};

use common::{allen, forrest_gump, hanks, toy_story};

fn started() -> GameState {
    let mut game = GameState::default();
    game.select_start_actor(ActorSlot::First, Some(hanks())).unwrap();
    game.select_start_actor(ActorSlot::Second, Some(allen())).unwrap();
    game.start_game().unwrap();
    game
}

#[test]
fn test_same_actor_in_both_slots() {
    let mut game = GameState::default();
    game.select_start_actor(ActorSlot::First, Some(Entity::person(101, "Same")))
        .unwrap();

    let result = game.select_start_actor(ActorSlot::Second, Some(Entity::person(101, "Same")));
    assert_eq!(result, Err(GameError::DuplicateSelection { id: 101 }));
    assert_eq!(game.phase(), GamePhase::Selecting);
    assert!(game.board().is_empty());

    assert!(matches!(
        game.start_game(),
        Err(GameError::InvalidStartState { .. })
    ));
}

#[test]
fn test_non_person_start_actor_rejected() {
    let mut game = GameState::default();
    let result = game.select_start_actor(ActorSlot::First, Some(toy_story()));
    assert!(matches!(result, Err(GameError::InvalidStartState { .. })));
    assert_eq!(game.phase(), GamePhase::Empty);
}

#[test]
fn test_start_uses_configured_layout() {
    let layout = BoardLayout {
        start_positions: [Position::new(0.0, 0.0), Position::new(900.0, 0.0)],
        ..BoardLayout::default()
    };
    let mut game = GameState::new(layout);
    game.select_start_actor(ActorSlot::First, Some(hanks())).unwrap();
    game.select_start_actor(ActorSlot::Second, Some(allen())).unwrap();
    game.start_game().unwrap();

    let positions = game.board().positions();
    assert_eq!(positions[&EntityKey::person(12898)], Position::new(900.0, 0.0));
    assert!(game.start_game().is_err());
}

#[test]
fn test_add_present_key_leaves_board_unchanged() {
    let mut game = started();
    game.add_to_board(forrest_gump(), None).unwrap();
    let version = game.board().version();

    let result = game.add_to_board(forrest_gump(), Some(Position::new(1.0, 1.0)));
    assert_eq!(result, Err(GameError::AlreadyPresent { key: EntityKey::movie(13) }));
    assert_eq!(game.board().len(), 3);
    assert_eq!(game.board().version(), version);
}

#[test]
fn test_dead_end_node_does_not_complete() {
    let mut game = started();
    let outcome = game.add_to_board(forrest_gump(), Some(Position::new(42.0, 7.0))).unwrap();

    assert_eq!(outcome.connected_to, vec![EntityKey::person(31)]);
    assert!(!outcome.completed);
    assert_eq!(game.phase(), GamePhase::Playing);
    assert_eq!(game.board().positions()[&EntityKey::movie(13)], Position::new(42.0, 7.0));
}

#[test]
fn test_completion_records_path() {
    let mut game = started();
    game.add_to_board(forrest_gump(), None).unwrap();
    let outcome = game.add_to_board(toy_story(), None).unwrap();

    assert!(outcome.completed);
    let completion = game.completion().unwrap();
    assert_eq!(
        completion.path,
        vec![EntityKey::person(31), EntityKey::movie(862), EntityKey::person(12898)]
    );
    assert!(completion.elapsed_seconds >= 0);
}

#[test]
fn test_removal_drops_connections() {
    let mut game = started();
    game.add_to_board(toy_story(), None).unwrap();
    assert_eq!(game.board().connections().len(), 2);

    game.remove_from_board(&EntityKey::movie(862)).unwrap();
    assert!(game.board().connections().is_empty());
    // A recorded win stays recorded
    assert!(game.completion().is_some());
}

#[test]
fn test_reset_atomicity() {
    let mut game = started();
    game.add_to_board(toy_story(), None).unwrap();
    game.reset();

    assert_eq!(game.board().len(), 0);
    assert!(game.board().positions().is_empty());
    assert!(game.board().connections().is_empty());
    assert!(game.completion().is_none());
    assert!(game.started_at().is_none());
    assert!(is_connectable_to_board(&Entity::person(9, "Anyone"), game.board()));
    assert_eq!(game.phase(), GamePhase::Empty);
}

#[test]
fn test_index_from_previous_game_is_stale() {
    let mut game = started();
    let candidates = vec![toy_story()];
    let index = ConnectableIndex::for_board(game.board(), candidates.iter());
    assert!(index.is_connectable(&EntityKey::movie(862)));

    game.reset();
    assert!(index.is_stale(game.board()));

    game.select_start_actor(ActorSlot::First, Some(Entity::person(500, "Someone")))
        .unwrap();
    game.select_start_actor(ActorSlot::Second, Some(Entity::person(501, "Someone Else")))
        .unwrap();
    game.start_game().unwrap();

    // Same node count as the old game, but a different board
    assert_eq!(game.board().len(), 2);
    assert!(index.is_stale(game.board()));
}
