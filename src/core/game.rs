//! Board state machine.
//!
//! Owns the board and the start-actor slots and enforces the game's
//! transitions:
//!
//! ```text
//! Empty -> Selecting -> Ready -> Playing -> Completed -> Playing (keep playing)
//!   ^                                                  \-> reset -> Empty
//! ```
//!
//! The win condition is a pluggable [`WinPredicate`]; by default a game is
//! won once board connections form a chain between the two start actors.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{ActorSlot, Board, BoardNode, Entity, EntityKey, MediaType, Position, StartActors};

use super::connectivity::connected_nodes;

/// Errors raised by game transitions. All are recoverable: the state is
/// left exactly as it was before the failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Actor {id} is already selected in the other slot")]
    DuplicateSelection { id: u64 },

    #[error("Cannot start game: {reason}")]
    InvalidStartState { reason: String },

    #[error("{key} is already on the board")]
    AlreadyPresent { key: EntityKey },

    #[error("{key} is not on the board")]
    NotOnBoard { key: EntityKey },

    #[error("{key} is a start actor and cannot be removed")]
    StartActorPinned { key: EntityKey },

    #[error("Metadata provider request failed: {message}")]
    ProviderFetch { message: String },
}

impl GameError {
    fn invalid_start(reason: impl Into<String>) -> Self {
        GameError::InvalidStartState {
            reason: reason.into(),
        }
    }
}

/// Where the game currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// No start actor chosen
    Empty,
    /// One start actor chosen
    Selecting,
    /// Two distinct start actors chosen, game not started
    Ready,
    /// Board seeded, nodes being added
    Playing,
    /// The start actors are linked
    Completed,
}

/// Hook deciding whether the board is a win
pub trait WinPredicate: fmt::Debug + Send + Sync {
    /// The winning chain of keys, if the board satisfies the win condition
    fn winning_path(&self, board: &Board, start: (&EntityKey, &EntityKey)) -> Option<Vec<EntityKey>>;
}

/// Won when board connections chain the two start actors together
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectedPath;

impl WinPredicate for ConnectedPath {
    fn winning_path(&self, board: &Board, start: (&EntityKey, &EntityKey)) -> Option<Vec<EntityKey>> {
        board.shortest_path(start.0, start.1)
    }
}

/// Record of a won game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub path: Vec<EntityKey>,
    pub completed_at: DateTime<Utc>,
    pub elapsed_seconds: i64,
}

impl Completion {
    /// Number of links in the winning chain
    pub fn path_length(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Initial and default node placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub start_positions: [Position; 2],
    pub default_position: Position,
    /// Offset applied per added node so new nodes don't stack exactly
    pub stagger: Position,
    /// Stagger wraps after this many nodes
    pub stagger_wrap: usize,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            start_positions: [Position::new(100.0, 100.0), Position::new(500.0, 100.0)],
            default_position: Position::new(300.0, 250.0),
            stagger: Position::new(30.0, 30.0),
            stagger_wrap: 10,
        }
    }
}

impl BoardLayout {
    /// Default position for the `n`th node added after the start actors
    pub fn position_for(&self, n: usize) -> Position {
        let step = (n % self.stagger_wrap.max(1)) as f64;
        self.default_position
            .offset(self.stagger.x * step, self.stagger.y * step)
    }
}

/// Result of a successful add
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddOutcome {
    pub key: EntityKey,
    /// Existing nodes the new node was linked to
    pub connected_to: Vec<EntityKey>,
    /// Whether this add completed the game
    pub completed: bool,
}

/// The game: start slots, board and completion state
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    start_actors: StartActors,
    started_at: Option<DateTime<Utc>>,
    completion: Option<Completion>,
    keep_playing: bool,
    layout: BoardLayout,
    win: Arc<dyn WinPredicate>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(BoardLayout::default())
    }
}

impl GameState {
    pub fn new(layout: BoardLayout) -> Self {
        Self {
            board: Board::new(),
            start_actors: StartActors::new(),
            started_at: None,
            completion: None,
            keep_playing: false,
            layout,
            win: Arc::new(ConnectedPath),
        }
    }

    /// Replace the win condition
    pub fn with_win_predicate(mut self, win: Arc<dyn WinPredicate>) -> Self {
        self.win = win;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn start_actors(&self) -> &StartActors {
        &self.start_actors
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn phase(&self) -> GamePhase {
        if self.is_started() {
            if self.completion.is_some() && !self.keep_playing {
                GamePhase::Completed
            } else {
                GamePhase::Playing
            }
        } else {
            match self.start_actors.count() {
                0 => GamePhase::Empty,
                1 => GamePhase::Selecting,
                _ => GamePhase::Ready,
            }
        }
    }

    fn start_keys(&self) -> Option<(EntityKey, EntityKey)> {
        self.start_actors.both().map(|(a, b)| (a.key(), b.key()))
    }

    fn is_start_actor(&self, key: &EntityKey) -> bool {
        self.is_started() && self.start_actors.selected().any(|a| a.key() == *key)
    }

    /// Fill or clear a start slot. Choosing the actor already in the other
    /// slot fails and leaves both slots untouched.
    pub fn select_start_actor(&mut self, slot: ActorSlot, actor: Option<Entity>) -> Result<(), GameError> {
        if self.is_started() {
            return Err(GameError::invalid_start("game already in progress"));
        }

        if let Some(ref actor) = actor {
            if actor.media_type != MediaType::Person {
                return Err(GameError::invalid_start(format!(
                    "{} is not a person",
                    actor.key()
                )));
            }
            if self
                .start_actors
                .get(slot.other())
                .is_some_and(|other| other.id == actor.id)
            {
                return Err(GameError::DuplicateSelection { id: actor.id });
            }
        }

        debug!(?slot, actor = ?actor.as_ref().map(|a| a.key()), "Start actor selected");
        self.start_actors.set(slot, actor);
        Ok(())
    }

    /// Seed the board with the two start actors at their fixed positions
    pub fn start_game(&mut self) -> Result<(), GameError> {
        if self.is_started() {
            return Err(GameError::invalid_start("game already in progress"));
        }

        let (first, second) = match self.start_actors.both() {
            Some((a, b)) => (a.clone(), b.clone()),
            None => return Err(GameError::invalid_start("two start actors are required")),
        };
        if first.id == second.id {
            return Err(GameError::invalid_start("start actors must be different"));
        }

        // Cleared in place so the version keeps counting across games
        self.board.clear();
        self.board.insert(BoardNode::new(first, self.layout.start_positions[0]));
        self.board.insert(BoardNode::new(second, self.layout.start_positions[1]));

        self.completion = None;
        self.keep_playing = false;
        self.started_at = Some(Utc::now());
        info!("Game started");
        Ok(())
    }

    /// Place a candidate on the board.
    ///
    /// Links it to every existing node it connects to, then re-checks the
    /// win condition against the updated board.
    pub fn add_to_board(&mut self, candidate: Entity, position: Option<Position>) -> Result<AddOutcome, GameError> {
        if !self.is_started() {
            return Err(GameError::invalid_start("game has not started"));
        }

        let key = candidate.key();
        if self.board.contains(&key) {
            return Err(GameError::AlreadyPresent { key });
        }

        let connected_to: Vec<EntityKey> = connected_nodes(&candidate, &self.board)
            .into_iter()
            .map(|node| node.key)
            .collect();

        let position = position.unwrap_or_else(|| {
            self.layout
                .position_for(self.board.len().saturating_sub(2))
        });
        self.board.insert(BoardNode::new(candidate, position));
        for other in &connected_to {
            self.board.connect(key, *other);
        }

        info!(%key, links = connected_to.len(), "Node added to board");
        let completed = self.check_completion();

        Ok(AddOutcome {
            key,
            connected_to,
            completed,
        })
    }

    /// Record a link confirmed outside the local credit data
    pub fn link(&mut self, a: EntityKey, b: EntityKey) -> bool {
        let linked = self.board.connect(a, b);
        if linked {
            debug!(%a, %b, "Linked nodes");
            self.check_completion();
        }
        linked
    }

    /// Remove a non-start node
    pub fn remove_from_board(&mut self, key: &EntityKey) -> Result<BoardNode, GameError> {
        if self.is_start_actor(key) {
            return Err(GameError::StartActorPinned { key: *key });
        }
        let node = self
            .board
            .remove(key)
            .ok_or(GameError::NotOnBoard { key: *key })?;
        info!(%key, "Node removed from board");
        Ok(node)
    }

    /// Swap in freshly fetched details for a node already on the board
    pub fn refresh_node(&mut self, entity: Entity) -> bool {
        self.board.replace_entity(entity)
    }

    pub fn update_node_position(&mut self, key: &EntityKey, position: Position) -> Result<(), GameError> {
        if self.board.set_position(key, position) {
            Ok(())
        } else {
            Err(GameError::NotOnBoard { key: *key })
        }
    }

    /// Evaluate the win condition against the current board.
    ///
    /// Returns whether the game is (now) completed.
    pub fn check_completion(&mut self) -> bool {
        if self.completion.is_some() {
            return true;
        }
        let (Some(started_at), Some((a, b))) = (self.started_at, self.start_keys()) else {
            return false;
        };

        match self.win.winning_path(&self.board, (&a, &b)) {
            Some(path) => {
                let completed_at = Utc::now();
                let completion = Completion {
                    path,
                    completed_at,
                    elapsed_seconds: (completed_at - started_at).num_seconds(),
                };
                info!(path_length = completion.path_length(), "Game completed");
                self.completion = Some(completion);
                true
            }
            None => false,
        }
    }

    /// Continue adding nodes after a win
    pub fn keep_playing(&mut self) -> Result<(), GameError> {
        if self.completion.is_none() {
            return Err(GameError::invalid_start("game is not completed"));
        }
        self.keep_playing = true;
        Ok(())
    }

    /// Back to `Empty`, keeping layout and win predicate
    pub fn reset(&mut self) {
        let mut board = std::mem::replace(&mut self.board, Board::new());
        board.clear();
        *self = Self::new(self.layout.clone()).with_win_predicate(Arc::clone(&self.win));
        self.board = board;
        info!("Game reset");
    }
}
