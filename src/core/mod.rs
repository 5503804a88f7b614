//! Core game logic.
//!
//! This module contains:
//! - Credits: credit index and guest-appearance detection
//! - Connectivity: connectability checks and cached indices
//! - Universe: everything reachable from the board in one step
//! - Ranker: search result annotation and narrowing
//! - Game: the board state machine
//! - Requests: per-concern request sequencing
//! - Session: state container driving provider fetches

pub mod connectivity;
pub mod credits;
pub mod game;
pub mod ranker;
pub mod requests;
pub mod session;
pub mod universe;

// Re-export commonly used types
pub use connectivity::{
    connected_nodes, is_connectable_to_board, is_connectable_to_node, is_connectable_to_start_pair,
    try_is_connectable_to_node, ConnectableIndex, IndexScope,
};
pub use credits::{
    cast_of, credit_edges_of, ConnectivityError, CreditIndex, CreditView, GuestPredicate, PersonCredits,
    SubstringGuestPredicate, MISSING_ORDER,
};
pub use game::{
    AddOutcome, BoardLayout, Completion, ConnectedPath, GameError, GamePhase, GameState, WinPredicate,
};
pub use ranker::{rank, SUGGESTION_MIN_CHARS};
pub use requests::{Concern, RequestTicket, RequestTracker};
pub use session::{ActorSearch, GameSession, SelectedNode, SessionState};
pub use universe::{all_connectable, ConnectableUniverse};
