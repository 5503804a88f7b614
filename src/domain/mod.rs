//! Domain types for the connectivity engine.
//!
//! This module contains the core data structures:
//! - Entity: Normalized people, movies and shows with composite keys
//! - Board: Placed nodes, positions, connections and start-actor slots
//! - Search: Ranked search results and query state

pub mod board;
pub mod entity;
pub mod search;

// Re-export commonly used types
pub use board::{ActorSlot, Board, BoardNode, Connection, Position, StartActors};
pub use entity::{normalize, normalize_tagged, CreditRef, Credits, Entity, EntityKey, MediaType, NormalizeError};
pub use search::{normalize_term, RankedResult, SearchQueryState};
