//! connect-stars - connectivity engine for the Connect The Stars game
//!
//! Players link two start actors by placing the movies, shows and people
//! that connect them onto a board. This crate decides what connects to
//! what, ranks search results against the board, and runs the game's
//! state machine.
//!
//! # Architecture
//!
//! - Entities are normalized once at the provider boundary
//! - Connectivity is pure: computed from credit data, never stored
//! - Derived indices carry the board version they were built from
//! - One session container owns all mutable state; provider responses
//!   apply last-write-wins per concern
//!
//! # Modules
//!
//! - `adapters`: Metadata provider trait and the TMDB client
//! - `core`: Credits, connectivity, ranking, game state and session
//! - `domain`: Data structures (Entity, Board, SearchQueryState)
//! - `config`: YAML config discovery with env overrides
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Search
//! connect-stars search "inception"
//!
//! # Does Tom Hanks connect to Toy Story?
//! connect-stars connects person-31 movie-862
//!
//! # Scripted game
//! connect-stars play --first 31 --second 12898 movie-862
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{MetadataProvider, TmdbClient};
pub use core::{GameError, GamePhase, GameSession, GameState};
pub use domain::{Board, Entity, EntityKey, MediaType, SearchQueryState};
