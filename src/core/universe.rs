//! "Show everything connectable" aggregation over the whole board.
//!
//! Walks the credit edges of every node, so the result can be large (all
//! co-stars of all board members). It is recomputed on demand; callers
//! gate it behind an explicit toggle.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Board, Entity, EntityKey, MediaType};

use super::credits::edges;

/// Every entity connectable to at least one board node, partitioned by type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectableUniverse {
    pub people: Vec<Entity>,
    pub movies: Vec<Entity>,
    pub shows: Vec<Entity>,
    pub board_version: u64,
}

impl ConnectableUniverse {
    pub fn len(&self) -> usize {
        self.people.len() + self.movies.len() + self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn partition(&self, media_type: MediaType) -> &[Entity] {
        match media_type {
            MediaType::Person => &self.people,
            MediaType::Movie => &self.movies,
            MediaType::Show => &self.shows,
        }
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.partition(key.media_type).iter().any(|e| e.key() == *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.people.iter().chain(&self.movies).chain(&self.shows)
    }
}

fn sort_by_title(entities: &mut [Entity]) {
    entities.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.key().cmp(&b.key()))
    });
}

/// Union of everything connectable to any board node, deduplicated by key.
///
/// Each partition is sorted by title, case-insensitively. Nodes with
/// malformed credit data are skipped.
pub fn all_connectable(board: &Board) -> ConnectableUniverse {
    let mut found: HashMap<EntityKey, Entity> = HashMap::new();

    for node in board.nodes() {
        match edges(&node.entity) {
            Ok(node_edges) => {
                for edge in node_edges {
                    found
                        .entry(edge.key())
                        .or_insert_with(|| Entity::from_credit(edge));
                }
            }
            Err(e) => warn!(node = %node.key, "Skipping node in connectable universe: {}", e),
        }
    }

    let mut universe = ConnectableUniverse {
        board_version: board.version(),
        ..Default::default()
    };
    for (_, entity) in found {
        match entity.media_type {
            MediaType::Person => universe.people.push(entity),
            MediaType::Movie => universe.movies.push(entity),
            MediaType::Show => universe.shows.push(entity),
        }
    }
    sort_by_title(&mut universe.people);
    sort_by_title(&mut universe.movies);
    sort_by_title(&mut universe.shows);

    debug!(
        people = universe.people.len(),
        movies = universe.movies.len(),
        shows = universe.shows.len(),
        "Computed connectable universe"
    );
    universe
}
