//! Board state: placed nodes, their positions and the links between them.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKey};

/// Canvas coordinates of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// An entity placed on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardNode {
    pub key: EntityKey,
    pub entity: Entity,
    pub position: Position,
}

impl BoardNode {
    pub fn new(entity: Entity, position: Position) -> Self {
        Self {
            key: entity.key(),
            entity,
            position,
        }
    }
}

/// Undirected link between two board nodes; endpoints are stored in key order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: EntityKey,
    pub to: EntityKey,
}

impl Connection {
    pub fn new(a: EntityKey, b: EntityKey) -> Self {
        if a <= b {
            Self { from: a, to: b }
        } else {
            Self { from: b, to: a }
        }
    }

    pub fn touches(&self, key: &EntityKey) -> bool {
        self.from == *key || self.to == *key
    }

    /// The endpoint that is not `key`
    pub fn other(&self, key: &EntityKey) -> Option<EntityKey> {
        if self.from == *key {
            Some(self.to)
        } else if self.to == *key {
            Some(self.from)
        } else {
            None
        }
    }
}

/// The set of placed nodes.
///
/// Keys are unique. Insertion order is kept only for rendering z-order.
/// `version` changes whenever the node set (or a node's data) changes and
/// is what derived indices compare against to detect staleness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    nodes: IndexMap<EntityKey, BoardNode>,
    connections: Vec<Connection>,
    version: u64,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn get(&self, key: &EntityKey) -> Option<&BoardNode> {
        self.nodes.get(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &BoardNode> {
        self.nodes.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.nodes.keys()
    }

    /// Key → position mapping, in insertion order
    pub fn positions(&self) -> IndexMap<EntityKey, Position> {
        self.nodes
            .iter()
            .map(|(key, node)| (*key, node.position))
            .collect()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Insert a node; returns false (and changes nothing) if its key is present
    pub fn insert(&mut self, node: BoardNode) -> bool {
        if self.nodes.contains_key(&node.key) {
            return false;
        }
        self.nodes.insert(node.key, node);
        self.version += 1;
        true
    }

    /// Remove a node together with every connection touching it
    pub fn remove(&mut self, key: &EntityKey) -> Option<BoardNode> {
        let removed = self.nodes.shift_remove(key)?;
        self.connections.retain(|c| !c.touches(key));
        self.version += 1;
        Some(removed)
    }

    /// Replace the entity data of a node already on the board
    pub fn replace_entity(&mut self, entity: Entity) -> bool {
        match self.nodes.get_mut(&entity.key()) {
            Some(node) => {
                node.entity = entity;
                self.version += 1;
                true
            }
            None => false,
        }
    }

    pub fn set_position(&mut self, key: &EntityKey, position: Position) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Link two nodes; both must be on the board and distinct
    pub fn connect(&mut self, a: EntityKey, b: EntityKey) -> bool {
        if a == b || !self.contains(&a) || !self.contains(&b) {
            return false;
        }
        let connection = Connection::new(a, b);
        if self.connections.contains(&connection) {
            return false;
        }
        self.connections.push(connection);
        true
    }

    pub fn is_connected(&self, a: &EntityKey, b: &EntityKey) -> bool {
        self.connections.contains(&Connection::new(*a, *b))
    }

    pub fn neighbours<'a>(&'a self, key: &'a EntityKey) -> impl Iterator<Item = EntityKey> + 'a {
        self.connections.iter().filter_map(move |c| c.other(key))
    }

    /// Shortest chain of keys linking `from` to `to` over board connections
    pub fn shortest_path(&self, from: &EntityKey, to: &EntityKey) -> Option<Vec<EntityKey>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(vec![*from]);
        }

        let mut previous: IndexMap<EntityKey, EntityKey> = IndexMap::new();
        let mut seen: HashSet<EntityKey> = HashSet::from([*from]);
        let mut queue = VecDeque::from([*from]);

        while let Some(current) = queue.pop_front() {
            for next in self.neighbours(&current) {
                if !seen.insert(next) {
                    continue;
                }
                previous.insert(next, current);
                if next == *to {
                    let mut path = vec![next];
                    let mut cursor = next;
                    while let Some(prev) = previous.get(&cursor) {
                        path.push(*prev);
                        cursor = *prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }

        None
    }

    /// Drop every node and connection
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
        self.version += 1;
    }
}

/// One of the two start-actor slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorSlot {
    First,
    Second,
}

impl ActorSlot {
    pub const ALL: [ActorSlot; 2] = [ActorSlot::First, ActorSlot::Second];

    pub fn index(self) -> usize {
        match self {
            ActorSlot::First => 0,
            ActorSlot::Second => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            ActorSlot::First => ActorSlot::Second,
            ActorSlot::Second => ActorSlot::First,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ActorSlot::First),
            1 => Some(ActorSlot::Second),
            _ => None,
        }
    }
}

/// The two provisional start actors chosen before the game begins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartActors {
    slots: [Option<Entity>; 2],
}

impl StartActors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: ActorSlot) -> Option<&Entity> {
        self.slots[slot.index()].as_ref()
    }

    pub fn set(&mut self, slot: ActorSlot, actor: Option<Entity>) {
        self.slots[slot.index()] = actor;
    }

    /// Selected actors, in slot order
    pub fn selected(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().flatten()
    }

    pub fn count(&self) -> usize {
        self.selected().count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn both(&self) -> Option<(&Entity, &Entity)> {
        match &self.slots {
            [Some(a), Some(b)] => Some((a, b)),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.slots = [None, None];
    }
}
