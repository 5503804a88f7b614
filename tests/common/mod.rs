//! Shared fixtures: a small movie universe and an in-memory provider.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Notify;

use connect_stars::adapters::{MetadataProvider, PersonPage};
use connect_stars::domain::{CreditRef, Entity, EntityKey, MediaType};

pub fn hanks() -> Entity {
    Entity::person(31, "Tom Hanks").with_person_credits(
        vec![
            CreditRef::new(MediaType::Movie, 862, "Toy Story").with_popularity(80.0),
            CreditRef::new(MediaType::Movie, 13, "Forrest Gump").with_popularity(90.0),
        ],
        vec![],
    )
}

pub fn allen() -> Entity {
    Entity::person(12898, "Tim Allen").with_person_credits(
        vec![CreditRef::new(MediaType::Movie, 862, "Toy Story")],
        vec![CreditRef::new(MediaType::Show, 1234, "Home Improvement")],
    )
}

pub fn toy_story() -> Entity {
    Entity::movie(862, "Toy Story").with_cast(vec![
        CreditRef::new(MediaType::Person, 31, "Tom Hanks").with_order(0),
        CreditRef::new(MediaType::Person, 12898, "Tim Allen").with_order(1),
    ])
}

pub fn forrest_gump() -> Entity {
    Entity::movie(13, "Forrest Gump")
        .with_cast(vec![CreditRef::new(MediaType::Person, 31, "Tom Hanks").with_order(0)])
}

/// Show whose local cast data doesn't list Tom Hanks
pub fn anthology() -> Entity {
    Entity::show(5000, "Anthology")
        .with_aggregate_cast(vec![CreditRef::new(MediaType::Person, 77, "Someone Else").with_episodes(10)])
}

/// Provider answering from in-memory tables
#[derive(Default)]
pub struct FakeProvider {
    entities: HashMap<EntityKey, Entity>,
    searches: HashMap<String, Vec<Entity>>,
    failing_searches: HashSet<String>,
    people: HashMap<(String, u32), PersonPage>,
    random: Mutex<VecDeque<Entity>>,
    show_casts: HashMap<u64, Vec<u64>>,
    gates: HashMap<String, Arc<Notify>>,
    detail_gates: HashMap<EntityKey, Arc<Notify>>,
    guest_gate: Option<Arc<Notify>>,
    fail_details: bool,
    pub guest_checks: AtomicUsize,
    pub detail_fetches: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
            .with_entity(hanks())
            .with_entity(allen())
            .with_entity(toy_story())
            .with_entity(forrest_gump())
            .with_entity(anthology())
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.insert(entity.key(), entity);
        self
    }

    pub fn with_search(mut self, term: &str, results: Vec<Entity>) -> Self {
        self.searches.insert(term.to_lowercase(), results);
        self
    }

    pub fn with_failing_search(mut self, term: &str) -> Self {
        self.failing_searches.insert(term.to_lowercase());
        self
    }

    /// The search for `term` blocks until the returned handle is notified
    pub fn with_gated_search(mut self, term: &str, results: Vec<Entity>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gates.insert(term.to_lowercase(), Arc::clone(&gate));
        self.searches.insert(term.to_lowercase(), results);
        (self, gate)
    }

    /// Detail fetches for `key` block until the returned handle is notified
    pub fn with_gated_details(mut self, key: EntityKey) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.detail_gates.insert(key, Arc::clone(&gate));
        (self, gate)
    }

    /// Every show-cast check blocks until the returned handle is notified
    pub fn with_gated_guest_checks(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.guest_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn with_people_page(mut self, term: &str, page: u32, total_pages: u32, results: Vec<Entity>) -> Self {
        self.people.insert(
            (term.to_lowercase(), page),
            PersonPage {
                results,
                page,
                total_pages,
            },
        );
        self
    }

    pub fn with_random(self, picks: Vec<Entity>) -> Self {
        if let Ok(mut queue) = self.random.lock() {
            queue.extend(picks);
        }
        self
    }

    pub fn with_show_cast(mut self, show_id: u64, actor_ids: Vec<u64>) -> Self {
        self.show_casts.insert(show_id, actor_ids);
        self
    }

    pub fn failing_details(mut self) -> Self {
        self.fail_details = true;
        self
    }

    async fn lookup(&self, key: EntityKey) -> Result<Entity> {
        if let Some(gate) = self.detail_gates.get(&key) {
            gate.notified().await;
        }
        self.detail_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_details {
            return Err(anyhow!("provider unavailable"));
        }
        self.entities
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("{} not found", key))
    }
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_random_person(&self) -> Result<Entity> {
        self.random
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("no random people left"))
    }

    async fn fetch_person_details(&self, id: u64, _extended: bool) -> Result<Entity> {
        self.lookup(EntityKey::person(id)).await
    }

    async fn fetch_work_details(&self, media_type: MediaType, id: u64) -> Result<Entity> {
        self.lookup(EntityKey::new(media_type, id)).await
    }

    async fn search_multi(&self, term: &str) -> Result<Vec<Entity>> {
        let term = term.to_lowercase();
        if let Some(gate) = self.gates.get(&term) {
            gate.notified().await;
        }
        if self.failing_searches.contains(&term) {
            return Err(anyhow!("search backend down"));
        }
        Ok(self.searches.get(&term).cloned().unwrap_or_default())
    }

    async fn search_people(&self, term: &str, page: u32) -> Result<PersonPage> {
        Ok(self
            .people
            .get(&(term.to_lowercase(), page))
            .cloned()
            .unwrap_or_default())
    }

    async fn check_actor_in_show(&self, actor_id: u64, show_id: u64) -> Result<bool> {
        if let Some(gate) = &self.guest_gate {
            gate.notified().await;
        }
        self.guest_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .show_casts
            .get(&show_id)
            .is_some_and(|cast| cast.contains(&actor_id)))
    }
}
