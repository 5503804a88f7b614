//! Adapter interfaces for external systems.
//!
//! The metadata provider is the only external collaborator: it resolves
//! people, movies and shows and answers free-text searches.

pub mod tmdb;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Entity, EntityKey, MediaType};

// Re-export the TMDB client
pub use tmdb::TmdbClient;

/// One page of a paginated person search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonPage {
    pub results: Vec<Entity>,
    pub page: u32,
    pub total_pages: u32,
}

/// Source of entity metadata
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// A random, reasonably well-known person (credits not loaded)
    async fn fetch_random_person(&self) -> Result<Entity>;

    /// Person details; `extended` loads movie and TV credits
    async fn fetch_person_details(&self, id: u64, extended: bool) -> Result<Entity>;

    /// Movie or show details including cast
    async fn fetch_work_details(&self, media_type: MediaType, id: u64) -> Result<Entity>;

    /// Mixed people/movie/show search in provider relevance order
    async fn search_multi(&self, term: &str) -> Result<Vec<Entity>>;

    /// Paginated people-only search (start-actor slots)
    async fn search_people(&self, term: &str, page: u32) -> Result<PersonPage>;

    /// Whether the actor appears anywhere in the show's cast, guest spots included
    async fn check_actor_in_show(&self, actor_id: u64, show_id: u64) -> Result<bool>;

    /// Full details for any key, with extended credits for people
    async fn fetch_entity(&self, key: &EntityKey) -> Result<Entity> {
        match key.media_type {
            MediaType::Person => self.fetch_person_details(key.id, true).await,
            media_type => self.fetch_work_details(media_type, key.id).await,
        }
    }
}
