//! TMDB metadata provider.
//!
//! Talks to the TMDB v3 REST API with an API key passed as a query
//! parameter. Responses are read as loose JSON and normalized through the
//! entity model, so missing optional fields never fail a request.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{MetadataProvider, PersonPage};
use crate::config::ProviderSettings;
use crate::core::credits::references;
use crate::domain::{normalize, normalize_tagged, Entity, EntityKey, MediaType};

/// TMDB REST client
pub struct TmdbClient {
    base_url: String,
    api_key: String,
    language: String,
    random_person_max_page: u32,
    client: reqwest::Client,
}

/// Paginated list envelope shared by search and popular endpoints
#[derive(Debug, Deserialize)]
struct PagedResponse {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    results: Vec<Value>,
}

impl TmdbClient {
    /// Create a client with default settings and the given API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let settings = ProviderSettings {
            api_key: Some(api_key.into()),
            ..ProviderSettings::default()
        };
        Self::from_settings(&settings)
    }

    /// Create from resolved provider settings
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .context("Missing TMDB API key. Set TMDB_API_KEY or provider.api_key in config")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            language: settings.language.clone(),
            random_person_max_page: settings.random_person_max_page.max(1),
            client,
        })
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a path and return the JSON body
    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self.api_url(path);
        debug!(%url, "TMDB request");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", self.language.as_str())])
            .query(params)
            .send()
            .await
            .with_context(|| format!("Failed to reach TMDB at {}", path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("TMDB request {} failed with {}: {}", path, status, body.trim());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse TMDB response for {}", path))
    }

    async fn get_page(&self, path: &str, params: &[(&str, String)]) -> Result<PagedResponse> {
        let body = self.get_json(path, params).await?;
        serde_json::from_value(body).with_context(|| format!("Unexpected TMDB page shape for {}", path))
    }
}

/// Normalize a list of records, dropping (and logging) unusable ones
fn normalize_all(records: &[Value], media_type: Option<MediaType>) -> Vec<Entity> {
    records
        .iter()
        .filter_map(|raw| {
            let result = match media_type {
                Some(media_type) => normalize(raw, media_type),
                None => normalize_tagged(raw),
            };
            result
                .map_err(|e| debug!("Skipping TMDB record: {}", e))
                .ok()
        })
        .collect()
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn fetch_random_person(&self) -> Result<Entity> {
        let page = rand::thread_rng().gen_range(1..=self.random_person_max_page);
        let listing = self
            .get_page("person/popular", &[("page", page.to_string())])
            .await?;

        let people = normalize_all(&listing.results, Some(MediaType::Person));
        let actors: Vec<&Entity> = people
            .iter()
            .filter(|p| p.known_for.as_deref().map_or(true, |d| d == "Acting"))
            .collect();

        actors
            .choose(&mut rand::thread_rng())
            .map(|p| (*p).clone())
            .with_context(|| format!("No people on popular page {}", page))
    }

    async fn fetch_person_details(&self, id: u64, extended: bool) -> Result<Entity> {
        let mut params = Vec::new();
        if extended {
            params.push(("append_to_response", "movie_credits,tv_credits".to_string()));
        }
        let body = self.get_json(&format!("person/{}", id), &params).await?;
        normalize(&body, MediaType::Person).context("Invalid person record from TMDB")
    }

    async fn fetch_work_details(&self, media_type: MediaType, id: u64) -> Result<Entity> {
        let (path, append) = match media_type {
            MediaType::Movie => (format!("movie/{}", id), "credits"),
            MediaType::Show => (format!("tv/{}", id), "credits,aggregate_credits"),
            MediaType::Person => anyhow::bail!("person-{} is not a movie or show", id),
        };
        let body = self
            .get_json(&path, &[("append_to_response", append.to_string())])
            .await?;
        normalize(&body, media_type).with_context(|| format!("Invalid {} record from TMDB", media_type))
    }

    async fn search_multi(&self, term: &str) -> Result<Vec<Entity>> {
        let listing = self
            .get_page(
                "search/multi",
                &[("query", term.to_string()), ("include_adult", "false".to_string())],
            )
            .await?;
        Ok(normalize_all(&listing.results, None))
    }

    async fn search_people(&self, term: &str, page: u32) -> Result<PersonPage> {
        let listing = self
            .get_page(
                "search/person",
                &[
                    ("query", term.to_string()),
                    ("page", page.max(1).to_string()),
                    ("include_adult", "false".to_string()),
                ],
            )
            .await?;

        Ok(PersonPage {
            results: normalize_all(&listing.results, Some(MediaType::Person)),
            page: listing.page,
            total_pages: listing.total_pages,
        })
    }

    async fn check_actor_in_show(&self, actor_id: u64, show_id: u64) -> Result<bool> {
        let body = self
            .get_json(&format!("tv/{}/aggregate_credits", show_id), &[])
            .await?;

        let in_cast = body
            .get("cast")
            .and_then(Value::as_array)
            .is_some_and(|cast| {
                cast.iter()
                    .any(|member| member.get("id").and_then(Value::as_u64) == Some(actor_id))
            });

        if !in_cast {
            // Guest spots are not always in the aggregate cast; check the person's side
            match self.fetch_person_details(actor_id, true).await {
                Ok(person) => {
                    return Ok(lists_show(&person, show_id));
                }
                Err(e) => warn!(actor_id, show_id, "Person credit check failed: {}", e),
            }
        }

        Ok(in_cast)
    }
}

/// Whether a person's own TV credits include the show
fn lists_show(person: &Entity, show_id: u64) -> bool {
    references(person, &EntityKey::show(show_id)).unwrap_or(false)
}
