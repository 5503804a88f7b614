//! Entity model: people, movies and TV shows in one shape.
//!
//! Provider records arrive in three different layouts. Everything that
//! reaches the board goes through [`normalize`] first, so the rest of the
//! crate only ever sees [`Entity`] and [`CreditRef`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while turning provider records into entities
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Invalid {media_type} record: {reason}")]
    InvalidRecord { media_type: MediaType, reason: String },

    #[error("Unknown media type: {0}")]
    UnknownMediaType(String),

    #[error("Invalid entity key: {0}")]
    InvalidKey(String),
}

/// Kind of entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// An actor or other credited person
    Person,

    /// A feature film
    Movie,

    /// A TV series
    #[serde(rename = "tv")]
    Show,
}

impl MediaType {
    /// Movies and shows are works; people are credited on them
    pub fn is_work(self) -> bool {
        !matches!(self, MediaType::Person)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Person => "person",
            MediaType::Movie => "movie",
            MediaType::Show => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "person" | "people" => Ok(MediaType::Person),
            "movie" | "film" => Ok(MediaType::Movie),
            "tv" | "show" => Ok(MediaType::Show),
            other => Err(NormalizeError::UnknownMediaType(other.to_string())),
        }
    }
}

/// Globally unique identity: `"{media_type}-{id}"`
///
/// Provider ids are only unique within a media type, so the type is part
/// of the key. Serialized in its string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EntityKey {
    pub media_type: MediaType,
    pub id: u64,
}

impl EntityKey {
    pub fn new(media_type: MediaType, id: u64) -> Self {
        Self { media_type, id }
    }

    pub fn person(id: u64) -> Self {
        Self::new(MediaType::Person, id)
    }

    pub fn movie(id: u64) -> Self {
        Self::new(MediaType::Movie, id)
    }

    pub fn show(id: u64) -> Self {
        Self::new(MediaType::Show, id)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.media_type, self.id)
    }
}

impl FromStr for EntityKey {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (media, id) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| NormalizeError::InvalidKey(s.to_string()))?;
        let media_type = media.parse()?;
        let id = id
            .parse()
            .map_err(|_| NormalizeError::InvalidKey(s.to_string()))?;
        Ok(Self { media_type, id })
    }
}

impl From<EntityKey> for String {
    fn from(key: EntityKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for EntityKey {
    type Error = NormalizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One side of a credit, as seen from the entity that holds it.
///
/// On a person the ref points at a movie or show; on a work it points at a
/// person. `guest_flag` is the provider's own marker, `is_guest_appearance`
/// is filled in by the credit index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRef {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_id: Option<String>,
    /// Character names of every role (aggregate TV credits)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_flag: Option<bool>,
    #[serde(default)]
    pub is_guest_appearance: bool,
}

impl CreditRef {
    pub fn new(media_type: MediaType, id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            media_type,
            title: title.into(),
            character: None,
            order: None,
            episode_count: None,
            popularity: 0.0,
            release_year: None,
            credit_id: None,
            roles: Vec::new(),
            guest_flag: None,
            is_guest_appearance: false,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.media_type, self.id)
    }

    pub fn with_character(mut self, character: impl Into<String>) -> Self {
        self.character = Some(character.into());
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_episodes(mut self, episode_count: u32) -> Self {
        self.episode_count = Some(episode_count);
        self
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_credit_id(mut self, credit_id: impl Into<String>) -> Self {
        self.credit_id = Some(credit_id.into());
        self
    }

    pub fn with_role(mut self, character: impl Into<String>) -> Self {
        self.roles.push(character.into());
        self
    }

    pub fn with_guest_flag(mut self, guest: bool) -> Self {
        self.guest_flag = Some(guest);
        self
    }
}

/// Credit lists attached to an entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credits {
    /// Search results and random picks carry no credits until details are fetched
    #[default]
    Unfetched,

    Person {
        movie_cast: Vec<CreditRef>,
        tv_cast: Vec<CreditRef>,
    },

    Work {
        cast: Vec<CreditRef>,
        /// Episode-aware cast (shows only)
        #[serde(default)]
        aggregate_cast: Vec<CreditRef>,
        #[serde(default)]
        guest_stars: Vec<CreditRef>,
    },
}

/// A person, movie or show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_for: Option<String>,
    #[serde(default)]
    pub credits: Credits,
}

impl Entity {
    pub fn new(media_type: MediaType, id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            media_type,
            title: title.into(),
            popularity: 0.0,
            release_year: None,
            known_for: None,
            credits: Credits::Unfetched,
        }
    }

    pub fn person(id: u64, name: impl Into<String>) -> Self {
        Self::new(MediaType::Person, id, name)
    }

    pub fn movie(id: u64, title: impl Into<String>) -> Self {
        Self::new(MediaType::Movie, id, title)
    }

    pub fn show(id: u64, name: impl Into<String>) -> Self {
        Self::new(MediaType::Show, id, name)
    }

    /// Bare entity on the far side of a credit
    pub fn from_credit(credit: &CreditRef) -> Self {
        Self {
            id: credit.id,
            media_type: credit.media_type,
            title: credit.title.clone(),
            popularity: credit.popularity,
            release_year: credit.release_year,
            known_for: None,
            credits: Credits::Unfetched,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.media_type, self.id)
    }

    pub fn has_credits(&self) -> bool {
        !matches!(self.credits, Credits::Unfetched)
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_person_credits(mut self, movie_cast: Vec<CreditRef>, tv_cast: Vec<CreditRef>) -> Self {
        self.credits = Credits::Person { movie_cast, tv_cast };
        self
    }

    pub fn with_cast(mut self, cast: Vec<CreditRef>) -> Self {
        match &mut self.credits {
            Credits::Work { cast: existing, .. } => *existing = cast,
            _ => {
                self.credits = Credits::Work {
                    cast,
                    aggregate_cast: Vec::new(),
                    guest_stars: Vec::new(),
                }
            }
        }
        self
    }

    pub fn with_aggregate_cast(mut self, aggregate: Vec<CreditRef>) -> Self {
        match &mut self.credits {
            Credits::Work { aggregate_cast, .. } => *aggregate_cast = aggregate,
            _ => {
                self.credits = Credits::Work {
                    cast: Vec::new(),
                    aggregate_cast: aggregate,
                    guest_stars: Vec::new(),
                }
            }
        }
        self
    }

    pub fn with_guest_stars(mut self, guests: Vec<CreditRef>) -> Self {
        match &mut self.credits {
            Credits::Work { guest_stars, .. } => *guest_stars = guests,
            _ => {
                self.credits = Credits::Work {
                    cast: Vec::new(),
                    aggregate_cast: Vec::new(),
                    guest_stars: guests,
                }
            }
        }
        self
    }
}

// ============================================================================
// Provider record normalization
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecord {
    id: Option<u64>,
    media_type: Option<String>,
    name: Option<String>,
    title: Option<String>,
    original_name: Option<String>,
    original_title: Option<String>,
    popularity: Option<f64>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    known_for_department: Option<String>,
    movie_credits: Option<RawCastList>,
    tv_credits: Option<RawCastList>,
    credits: Option<RawCastList>,
    aggregate_credits: Option<RawCastList>,
    guest_stars: Option<Vec<RawCredit>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCastList {
    cast: Option<Vec<RawCredit>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCredit {
    id: Option<u64>,
    name: Option<String>,
    title: Option<String>,
    original_name: Option<String>,
    original_title: Option<String>,
    character: Option<String>,
    order: Option<u32>,
    episode_count: Option<u32>,
    total_episode_count: Option<u32>,
    popularity: Option<f64>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    credit_id: Option<String>,
    #[serde(alias = "isGuestAppearance")]
    is_guest_appearance: Option<bool>,
    roles: Option<Vec<RawRole>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRole {
    character: Option<String>,
    credit_id: Option<String>,
}

fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

fn first_non_empty(candidates: [Option<String>; 4]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default()
}

impl RawCredit {
    /// Convert to a credit ref pointing at `media_type`; credits without an id are dropped
    fn into_ref(self, media_type: MediaType) -> Option<CreditRef> {
        let id = self.id?;
        let roles = self.roles.unwrap_or_default();
        let character = self
            .character
            .filter(|c| !c.is_empty())
            .or_else(|| roles.iter().find_map(|r| r.character.clone()));
        let credit_id = self
            .credit_id
            .or_else(|| roles.iter().find_map(|r| r.credit_id.clone()));
        let release_year = year_of(self.release_date.as_deref())
            .or_else(|| year_of(self.first_air_date.as_deref()));

        Some(CreditRef {
            id,
            media_type,
            title: first_non_empty([self.title, self.name, self.original_title, self.original_name]),
            character,
            order: self.order,
            episode_count: self.total_episode_count.or(self.episode_count),
            popularity: self.popularity.unwrap_or(0.0),
            release_year,
            credit_id,
            roles: roles.into_iter().filter_map(|r| r.character).collect(),
            guest_flag: self.is_guest_appearance,
            is_guest_appearance: false,
        })
    }
}

fn cast_refs(list: Option<Vec<RawCredit>>, media_type: MediaType) -> Vec<CreditRef> {
    list.unwrap_or_default()
        .into_iter()
        .filter_map(|c| c.into_ref(media_type))
        .collect()
}

fn cast_list(list: Option<RawCastList>, media_type: MediaType) -> Vec<CreditRef> {
    cast_refs(list.and_then(|l| l.cast), media_type)
}

/// Normalize a raw provider record of a known media type.
///
/// Only `id` is required. Absent cast arrays become empty lists, absent
/// popularity becomes 0. A person record without any credit blocks stays
/// [`Credits::Unfetched`] so callers can tell "no credits" from "not loaded".
pub fn normalize(raw: &serde_json::Value, media_type: MediaType) -> Result<Entity, NormalizeError> {
    let record = RawRecord::deserialize(raw).map_err(|e| NormalizeError::InvalidRecord {
        media_type,
        reason: e.to_string(),
    })?;

    let id = record.id.ok_or_else(|| NormalizeError::InvalidRecord {
        media_type,
        reason: "missing id".to_string(),
    })?;

    let credits = match media_type {
        MediaType::Person => {
            if record.movie_credits.is_none() && record.tv_credits.is_none() {
                Credits::Unfetched
            } else {
                Credits::Person {
                    movie_cast: cast_list(record.movie_credits, MediaType::Movie),
                    tv_cast: cast_list(record.tv_credits, MediaType::Show),
                }
            }
        }
        MediaType::Movie | MediaType::Show => {
            if record.credits.is_none()
                && record.aggregate_credits.is_none()
                && record.guest_stars.is_none()
            {
                Credits::Unfetched
            } else {
                Credits::Work {
                    cast: cast_list(record.credits, MediaType::Person),
                    aggregate_cast: cast_list(record.aggregate_credits, MediaType::Person),
                    guest_stars: cast_refs(record.guest_stars, MediaType::Person),
                }
            }
        }
    };

    let release_year = year_of(record.release_date.as_deref())
        .or_else(|| year_of(record.first_air_date.as_deref()));

    let title = match media_type {
        MediaType::Person => first_non_empty([record.name, record.original_name, record.title, None]),
        _ => first_non_empty([record.title, record.name, record.original_title, record.original_name]),
    };

    Ok(Entity {
        id,
        media_type,
        title,
        popularity: record.popularity.unwrap_or(0.0),
        release_year,
        known_for: record.known_for_department,
        credits,
    })
}

/// Normalize a record that names its own `media_type` (multi-search results)
pub fn normalize_tagged(raw: &serde_json::Value) -> Result<Entity, NormalizeError> {
    let media = raw
        .get("media_type")
        .and_then(|m| m.as_str())
        .ok_or_else(|| NormalizeError::UnknownMediaType("<missing>".to_string()))?;
    normalize(raw, media.parse()?)
}
