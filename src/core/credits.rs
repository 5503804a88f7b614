//! Credit index: the ordered credit edges of a single entity.
//!
//! Everything here is a pure function of the entity passed in. The same
//! input always yields the same ordered output, so results can be cached
//! by callers keyed on the entity.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{CreditRef, Credits, Entity, EntityKey, MediaType};

/// Billing position assumed for cast members without one
pub const MISSING_ORDER: u32 = 999;

/// Entity data that cannot be turned into credit edges
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectivityError {
    #[error("{key} carries {found} credits")]
    MalformedCredits { key: EntityKey, found: &'static str },

    #[error("{operation} does not apply to {key}")]
    NotApplicable { key: EntityKey, operation: &'static str },
}

/// Decides whether a TV credit is a guest appearance
pub trait GuestPredicate: Send + Sync {
    fn is_guest(&self, credit: &CreditRef) -> bool;
}

/// OR of every available signal: the provider flag, or "guest" in the
/// character name, the credit id, or any role name.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringGuestPredicate;

fn mentions_guest(text: Option<&str>) -> bool {
    text.is_some_and(|t| t.to_lowercase().contains("guest"))
}

impl GuestPredicate for SubstringGuestPredicate {
    fn is_guest(&self, credit: &CreditRef) -> bool {
        credit.guest_flag == Some(true)
            || mentions_guest(credit.character.as_deref())
            || mentions_guest(credit.credit_id.as_deref())
            || credit.roles.iter().any(|role| mentions_guest(Some(role.as_str())))
    }
}

/// Movie and TV credits of a person, most popular first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonCredits {
    pub movies: Vec<CreditRef>,
    pub tv_shows: Vec<CreditRef>,
}

/// What an entity connects to, in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreditView {
    Person(PersonCredits),
    Cast { cast: Vec<CreditRef> },
}

impl CreditView {
    /// All edges, in display order
    pub fn edges(&self) -> Vec<&CreditRef> {
        match self {
            CreditView::Person(credits) => credits.movies.iter().chain(&credits.tv_shows).collect(),
            CreditView::Cast { cast } => cast.iter().collect(),
        }
    }
}

/// Check that the credit shape matches the media type
pub fn validate(entity: &Entity) -> Result<(), ConnectivityError> {
    match (&entity.credits, entity.media_type) {
        (Credits::Person { .. }, MediaType::Movie | MediaType::Show) => {
            Err(ConnectivityError::MalformedCredits {
                key: entity.key(),
                found: "person",
            })
        }
        (Credits::Work { .. }, MediaType::Person) => Err(ConnectivityError::MalformedCredits {
            key: entity.key(),
            found: "work",
        }),
        _ => Ok(()),
    }
}

/// Every credit edge an entity holds, unordered.
///
/// Shows contribute their plain cast, aggregate cast and guest stars.
pub fn edges(entity: &Entity) -> Result<impl Iterator<Item = &CreditRef>, ConnectivityError> {
    validate(entity)?;
    let lists: [&[CreditRef]; 3] = match &entity.credits {
        Credits::Unfetched => [&[], &[], &[]],
        Credits::Person { movie_cast, tv_cast } => [movie_cast.as_slice(), tv_cast.as_slice(), &[]],
        Credits::Work {
            cast,
            aggregate_cast,
            guest_stars,
        } => [cast.as_slice(), aggregate_cast.as_slice(), guest_stars.as_slice()],
    };
    Ok(lists.into_iter().flatten())
}

/// Does `holder` carry a credit pointing at `target`?
pub fn references(holder: &Entity, target: &EntityKey) -> Result<bool, ConnectivityError> {
    Ok(edges(holder)?.any(|edge| edge.key() == *target))
}

fn by_popularity_desc(a: &CreditRef, b: &CreditRef) -> std::cmp::Ordering {
    b.popularity.total_cmp(&a.popularity)
}

/// Builds ordered credit views, marking guest appearances with `G`
#[derive(Debug, Clone, Default)]
pub struct CreditIndex<G = SubstringGuestPredicate> {
    guest: G,
}

impl CreditIndex<SubstringGuestPredicate> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<G: GuestPredicate> CreditIndex<G> {
    /// Use a different guest-appearance heuristic
    pub fn with_predicate(guest: G) -> Self {
        Self { guest }
    }

    pub fn is_guest(&self, credit: &CreditRef) -> bool {
        self.guest.is_guest(credit)
    }

    fn mark_guests(&self, edges: &mut [CreditRef]) {
        for edge in edges {
            edge.is_guest_appearance = self.guest.is_guest(edge);
        }
    }

    /// A person's movie and TV credits, each sorted by popularity descending.
    /// TV credits are marked for guest appearances.
    pub fn credit_edges_of(&self, person: &Entity) -> Result<PersonCredits, ConnectivityError> {
        validate(person)?;
        if person.media_type != MediaType::Person {
            return Err(ConnectivityError::NotApplicable {
                key: person.key(),
                operation: "credit_edges_of",
            });
        }

        let (mut movies, mut tv_shows) = match &person.credits {
            Credits::Person { movie_cast, tv_cast } => (movie_cast.clone(), tv_cast.clone()),
            _ => (Vec::new(), Vec::new()),
        };

        movies.sort_by(by_popularity_desc);
        tv_shows.sort_by(by_popularity_desc);
        self.mark_guests(&mut tv_shows);

        Ok(PersonCredits { movies, tv_shows })
    }

    /// Cast of a movie or show in billing order.
    ///
    /// Movies sort by `order` ascending with missing orders last. Shows use
    /// the aggregate cast when it has entries, sorted by episode count and
    /// then popularity, both descending, with guest marking applied.
    pub fn cast_of(&self, work: &Entity) -> Result<Vec<CreditRef>, ConnectivityError> {
        validate(work)?;

        let (cast, aggregate_cast) = match &work.credits {
            Credits::Work {
                cast,
                aggregate_cast,
                ..
            } => (cast.as_slice(), aggregate_cast.as_slice()),
            _ => (&[][..], &[][..]),
        };

        match work.media_type {
            MediaType::Movie => {
                let mut sorted = cast.to_vec();
                sorted.sort_by_key(|c| c.order.unwrap_or(MISSING_ORDER));
                Ok(sorted)
            }
            MediaType::Show => {
                let source = if aggregate_cast.is_empty() { cast } else { aggregate_cast };
                let mut sorted = source.to_vec();
                sorted.sort_by(|a, b| {
                    b.episode_count
                        .unwrap_or(0)
                        .cmp(&a.episode_count.unwrap_or(0))
                        .then_with(|| by_popularity_desc(a, b))
                });
                self.mark_guests(&mut sorted);
                Ok(sorted)
            }
            MediaType::Person => Err(ConnectivityError::NotApplicable {
                key: work.key(),
                operation: "cast_of",
            }),
        }
    }

    /// The connections panel for any entity
    pub fn view_of(&self, entity: &Entity) -> Result<CreditView, ConnectivityError> {
        match entity.media_type {
            MediaType::Person => self.credit_edges_of(entity).map(CreditView::Person),
            MediaType::Movie | MediaType::Show => {
                self.cast_of(entity).map(|cast| CreditView::Cast { cast })
            }
        }
    }
}

/// [`CreditIndex::credit_edges_of`] with the default guest heuristic
pub fn credit_edges_of(person: &Entity) -> Result<PersonCredits, ConnectivityError> {
    CreditIndex::new().credit_edges_of(person)
}

/// [`CreditIndex::cast_of`] with the default guest heuristic
pub fn cast_of(work: &Entity) -> Result<Vec<CreditRef>, ConnectivityError> {
    CreditIndex::new().cast_of(work)
}
