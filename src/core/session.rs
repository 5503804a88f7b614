//! Game session: the single state container behind the game.
//!
//! A [`GameSession`] owns the game state, the search state, the per-slot
//! actor searches and the inspected node, and is the only place provider
//! fetches happen. Every operation:
//! - takes the lock, validates and issues a request ticket
//! - releases the lock while the provider is awaited
//! - re-takes the lock and applies the response only if its ticket is
//!   still current for that concern
//!
//! Failures are recorded in [`SessionState::last_error`] as well as being
//! returned, so a caller polling snapshots sees them too.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::adapters::MetadataProvider;
use crate::domain::{ActorSlot, Entity, EntityKey, MediaType, Position, SearchQueryState};

use super::connectivity::{connected_nodes, ConnectableIndex};
use super::credits::{self, CreditIndex, CreditView};
use super::game::{AddOutcome, BoardLayout, GameError, GameState};
use super::ranker::rank;
use super::requests::{Concern, RequestTracker};
use super::universe::{all_connectable, ConnectableUniverse};

/// Paginated people search feeding one start slot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActorSearch {
    pub term: String,
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<Entity>,
}

impl ActorSearch {
    /// Whether another page can be requested
    pub fn has_more(&self) -> bool {
        !self.term.trim().is_empty() && self.page < self.total_pages
    }
}

/// The board node currently being inspected
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedNode {
    pub key: EntityKey,
    /// Freshest known details (the board's copy when the fetch failed)
    pub entity: Entity,
    pub credits: Option<CreditView>,
    /// Which of the node's credits and current search results connect to it
    pub connectable: ConnectableIndex,
}

/// Everything a session tracks. Snapshots are plain clones.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub game: GameState,
    pub search: SearchQueryState,
    pub search_term: String,
    pub actor_searches: [ActorSearch; 2],
    pub selected: Option<SelectedNode>,
    pub show_all: bool,
    pub requests: RequestTracker,
    pub last_error: Option<GameError>,
    /// Bumped whenever a game begins or ends; board edits issued under an
    /// older epoch are dropped
    pub epoch: u64,
}

impl SessionState {
    fn new(layout: BoardLayout) -> Self {
        Self {
            game: GameState::new(layout),
            search: SearchQueryState::cleared(),
            search_term: String::new(),
            actor_searches: Default::default(),
            selected: None,
            show_all: false,
            requests: RequestTracker::new(),
            last_error: None,
            epoch: 0,
        }
    }

    pub fn is_loading(&self, concern: Concern) -> bool {
        self.requests.is_loading(concern)
    }

    fn fail<T>(&mut self, err: GameError) -> Result<T, GameError> {
        warn!("{}", err);
        self.last_error = Some(err.clone());
        Err(err)
    }

    fn clear_search(&mut self) {
        self.requests.cancel(Concern::GeneralSearch);
        self.search = SearchQueryState::cleared();
        self.search_term.clear();
    }

    /// Rebuild the inspected node's index if the board moved on
    fn refresh_selection(&mut self) {
        let Some(selected) = self.selected.as_ref() else {
            return;
        };
        let key = selected.key;
        if !self.game.board().contains(&key) {
            self.selected = None;
            return;
        }
        if selected.connectable.is_stale(self.game.board()) {
            if let Some(index) = self.node_index(&key) {
                if let Some(selected) = self.selected.as_mut() {
                    selected.connectable = index;
                }
            }
        }
    }

    /// Node-scoped index over the node's own credits plus current search results
    fn node_index(&self, key: &EntityKey) -> Option<ConnectableIndex> {
        let board = self.game.board();
        let node = board.get(key)?;
        let mut candidates: Vec<Entity> = credits::edges(&node.entity)
            .map(|edges| edges.map(Entity::from_credit).collect())
            .unwrap_or_default();
        candidates.extend(self.search.results.iter().map(|r| r.entity.clone()));
        Some(ConnectableIndex::for_node(node, board, candidates.iter()))
    }
}

fn provider_error(err: anyhow::Error) -> GameError {
    GameError::ProviderFetch {
        message: format!("{:#}", err),
    }
}

/// Person/show pairs whose link only the provider can confirm
fn guest_checks(candidate: &Entity, state: &SessionState, linked: &[EntityKey]) -> Vec<(u64, u64, EntityKey)> {
    state
        .game
        .board()
        .nodes()
        .filter(|node| !linked.contains(&node.key))
        .filter_map(|node| match (candidate.media_type, node.key.media_type) {
            (MediaType::Person, MediaType::Show) => Some((candidate.id, node.key.id, node.key)),
            (MediaType::Show, MediaType::Person) => Some((node.key.id, candidate.id, node.key)),
            _ => None,
        })
        .collect()
}

/// Session driving one game against a metadata provider
pub struct GameSession {
    provider: Arc<dyn MetadataProvider>,
    state: Mutex<SessionState>,
}

impl GameSession {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self::with_layout(provider, BoardLayout::default())
    }

    pub fn with_layout(provider: Arc<dyn MetadataProvider>, layout: BoardLayout) -> Self {
        Self {
            provider,
            state: Mutex::new(SessionState::new(layout)),
        }
    }

    /// Start from a prepared game, e.g. one with a custom win predicate
    pub fn with_game(provider: Arc<dyn MetadataProvider>, game: GameState) -> Self {
        let mut state = SessionState::new(game.layout().clone());
        state.game = game;
        Self {
            provider,
            state: Mutex::new(state),
        }
    }

    pub fn provider(&self) -> &Arc<dyn MetadataProvider> {
        &self.provider
    }

    /// Cloned view of the whole session
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn last_error(&self) -> Option<GameError> {
        self.state.lock().await.last_error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.lock().await.last_error = None;
    }

    pub async fn is_loading(&self, concern: Concern) -> bool {
        self.state.lock().await.is_loading(concern)
    }

    /// Run the main search.
    ///
    /// Returns `Ok(None)` when a newer search superseded this one before
    /// its response arrived. An empty term clears the search immediately.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Option<SearchQueryState>, GameError> {
        let ticket = {
            let mut state = self.state.lock().await;
            if term.trim().is_empty() {
                state.clear_search();
                return Ok(Some(state.search.clone()));
            }
            state.search_term = term.to_string();
            state.requests.begin(Concern::GeneralSearch)
        };

        let fetched = self.provider.search_multi(term.trim()).await;

        let mut state = self.state.lock().await;
        if !state.requests.complete(ticket) {
            debug!(sequence = ticket.sequence, "Discarding superseded search response");
            return Ok(None);
        }

        match fetched {
            Ok(results) => {
                let ranked = rank(results, term, state.game.board(), state.game.start_actors());
                debug!(results = ranked.results.len(), "Search applied");
                state.search = ranked.clone();
                state.refresh_selection();
                Ok(Some(ranked))
            }
            Err(e) => {
                state.search = SearchQueryState::no_match(term);
                state.fail(provider_error(e))
            }
        }
    }

    /// Re-run the search with the current "did you mean" title
    pub async fn apply_spelling_correction(&self) -> Result<Option<SearchQueryState>, GameError> {
        let suggestion = self.state.lock().await.search.suggestion.clone();
        match suggestion {
            Some(title) => {
                info!(%title, "Applying spelling correction");
                self.search(&title).await
            }
            None => Ok(None),
        }
    }

    /// Search people for a start slot. Page 1 replaces the slot's results,
    /// later pages append to them.
    #[instrument(skip(self))]
    pub async fn search_actors(&self, slot: ActorSlot, term: &str, page: u32) -> Result<Option<ActorSearch>, GameError> {
        let concern = Concern::ActorSearch(slot);
        let ticket = {
            let mut state = self.state.lock().await;
            if term.trim().is_empty() {
                state.requests.cancel(concern);
                state.actor_searches[slot.index()] = ActorSearch::default();
                return Ok(Some(ActorSearch::default()));
            }
            state.requests.begin(concern)
        };

        let fetched = self.provider.search_people(term.trim(), page.max(1)).await;

        let mut state = self.state.lock().await;
        if !state.requests.complete(ticket) {
            debug!(?slot, "Discarding superseded actor search response");
            return Ok(None);
        }

        match fetched {
            Ok(found) => {
                let search = &mut state.actor_searches[slot.index()];
                if page <= 1 || search.term != term {
                    search.results = found.results;
                } else {
                    search.results.extend(found.results);
                }
                search.term = term.to_string();
                search.page = found.page.max(page.max(1));
                search.total_pages = found.total_pages;
                Ok(Some(search.clone()))
            }
            Err(e) => state.fail(provider_error(e)),
        }
    }

    /// Fetch the next page of a slot's search, if there is one
    pub async fn load_more_actors(&self, slot: ActorSlot) -> Result<Option<ActorSearch>, GameError> {
        let current = self.state.lock().await.actor_searches[slot.index()].clone();
        if !current.has_more() {
            debug!(?slot, "No more actor pages");
            return Ok(None);
        }
        self.search_actors(slot, &current.term, current.page + 1).await
    }

    /// Fill a start slot with the person `id` (fetching full credits), or
    /// clear it with `None`.
    #[instrument(skip(self))]
    pub async fn select_start_actor(&self, slot: ActorSlot, id: Option<u64>) -> Result<Option<Entity>, GameError> {
        let concern = Concern::ActorSelection(slot);
        let Some(id) = id else {
            let mut state = self.state.lock().await;
            state.requests.cancel(concern);
            return match state.game.select_start_actor(slot, None) {
                Ok(()) => Ok(None),
                Err(e) => state.fail(e),
            };
        };

        let ticket = {
            let mut state = self.state.lock().await;
            if state
                .game
                .start_actors()
                .get(slot.other())
                .is_some_and(|other| other.id == id)
            {
                return state.fail(GameError::DuplicateSelection { id });
            }
            state.requests.begin(concern)
        };

        let fetched = self.provider.fetch_person_details(id, true).await;

        let mut state = self.state.lock().await;
        if !state.requests.complete(ticket) {
            debug!(?slot, "Discarding superseded actor selection");
            return Ok(None);
        }
        match fetched {
            Ok(actor) => match state.game.select_start_actor(slot, Some(actor.clone())) {
                Ok(()) => Ok(Some(actor)),
                Err(e) => state.fail(e),
            },
            Err(e) => state.fail(provider_error(e)),
        }
    }

    /// Fill a start slot with a random person, retrying once if the pick
    /// is already in the other slot
    #[instrument(skip(self))]
    pub async fn randomize_actor(&self, slot: ActorSlot) -> Result<Option<Entity>, GameError> {
        let concern = Concern::ActorSelection(slot);
        let (ticket, other_id) = {
            let mut state = self.state.lock().await;
            let other_id = state.game.start_actors().get(slot.other()).map(|a| a.id);
            (state.requests.begin(concern), other_id)
        };

        let fetched = self.fetch_random_actor(other_id).await;

        let mut state = self.state.lock().await;
        if !state.requests.complete(ticket) {
            debug!(?slot, "Discarding superseded random actor");
            return Ok(None);
        }
        match fetched {
            Ok(actor) => match state.game.select_start_actor(slot, Some(actor.clone())) {
                Ok(()) => {
                    info!(?slot, key = %actor.key(), "Random start actor chosen");
                    Ok(Some(actor))
                }
                Err(e) => state.fail(e),
            },
            Err(e) => state.fail(e),
        }
    }

    async fn fetch_random_actor(&self, other_id: Option<u64>) -> Result<Entity, GameError> {
        let mut person = self.provider.fetch_random_person().await.map_err(provider_error)?;
        if Some(person.id) == other_id {
            debug!(id = person.id, "Random pick duplicates other slot, retrying once");
            person = self.provider.fetch_random_person().await.map_err(provider_error)?;
            if Some(person.id) == other_id {
                return Err(GameError::DuplicateSelection { id: person.id });
            }
        }
        self.provider
            .fetch_person_details(person.id, true)
            .await
            .map_err(provider_error)
    }

    /// Seed the board from the two start slots
    pub async fn start_game(&self) -> Result<(), GameError> {
        let mut state = self.state.lock().await;
        if let Err(e) = state.game.start_game() {
            return state.fail(e);
        }
        state.clear_search();
        state.actor_searches = Default::default();
        state.requests.cancel(Concern::ActorSearch(ActorSlot::First));
        state.requests.cancel(Concern::ActorSearch(ActorSlot::Second));
        state.selected = None;
        state.last_error = None;
        state.epoch += 1;
        Ok(())
    }

    /// Inspect a board node, or clear the inspection with `None`.
    ///
    /// Fresh details are fetched and swapped into the board; if the fetch
    /// fails the board's copy is used instead.
    #[instrument(skip(self))]
    pub async fn select_node(&self, key: Option<EntityKey>) -> Result<Option<SelectedNode>, GameError> {
        let Some(key) = key else {
            let mut state = self.state.lock().await;
            state.requests.cancel(Concern::NodeDetail);
            state.selected = None;
            return Ok(None);
        };

        let ticket = {
            let mut state = self.state.lock().await;
            if !state.game.board().contains(&key) {
                return state.fail(GameError::NotOnBoard { key });
            }
            state.requests.begin(Concern::NodeDetail)
        };

        let fetched = self.provider.fetch_entity(&key).await;

        let mut state = self.state.lock().await;
        if !state.requests.complete(ticket) {
            debug!(%key, "Discarding superseded node detail");
            return Ok(None);
        }

        match fetched {
            Ok(entity) => {
                state.game.refresh_node(entity);
            }
            Err(e) => warn!(%key, "Node detail fetch failed, using board copy: {:#}", e),
        }

        let Some(entity) = state.game.board().get(&key).map(|node| node.entity.clone()) else {
            state.selected = None;
            return state.fail(GameError::NotOnBoard { key });
        };
        let Some(connectable) = state.node_index(&key) else {
            return state.fail(GameError::NotOnBoard { key });
        };

        let selected = SelectedNode {
            key,
            credits: CreditIndex::new().view_of(&entity).ok(),
            entity,
            connectable,
        };
        state.selected = Some(selected.clone());
        Ok(Some(selected))
    }

    /// Place a candidate on the board.
    ///
    /// Unfetched candidates get their details loaded first so the new node
    /// carries credits. Person/show pairs the local credit data can't link
    /// are confirmed with the provider's show-cast check.
    ///
    /// Returns `Ok(None)` when the game was reset or restarted while the
    /// provider was being awaited; nothing is applied to the new game.
    #[instrument(skip(self, candidate), fields(key = %candidate.key()))]
    pub async fn add_to_board(
        &self,
        candidate: Entity,
        position: Option<Position>,
    ) -> Result<Option<AddOutcome>, GameError> {
        let key = candidate.key();
        let epoch = {
            let mut state = self.state.lock().await;
            if state.game.board().contains(&key) {
                return state.fail(GameError::AlreadyPresent { key });
            }
            state.epoch
        };

        let entity = if candidate.has_credits() {
            candidate
        } else {
            match self.provider.fetch_entity(&key).await {
                Ok(entity) => entity,
                Err(e) => {
                    warn!(%key, "Detail fetch failed, adding without credits: {:#}", e);
                    candidate
                }
            }
        };

        let (mut outcome, checks) = {
            let mut state = self.state.lock().await;
            if state.epoch != epoch {
                debug!(%key, "Discarding add from a previous game");
                return Ok(None);
            }
            let outcome = match state.game.add_to_board(entity.clone(), position) {
                Ok(outcome) => outcome,
                Err(e) => return state.fail(e),
            };
            let checks = guest_checks(&entity, &state, &outcome.connected_to);
            (outcome, checks)
        };

        for (actor_id, show_id, other) in checks {
            match self.provider.check_actor_in_show(actor_id, show_id).await {
                Ok(true) => {
                    let mut state = self.state.lock().await;
                    if state.epoch != epoch {
                        debug!(%key, "Discarding guest link from a previous game");
                        return Ok(None);
                    }
                    if state.game.link(key, other) {
                        info!(%key, %other, "Guest appearance confirmed by provider");
                        outcome.connected_to.push(other);
                    }
                }
                Ok(false) => {}
                Err(e) => warn!(actor_id, show_id, "Guest check failed: {:#}", e),
            }
        }

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            return Ok(None);
        }
        outcome.completed = state.game.completion().is_some();
        state.clear_search();
        state.refresh_selection();
        Ok(Some(outcome))
    }

    /// Take a non-start node off the board
    pub async fn remove_from_board(&self, key: &EntityKey) -> Result<(), GameError> {
        let mut state = self.state.lock().await;
        match state.game.remove_from_board(key) {
            Ok(_) => {
                state.refresh_selection();
                Ok(())
            }
            Err(e) => state.fail(e),
        }
    }

    pub async fn update_node_position(&self, key: &EntityKey, position: Position) -> Result<(), GameError> {
        let mut state = self.state.lock().await;
        match state.game.update_node_position(key, position) {
            Ok(()) => Ok(()),
            Err(e) => state.fail(e),
        }
    }

    pub async fn keep_playing(&self) -> Result<(), GameError> {
        let mut state = self.state.lock().await;
        match state.game.keep_playing() {
            Ok(()) => Ok(()),
            Err(e) => state.fail(e),
        }
    }

    /// Back to an empty game. Happens under one lock, and every in-flight
    /// response is invalidated so nothing from the old game lands later.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.epoch += 1;
        state.game.reset();
        state.search = SearchQueryState::cleared();
        state.search_term.clear();
        state.actor_searches = Default::default();
        state.selected = None;
        state.show_all = false;
        state.requests.invalidate_all();
        state.last_error = None;
    }

    /// Flip the "show everything connectable" view; returns the new value
    pub async fn toggle_show_all(&self) -> bool {
        let mut state = self.state.lock().await;
        state.show_all = !state.show_all;
        state.show_all
    }

    pub async fn all_connectable(&self) -> ConnectableUniverse {
        all_connectable(self.state.lock().await.game.board())
    }

    /// Board nodes the candidate would link to
    pub async fn connected_nodes_of(&self, candidate: &Entity) -> Vec<EntityKey> {
        let state = self.state.lock().await;
        connected_nodes(candidate, state.game.board())
            .into_iter()
            .map(|node| node.key)
            .collect()
    }
}
