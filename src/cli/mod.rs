//! Command-line interface for connect-stars.
//!
//! Provides commands for searching the metadata provider, inspecting
//! credits, checking connectability and playing a game from the terminal.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{MetadataProvider, TmdbClient};
use crate::config;
use crate::core::{all_connectable, is_connectable_to_node, CreditIndex, CreditView, GameSession};
use crate::domain::{ActorSlot, Board, BoardNode, Entity, EntityKey, MediaType};

/// connect-stars - link two actors through the films and shows they share
#[derive(Parser, Debug)]
#[command(name = "connect-stars")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show resolved configuration (debug)
    Config,

    /// Search people, movies and shows
    Search {
        /// Search term
        term: String,

        /// Print the search state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the credits of an entity
    Credits {
        /// Entity key (e.g. person-31, movie-862, tv-1399)
        key: EntityKey,
    },

    /// Pick a random actor
    Random,

    /// Check whether a candidate connects to a node
    Connects {
        /// Candidate key
        candidate: EntityKey,

        /// Node key
        node: EntityKey,
    },

    /// List everything connectable to a set of nodes
    Universe {
        /// Node keys making up the board
        #[arg(required = true)]
        keys: Vec<EntityKey>,
    },

    /// Play a game non-interactively: two start actors, then nodes in order
    Play {
        /// First start actor (person id)
        #[arg(long)]
        first: u64,

        /// Second start actor (person id)
        #[arg(long)]
        second: u64,

        /// Keys to add to the board, in order
        keys: Vec<EntityKey>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Config => show_config().await,
            Commands::Search { term, json } => search(&term, json).await,
            Commands::Credits { key } => show_credits(key).await,
            Commands::Random => random_actor().await,
            Commands::Connects { candidate, node } => connects(candidate, node).await,
            Commands::Universe { keys } => universe(&keys).await,
            Commands::Play { first, second, keys } => play(first, second, &keys).await,
        }
    }
}

/// Build the configured provider
fn provider() -> Result<Arc<dyn MetadataProvider>> {
    let cfg = config::config()?;
    let client = TmdbClient::from_settings(&cfg.provider)?;
    Ok(Arc::new(client))
}

fn session() -> Result<GameSession> {
    let cfg = config::config()?;
    Ok(GameSession::with_layout(provider()?, cfg.layout.clone()))
}

fn truncate(title: &str, max: usize) -> String {
    if title.chars().count() > max {
        let cut: String = title.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}

fn describe(entity: &Entity) -> String {
    match entity.release_year {
        Some(year) => format!("{} ({})", entity.title, year),
        None => entity.title.clone(),
    }
}

/// Show resolved configuration
async fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("{}", "=".repeat(60));
    println!("  Connect The Stars Configuration");
    println!("{}", "=".repeat(60));
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Provider:");
    println!("  Base URL:   {}", cfg.provider.base_url);
    println!(
        "  API key:    {}",
        if cfg.provider.api_key.is_some() { "(set)" } else { "(missing)" }
    );
    println!("  Language:   {}", cfg.provider.language);
    println!("  Timeout:    {}s", cfg.provider.timeout_seconds);
    println!("  Random cap: page {}", cfg.provider.random_person_max_page);
    println!();
    println!("Board layout:");
    for (slot, pos) in ActorSlot::ALL.iter().zip(cfg.layout.start_positions.iter()) {
        println!("  Start {:?}: ({}, {})", slot, pos.x, pos.y);
    }
    println!(
        "  Default:     ({}, {})",
        cfg.layout.default_position.x, cfg.layout.default_position.y
    );
    println!(
        "  Stagger:     ({}, {}) wrapping every {}",
        cfg.layout.stagger.x, cfg.layout.stagger.y, cfg.layout.stagger_wrap
    );

    Ok(())
}

/// Run a search and print connectable results first
async fn search(term: &str, json: bool) -> Result<()> {
    let session = session()?;
    let state = session
        .search(term)
        .await?
        .context("Search was superseded")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    if state.no_match_found {
        println!("No results found for: {}", term);
        return Ok(());
    }

    if let Some(suggestion) = &state.suggestion {
        println!("Did you mean \"{}\"?\n", suggestion);
    }

    println!("Found {} result(s) for \"{}\":\n", state.results.len(), term);
    println!("{:<16} {:<8} {:<12} {:<50}", "KEY", "TYPE", "CONNECTS", "TITLE");
    println!("{}", "-".repeat(88));

    let (connectable, other) = state.partition();
    for result in connectable.into_iter().chain(other) {
        println!(
            "{:<16} {:<8} {:<12} {:<50}",
            result.key().to_string(),
            result.entity.media_type.to_string(),
            if result.connectable { "yes" } else { "no" },
            truncate(&describe(&result.entity), 50)
        );
    }

    Ok(())
}

/// Print the credit view of an entity
async fn show_credits(key: EntityKey) -> Result<()> {
    let provider = provider()?;
    let entity = provider
        .fetch_entity(&key)
        .await
        .with_context(|| format!("Failed to fetch {}", key))?;

    println!("{} [{}]\n", describe(&entity), key);

    let view = CreditIndex::new()
        .view_of(&entity)
        .with_context(|| format!("Malformed credits for {}", key))?;

    let print_credits = |heading: &str, credits: &[crate::domain::CreditRef]| {
        println!("{} ({}):", heading, credits.len());
        for credit in credits {
            let guest = if credit.is_guest_appearance { " [guest]" } else { "" };
            let character = credit
                .character
                .as_deref()
                .map(|c| format!(" as {}", c))
                .unwrap_or_default();
            println!("  {:<16} {}{}{}", credit.key().to_string(), credit.title, character, guest);
        }
    };

    match view {
        CreditView::Person(credits) => {
            print_credits("Movies", &credits.movies);
            println!();
            print_credits("TV shows", &credits.tv_shows);
        }
        CreditView::Cast { cast } => print_credits("Cast", &cast),
    }

    Ok(())
}

/// Pick a random actor into the first slot
async fn random_actor() -> Result<()> {
    let session = session()?;
    let actor = session
        .randomize_actor(ActorSlot::First)
        .await?
        .context("Random pick was superseded")?;

    println!("{} [{}]", describe(&actor), actor.key());
    if let Some(department) = &actor.known_for {
        println!("Known for: {}", department);
    }
    Ok(())
}

/// Check connectability in both directions
async fn connects(candidate: EntityKey, node: EntityKey) -> Result<()> {
    let provider = provider()?;
    let candidate_entity = provider.fetch_entity(&candidate).await?;
    let node_entity = provider.fetch_entity(&node).await?;

    let mut connected = is_connectable_to_node(&candidate_entity, &node_entity);

    if !connected {
        let pair = match (candidate.media_type, node.media_type) {
            (MediaType::Person, MediaType::Show) => Some((candidate.id, node.id)),
            (MediaType::Show, MediaType::Person) => Some((node.id, candidate.id)),
            _ => None,
        };
        if let Some((actor_id, show_id)) = pair {
            connected = provider.check_actor_in_show(actor_id, show_id).await?;
        }
    }

    println!(
        "{} {} {}",
        describe(&candidate_entity),
        if connected { "connects to" } else { "does not connect to" },
        describe(&node_entity)
    );
    Ok(())
}

/// List the one-step universe around a set of nodes
async fn universe(keys: &[EntityKey]) -> Result<()> {
    let provider = provider()?;
    let mut board = Board::new();

    for key in keys {
        let entity = provider
            .fetch_entity(key)
            .await
            .with_context(|| format!("Failed to fetch {}", key))?;
        board.insert(BoardNode::new(entity, Default::default()));
    }

    let universe = all_connectable(&board);
    for (heading, media_type) in [
        ("People", MediaType::Person),
        ("Movies", MediaType::Movie),
        ("TV shows", MediaType::Show),
    ] {
        let entities = universe.partition(media_type);
        println!("{} ({}):", heading, entities.len());
        for entity in entities {
            println!("  {:<16} {}", entity.key().to_string(), truncate(&describe(entity), 56));
        }
        println!();
    }

    Ok(())
}

/// Play a scripted game and report the outcome
async fn play(first: u64, second: u64, keys: &[EntityKey]) -> Result<()> {
    let session = session()?;
    session
        .select_start_actor(ActorSlot::First, Some(first))
        .await?;
    session
        .select_start_actor(ActorSlot::Second, Some(second))
        .await?;
    session.start_game().await?;

    for key in keys {
        let outcome = session
            .add_to_board(Entity::new(key.media_type, key.id, key.to_string()), None)
            .await?
            .context("Add was superseded")?;
        let links: Vec<String> = outcome.connected_to.iter().map(ToString::to_string).collect();
        println!("+ {} -> [{}]", outcome.key, links.join(", "));
        if outcome.completed {
            break;
        }
    }

    let state = session.snapshot().await;
    match state.game.completion() {
        Some(completion) => {
            let path: Vec<String> = completion
                .path
                .iter()
                .map(|key| {
                    state
                        .game
                        .board()
                        .get(key)
                        .map(|node| node.entity.title.clone())
                        .unwrap_or_else(|| key.to_string())
                })
                .collect();
            println!(
                "\nConnected in {} step(s), {}s: {}",
                completion.path_length(),
                completion.elapsed_seconds,
                path.join(" -> ")
            );
        }
        None => println!("\nNot connected yet ({} nodes on the board)", state.game.board().len()),
    }

    Ok(())
}
