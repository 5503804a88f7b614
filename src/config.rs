//! Configuration for connect-stars.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (TMDB_API_KEY, CONNECT_STARS_PROVIDER_URL)
//! 2. Config file (.connect-stars/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .connect-stars/config.yaml
//! - Falls back to the user config directory (e.g. ~/.config/connect-stars/config.yaml)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::BoardLayout;
use crate::domain::Position;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".connect-stars";
const CONFIG_NAME: &str = "config.yaml";

pub const ENV_API_KEY: &str = "TMDB_API_KEY";
pub const ENV_PROVIDER_URL: &str = "CONNECT_STARS_PROVIDER_URL";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub board: Option<BoardConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub language: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// Highest "popular people" page a random pick may come from
    pub random_person_max_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    pub start_positions: Option<[Position; 2]>,
    pub default_position: Option<Position>,
    pub stagger: Option<Position>,
    pub stagger_wrap: Option<usize>,
}

/// Metadata provider connection settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSettings {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub language: String,
    pub timeout_seconds: u64,
    pub random_person_max_page: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            api_key: None,
            language: "en-US".to_string(),
            timeout_seconds: 10,
            random_person_max_page: 20,
        }
    }
}

impl ProviderSettings {
    fn from_config(config: &ProviderConfig) -> Self {
        let defaults = Self::default();
        Self {
            base_url: config.base_url.clone().unwrap_or(defaults.base_url),
            api_key: config.api_key.clone(),
            language: config.language.clone().unwrap_or(defaults.language),
            timeout_seconds: config.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            random_person_max_page: config
                .random_person_max_page
                .unwrap_or(defaults.random_person_max_page),
        }
    }

    /// Apply environment overrides; `lookup` is `std::env::var` outside tests
    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_PROVIDER_URL).filter(|u| !u.is_empty()) {
            self.base_url = url;
        }
        self
    }
}

fn layout_from_config(board: Option<&BoardConfig>) -> BoardLayout {
    let defaults = BoardLayout::default();
    let Some(board) = board else {
        return defaults;
    };
    BoardLayout {
        start_positions: board.start_positions.unwrap_or(defaults.start_positions),
        default_position: board.default_position.unwrap_or(defaults.default_position),
        stagger: board.stagger.unwrap_or(defaults.stagger),
        stagger_wrap: board.stagger_wrap.unwrap_or(defaults.stagger_wrap),
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub provider: ProviderSettings,
    pub layout: BoardLayout,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let user_config = dirs::config_dir()?.join("connect-stars").join(CONFIG_NAME);
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn resolve(config_file: Option<PathBuf>, lookup: impl Fn(&str) -> Option<String>) -> Result<ResolvedConfig> {
    let (provider, layout) = match config_file {
        Some(ref config_path) => {
            let config = load_config_file(config_path)?;
            (
                ProviderSettings::from_config(&config.provider),
                layout_from_config(config.board.as_ref()),
            )
        }
        None => (ProviderSettings::default(), BoardLayout::default()),
    };

    Ok(ResolvedConfig {
        provider: provider.apply_env(lookup),
        layout,
        config_file,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    resolve(find_config_file(), |name| std::env::var(name).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(temp: &TempDir, body: &str) -> PathBuf {
        let dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_NAME);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, |_| None).unwrap();
        assert_eq!(config.provider, ProviderSettings::default());
        assert_eq!(config.layout, BoardLayout::default());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
version: "1.0"
provider:
  api_key: from-file
  language: de-DE
  timeout_seconds: 3
board:
  start_positions:
    - { x: 0.0, y: 0.0 }
    - { x: 800.0, y: 0.0 }
  stagger_wrap: 4
"#,
        );

        let config = resolve(Some(path.clone()), |_| None).unwrap();
        assert_eq!(config.config_file, Some(path));
        assert_eq!(config.provider.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.provider.language, "de-DE");
        assert_eq!(config.provider.timeout_seconds, 3);
        assert_eq!(config.provider.base_url, ProviderSettings::default().base_url);
        assert_eq!(config.layout.start_positions[1], Position::new(800.0, 0.0));
        assert_eq!(config.layout.stagger_wrap, 4);
        assert_eq!(config.layout.default_position, BoardLayout::default().default_position);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
version: "1.0"
provider:
  api_key: from-file
"#,
        );

        let config = resolve(Some(path), |name| match name {
            ENV_API_KEY => Some("from-env".to_string()),
            ENV_PROVIDER_URL => Some("http://localhost:9999".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.provider.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "provider: [not, a, map");
        assert!(resolve(Some(path), |_| None).is_err());
    }
}
