//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/repo-chat.sqlite"
//!
//! [repository]
//! root = "../.."
//! ignore_file = ".gitignore"
//! exclude_globs = ["**/dist/**"]
//! denied_extensions = ["bin", "sqlite3"]
//! max_content_chars = 20000
//!
//! [sync]
//! collection = "repo-chat"
//! batch_size = 100
//! folders = false
//! ```
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use repo_chat_core::identity::DEFAULT_MAX_CONTENT_CHARS;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/repo-chat.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Gitignore-style pattern file, relative to `root`.
    #[serde(default = "default_ignore_file")]
    pub ignore_file: PathBuf,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default = "default_denied_extensions")]
    pub denied_extensions: Vec<String>,
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            ignore_file: default_ignore_file(),
            exclude_globs: Vec::new(),
            denied_extensions: default_denied_extensions(),
            max_content_chars: default_max_content_chars(),
            follow_symlinks: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("./../../")
}
fn default_ignore_file() -> PathBuf {
    PathBuf::from(".gitignore")
}
fn default_denied_extensions() -> Vec<String> {
    vec!["bin".to_string(), "sqlite3".to_string()]
}
fn default_max_content_chars() -> usize {
    DEFAULT_MAX_CONTENT_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Upper bound on ids read back from the store per run.
    #[serde(default = "default_peek_limit")]
    pub peek_limit: usize,
    /// Also maintain folder-level documents in `<collection>-folders`.
    #[serde(default)]
    pub folders: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            batch_size: default_batch_size(),
            peek_limit: default_peek_limit(),
            folders: false,
        }
    }
}

fn default_collection() -> String {
    "repo-chat".to_string()
}
fn default_batch_size() -> usize {
    100
}
fn default_peek_limit() -> usize {
    100_000
}

impl SyncConfig {
    pub fn folder_collection(&self) -> String {
        format!("{}-folders", self.collection)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to the built-in defaults.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!(
            "config file {} not found, using defaults",
            path.display()
        );
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.sync.batch_size == 0 {
        bail!("sync.batch_size must be > 0");
    }
    if config.sync.peek_limit == 0 {
        bail!("sync.peek_limit must be > 0");
    }
    if config.sync.collection.trim().is_empty() {
        bail!("sync.collection must not be empty");
    }
    if config.repository.max_content_chars == 0 {
        bail!("repository.max_content_chars must be > 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sync.batch_size, 100);
        assert_eq!(config.sync.collection, "repo-chat");
        assert_eq!(config.repository.max_content_chars, 20_000);
        assert_eq!(config.repository.denied_extensions, vec!["bin", "sqlite3"]);
        assert_eq!(config.sync.folder_collection(), "repo-chat-folders");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            batch_size = 7

            [repository]
            root = "/srv/repo"
            "#,
        )
        .unwrap();
        assert_eq!(config.sync.batch_size, 7);
        assert_eq!(config.sync.peek_limit, 100_000);
        assert_eq!(config.repository.root, PathBuf::from("/srv/repo"));
        assert_eq!(config.repository.ignore_file, PathBuf::from(".gitignore"));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut config = Config::default();
        config.sync.batch_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_max_content_is_rejected() {
        let mut config = Config::default();
        config.repository.max_content_chars = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let config = load_config_or_default(Path::new("/nonexistent/repo-chat.toml")).unwrap();
        assert_eq!(config.sync.collection, "repo-chat");
    }
}
