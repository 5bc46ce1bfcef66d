//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/reel.sqlite"
//!
//! [youtube]
//! # api_key = "..."          # or YOUTUBE_API_KEY, or `reel keys set --youtube`
//! timeout_secs = 20
//!
//! [ai]
//! # api_key = "..."          # or OPENAI_API_KEY
//! model = "gpt-4o-mini"       # or OPENAI_MODEL
//!
//! [sync]
//! default_limit = 40
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! # admin_password = "..."
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct YouTubeConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
    #[serde(default = "default_youtube_timeout")]
    pub timeout_secs: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_youtube_base_url(),
            timeout_secs: default_youtube_timeout(),
        }
    }
}

fn default_youtube_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}
fn default_youtube_timeout() -> u64 {
    20
}

pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Falls back to `OPENAI_MODEL`, then [`DEFAULT_AI_MODEL`].
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            base_url: default_ai_base_url(),
            timeout_secs: default_ai_timeout(),
        }
    }
}

fn default_ai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_ai_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_sync_limit")]
    pub default_limit: usize,
    /// Upper bound on AI/heuristic topics persisted per video.
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,
    /// Upper bound on provider tags persisted per video.
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_limit: default_sync_limit(),
            max_topics: default_max_topics(),
            max_tags: default_max_tags(),
        }
    }
}

fn default_sync_limit() -> usize {
    40
}
fn default_max_topics() -> usize {
    8
}
fn default_max_tags() -> usize {
    25
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            admin_password: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    /// A config with every section defaulted, pointing at `./data/reel.sqlite`.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/reel.sqlite"),
            },
            youtube: YouTubeConfig::default(),
            ai: AiConfig::default(),
            sync: SyncConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.sync.default_limit == 0 {
        anyhow::bail!("sync.default_limit must be >= 1");
    }
    if config.sync.max_topics == 0 {
        anyhow::bail!("sync.max_topics must be >= 1");
    }
    if config.youtube.timeout_secs == 0 || config.ai.timeout_secs == 0 {
        anyhow::bail!("timeout_secs must be > 0");
    }
    if config.ai.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
        anyhow::bail!("ai.model must not be empty");
    }
    for (name, url) in [
        ("youtube.base_url", &config.youtube.base_url),
        ("ai.base_url", &config.ai.base_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("{} must be an http(s) URL, got '{}'", name, url);
        }
    }
    Ok(())
}
