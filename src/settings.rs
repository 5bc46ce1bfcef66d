//! Key/value settings persisted in the `settings` table.
//!
//! API credentials saved from the admin API or `reel keys set` live here and
//! take precedence over the config file and the environment.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::{Config, DEFAULT_AI_MODEL};

pub const YOUTUBE_API_KEY: &str = "youtube_api_key";
pub const OPENAI_API_KEY: &str = "openai_api_key";
pub const OPENAI_MODEL: &str = "openai_model";

#[derive(Clone)]
pub struct SettingsStore {
    pool: SqlitePool,
}

impl SettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ? LIMIT 1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.flatten())
    }

    /// Insert or replace the whole value for `key`.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Credentials resolved from settings, then config, then environment. The
/// model falls back to [`DEFAULT_AI_MODEL`] when none of them set it.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub youtube_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

impl Credentials {
    pub async fn resolve(settings: &SettingsStore, config: &Config) -> Result<Self> {
        let youtube_api_key = first_present([
            settings.get(YOUTUBE_API_KEY).await?,
            config.youtube.api_key.clone(),
            std::env::var("YOUTUBE_API_KEY").ok(),
        ]);
        let openai_api_key = first_present([
            settings.get(OPENAI_API_KEY).await?,
            config.ai.api_key.clone(),
            std::env::var("OPENAI_API_KEY").ok(),
        ]);
        let openai_model = first_present([
            settings.get(OPENAI_MODEL).await?,
            config.ai.model.clone(),
            std::env::var("OPENAI_MODEL").ok(),
        ])
        .unwrap_or_else(|| DEFAULT_AI_MODEL.to_string());

        Ok(Self {
            youtube_api_key,
            openai_api_key,
            openai_model,
        })
    }
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
