//! Admin actions shared by the CLI and the HTTP API.
//!
//! Every action returns an [`ActionOutcome`]: user-facing success messages,
//! user-facing errors, and (for sync) the per-source results. Validation
//! problems are reported in `errors` before any database or provider work.
//! Only infrastructure failures (the database going away) surface as `Err`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::db;
use crate::models::{NewSource, SourceKind, SourceSyncResult, UnknownSourceKind};
use crate::settings::{self, SettingsStore};
use crate::sync;

pub const DEFAULT_SYNC_LIMIT: usize = 10;
pub const MAX_SYNC_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    UnknownKind(#[from] UnknownSourceKind),
    #[error("An identifier (channel ID or search query) is required.")]
    MissingIdentifier,
    #[error("A valid source ID is required.")]
    InvalidSourceId,
    #[error("Source {0} not found.")]
    SourceNotFound(i64),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddSourceForm {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub ai_topic: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveKeysForm {
    #[serde(default)]
    pub youtube_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub openai_model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionOutcome {
    pub messages: Vec<String>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<SourceSyncResult>,
    /// Set when the action targeted a source that does not exist.
    #[serde(skip)]
    pub not_found: bool,
}

impl ActionOutcome {
    fn message(msg: impl Into<String>) -> Self {
        Self {
            messages: vec![msg.into()],
            ..Default::default()
        }
    }

    fn error(err: impl ToString) -> Self {
        Self {
            errors: vec![err.to_string()],
            ..Default::default()
        }
    }

    fn missing(source_id: i64) -> Self {
        Self {
            not_found: true,
            ..Self::error(AdminError::SourceNotFound(source_id))
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Clamp a requested sync limit into `1..=50`; absent or non-positive values
/// become [`DEFAULT_SYNC_LIMIT`].
pub fn sanitize_limit(limit: Option<i64>) -> usize {
    match limit {
        Some(n) if n >= 1 => (n as u64).min(MAX_SYNC_LIMIT as u64) as usize,
        _ => DEFAULT_SYNC_LIMIT,
    }
}

pub struct AdminActions<'a> {
    pool: &'a SqlitePool,
    config: &'a Config,
}

impl<'a> AdminActions<'a> {
    pub fn new(pool: &'a SqlitePool, config: &'a Config) -> Self {
        Self { pool, config }
    }

    fn catalog(&self) -> CatalogStore {
        CatalogStore::new(self.pool.clone())
    }

    pub async fn add_source(&self, form: AddSourceForm) -> Result<ActionOutcome> {
        let new_source = match validate_source(form) {
            Ok(source) => source,
            Err(err) => return Ok(ActionOutcome::error(err)),
        };

        match self.catalog().create_source(&new_source).await {
            Ok(source) => Ok(ActionOutcome::message(format!(
                "Source \"{}\" added (id {}).",
                source.label, source.id
            ))),
            // Duplicates are user errors, not infrastructure failures.
            Err(err) => Ok(ActionOutcome::error(err)),
        }
    }

    pub async fn delete_source(&self, source_id: i64) -> Result<ActionOutcome> {
        if source_id <= 0 {
            return Ok(ActionOutcome::error(AdminError::InvalidSourceId));
        }
        if self.catalog().delete_source(source_id).await? {
            Ok(ActionOutcome::message("Source removed."))
        } else {
            Ok(ActionOutcome::missing(source_id))
        }
    }

    pub async fn sync_sources(
        &self,
        source_id: Option<i64>,
        limit: Option<i64>,
    ) -> Result<ActionOutcome> {
        let limit = sanitize_limit(limit);
        let results = sync::sync_with_pool(self.pool, self.config, source_id, limit).await?;

        let mut outcome = match (results.is_empty(), source_id) {
            (true, Some(id)) => ActionOutcome::missing(id),
            (true, None) => ActionOutcome::error("No sources configured yet."),
            (false, _) => ActionOutcome::default(),
        };
        if !results.is_empty() {
            let synced: usize = results.iter().map(|r| r.synced).sum();
            outcome.messages.push(format!(
                "Synced {} video(s) across {} source(s).",
                synced,
                results.len()
            ));
        }
        outcome.results = results;
        Ok(outcome)
    }

    pub async fn save_keys(&self, form: SaveKeysForm) -> Result<ActionOutcome> {
        let store = SettingsStore::new(self.pool.clone());
        let mut outcome = ActionOutcome::default();

        let entries = [
            (settings::YOUTUBE_API_KEY, form.youtube_api_key, "YouTube API key"),
            (settings::OPENAI_API_KEY, form.openai_api_key, "OpenAI API key"),
            (settings::OPENAI_MODEL, form.openai_model, "OpenAI model"),
        ];
        for (key, value, name) in entries {
            let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
            else {
                continue;
            };
            store.set(key, &value).await?;
            outcome.messages.push(format!("{} saved.", name));
        }

        if outcome.messages.is_empty() {
            outcome
                .messages
                .push("No changes were made. Provide at least one value to update.".to_string());
        }
        Ok(outcome)
    }
}

/// Print messages to stdout; turn user-facing errors into an `Err`.
pub fn print_outcome(outcome: &ActionOutcome) -> Result<()> {
    for message in &outcome.messages {
        println!("{}", message);
    }
    if !outcome.is_ok() {
        anyhow::bail!("{}", outcome.errors.join(" "));
    }
    Ok(())
}

/// `reel keys set`.
pub async fn run_save_keys(config: &Config, form: SaveKeysForm) -> Result<()> {
    let pool = db::connect(config).await?;
    let outcome = AdminActions::new(&pool, config).save_keys(form).await?;
    pool.close().await;
    print_outcome(&outcome)
}

fn validate_source(form: AddSourceForm) -> Result<NewSource, AdminError> {
    let kind: SourceKind = form.kind.parse()?;
    let identifier = form.identifier.trim().to_string();
    if identifier.is_empty() {
        return Err(AdminError::MissingIdentifier);
    }
    let label = match form.label.trim() {
        "" => identifier.clone(),
        label => label.to_string(),
    };
    let ai_topic = non_blank(form.ai_topic);
    let collection = non_blank(form.collection);

    Ok(NewSource {
        kind,
        identifier,
        label,
        ai_topic,
        collection,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_limit() {
        assert_eq!(sanitize_limit(None), 10);
        assert_eq!(sanitize_limit(Some(0)), 10);
        assert_eq!(sanitize_limit(Some(-5)), 10);
        assert_eq!(sanitize_limit(Some(1)), 1);
        assert_eq!(sanitize_limit(Some(50)), 50);
        assert_eq!(sanitize_limit(Some(51)), 50);
        assert_eq!(sanitize_limit(Some(i64::MAX)), 50);
    }

    #[test]
    fn test_validate_source_trims_and_defaults_label() {
        let source = validate_source(AddSourceForm {
            kind: " Channel ".into(),
            identifier: "  UC123 ".into(),
            label: "   ".into(),
            ai_topic: Some("  ".into()),
            collection: Some(" Weekend Watchlist ".into()),
        })
        .unwrap();
        assert_eq!(source.kind, SourceKind::Channel);
        assert_eq!(source.identifier, "UC123");
        assert_eq!(source.label, "UC123");
        assert!(source.ai_topic.is_none());
        assert_eq!(source.collection.as_deref(), Some("Weekend Watchlist"));
    }

    #[test]
    fn test_validate_source_rejects_bad_input() {
        let err = validate_source(AddSourceForm {
            kind: "playlist".into(),
            identifier: "x".into(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AdminError::UnknownKind(_)));

        let err = validate_source(AddSourceForm {
            kind: "query".into(),
            identifier: "   ".into(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AdminError::MissingIdentifier));
    }
}
