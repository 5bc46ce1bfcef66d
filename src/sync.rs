//! Synchronization pipeline.
//!
//! For each source, in `all_sources()` order:
//!
//! ```text
//! discover_video_ids ──▶ hydrate_details ──▶ per video:
//!                                              empty id      → skipped
//!                                              enrich (Err)  → fallback + warning
//!                                              upsert (Err)  → "<id>: …", continue
//!                                              ok            → synced
//!                       mark_fetched ◀──────────────┘
//! ```
//!
//! A provider failure in discovery or hydration ends that source's run (its
//! error lands in the result) and the next source still runs. Only catalog
//! failures outside the per-video loop propagate as `Err`.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::db;
use crate::enrich::{Enricher, EnrichmentEngine};
use crate::models::{Enrichment, Source, SourceSyncResult, VideoMetadata, VideoPayload};
use crate::settings::{Credentials, SettingsStore};
use crate::youtube::{self, VideoProvider, YouTubeClient};

/// Category used when enrichment fails and the source has no topic hint.
pub const FALLBACK_CATEGORY: &str = "General";

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub max_topics: usize,
    pub max_tags: usize,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_topics: config.sync.max_topics,
            max_tags: config.sync.max_tags,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_topics: 8,
            max_tags: 25,
        }
    }
}

pub struct Synchronizer<'a> {
    catalog: &'a CatalogStore,
    provider: &'a dyn VideoProvider,
    enricher: &'a dyn Enricher,
    options: SyncOptions,
}

impl<'a> Synchronizer<'a> {
    pub fn new(
        catalog: &'a CatalogStore,
        provider: &'a dyn VideoProvider,
        enricher: &'a dyn Enricher,
        options: SyncOptions,
    ) -> Self {
        Self {
            catalog,
            provider,
            enricher,
            options,
        }
    }

    /// Sync one source (`Some(id)`) or all of them, collecting up to
    /// `max_results` videos per source.
    ///
    /// An unknown `source_id` yields an empty list.
    pub async fn synchronize(
        &self,
        source_id: Option<i64>,
        max_results: usize,
    ) -> Result<Vec<SourceSyncResult>> {
        let sources: Vec<Source> = match source_id {
            Some(id) => self.catalog.find_source(id).await?.into_iter().collect(),
            None => self.catalog.all_sources().await?,
        };

        let max_results = max_results.max(1);
        let mut results = Vec::with_capacity(sources.len());
        for source in sources {
            results.push(self.sync_source(source, max_results).await?);
        }
        Ok(results)
    }

    async fn sync_source(&self, source: Source, max_results: usize) -> Result<SourceSyncResult> {
        info!(source = %source.label, kind = %source.kind, "syncing source");
        let mut result = SourceSyncResult::new(source);

        let videos = match self.fetch(&result.source, max_results).await {
            Ok(videos) => videos,
            Err(err) => {
                warn!(source = %result.source.label, error = %err, "provider request failed");
                result.errors.push(err.to_string());
                return Ok(result);
            }
        };

        for video in videos {
            if video.youtube_id.is_empty() {
                result.skipped += 1;
                continue;
            }

            let enrichment = match self
                .enricher
                .enrich(&video, result.source.ai_topic.as_deref())
                .await
            {
                Ok(enrichment) => enrichment,
                Err(err) => {
                    warn!(video = %video.youtube_id, error = %err, "enrichment failed, using fallback");
                    result
                        .errors
                        .push(format!("AI enrichment fallback: {}", err));
                    fallback_enrichment(&video, result.source.ai_topic.as_deref())
                }
            };

            let payload = self.payload(&result.source, video, enrichment);
            let collections = video_collections(
                result.source.collection.as_deref(),
                payload.ai_category.as_deref(),
            );
            match self.catalog.upsert_video(&payload, &collections).await {
                Ok(_) => result.synced += 1,
                Err(err) => {
                    warn!(video = %payload.youtube_id, error = %err, "failed to store video");
                    result
                        .errors
                        .push(format!("{}: {:#}", payload.youtube_id, err));
                }
            }
        }

        self.catalog
            .mark_fetched(result.source.id)
            .await
            .with_context(|| format!("failed to mark source {} as fetched", result.source.id))?;

        info!(
            source = %result.source.label,
            synced = result.synced,
            skipped = result.skipped,
            errors = result.errors.len(),
            "source synced"
        );
        Ok(result)
    }

    async fn fetch(
        &self,
        source: &Source,
        max_results: usize,
    ) -> Result<Vec<VideoMetadata>, youtube::ProviderError> {
        let ids = youtube::discover_video_ids(self.provider, source, max_results).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.provider.hydrate_details(&ids).await
    }

    fn payload(&self, source: &Source, video: VideoMetadata, enrichment: Enrichment) -> VideoPayload {
        let mut topics = enrichment.topics;
        topics.truncate(self.options.max_topics);
        let mut tags = video.tags;
        tags.truncate(self.options.max_tags);

        VideoPayload {
            youtube_id: video.youtube_id,
            source_id: Some(source.id),
            title: video.title,
            description: video.description,
            channel_title: video.channel_title,
            published_at: video.published_at,
            duration: video.duration,
            thumbnail_url: Some(video.thumbnail_url).filter(|u| !u.is_empty()),
            thumbnails: video.thumbnails,
            tags,
            ai_category: Some(enrichment.category).filter(|c| !c.trim().is_empty()),
            ai_summary: Some(enrichment.summary).filter(|s| !s.trim().is_empty()),
            ai_topics: topics,
        }
    }
}

/// Minimal enrichment for a video whose enricher returned an error.
/// The source's curated collection first, then the AI category, without
/// blanks or repeats.
pub fn video_collections(curated: Option<&str>, category: Option<&str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(2);
    for name in [curated, category].into_iter().flatten().map(str::trim) {
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

pub fn fallback_enrichment(video: &VideoMetadata, ai_topic: Option<&str>) -> Enrichment {
    Enrichment {
        category: ai_topic
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(FALLBACK_CATEGORY)
            .to_string(),
        summary: video.description.clone(),
        topics: Vec::new(),
    }
}

/// Build the live provider and enricher from stored credentials and run a
/// sync against `pool`.
pub async fn sync_with_pool(
    pool: &SqlitePool,
    config: &Config,
    source_id: Option<i64>,
    max_results: usize,
) -> Result<Vec<SourceSyncResult>> {
    let settings = SettingsStore::new(pool.clone());
    let credentials = Credentials::resolve(&settings, config).await?;

    let provider = YouTubeClient::new(credentials.youtube_api_key, &config.youtube)
        .context("failed to build YouTube client")?;
    let enricher = EnrichmentEngine::new(
        credentials.openai_api_key,
        credentials.openai_model,
        &config.ai,
    )
    .context("failed to build enrichment client")?;
    if !enricher.is_ai_configured() {
        info!("no AI key configured, using heuristic enrichment");
    }

    let catalog = CatalogStore::new(pool.clone());
    Synchronizer::new(
        &catalog,
        &provider,
        &enricher,
        SyncOptions::from_config(config),
    )
    .synchronize(source_id, max_results)
    .await
}

/// `reel sync`: run the pipeline and print a per-source report to stdout.
pub async fn run_sync(config: &Config, source_id: Option<i64>, limit: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;
    let limit = limit.unwrap_or(config.sync.default_limit).max(1);

    let results = sync_with_pool(&pool, config, source_id, limit).await?;
    pool.close().await;

    print!("{}", format_report(&results));
    Ok(())
}

/// Human-readable report, one block per source.
pub fn format_report(results: &[SourceSyncResult]) -> String {
    if results.is_empty() {
        return "No sources configured yet. Add one with `reel sources add`.\n".to_string();
    }

    let mut out = String::new();
    for result in results {
        out.push_str(&format!("Source: {}\n", result.source.label));
        out.push_str(&"-".repeat(60));
        out.push('\n');
        out.push_str(&format!("Synced videos: {}\n", result.synced));
        if result.skipped > 0 {
            out.push_str(&format!("Skipped videos: {}\n", result.skipped));
        }
        if !result.errors.is_empty() {
            out.push_str("Warnings:\n");
            for error in &result.errors {
                out.push_str(&format!(" - {}\n", error));
            }
        }
        out.push('\n');
    }
    out
}
