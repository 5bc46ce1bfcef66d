//! Core data models used throughout Reelhouse.
//!
//! These types represent the sources, videos, collections, and sync results
//! that flow between the provider client, the enrichment engine, and the
//! catalog store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a [`Source`] discovers videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Crawl a single channel, newest first.
    Channel,
    /// Keyword search across the whole provider.
    Query,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Channel => "channel",
            SourceKind::Query => "query",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source type '{0}' (expected 'channel' or 'query')")]
pub struct UnknownSourceKind(pub String);

impl FromStr for SourceKind {
    type Err = UnknownSourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "channel" => Ok(SourceKind::Channel),
            "query" | "search" => Ok(SourceKind::Query),
            other => Err(UnknownSourceKind(other.to_string())),
        }
    }
}

/// A configured discovery rule, stored in `video_sources`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub id: i64,
    pub kind: SourceKind,
    /// Channel ID or free-text query, depending on `kind`.
    pub identifier: String,
    pub label: String,
    /// Hint passed to the enrichment engine to bias categorization.
    pub ai_topic: Option<String>,
    /// Curated collection every video from this source joins, alongside
    /// its AI category.
    pub collection: Option<String>,
    pub last_fetched_at: Option<String>,
    pub created_at: String,
}

/// Input for [`CatalogStore::create_source`](crate::catalog::CatalogStore::create_source).
#[derive(Debug, Clone)]
pub struct NewSource {
    pub kind: SourceKind,
    pub identifier: String,
    pub label: String,
    pub ai_topic: Option<String>,
    pub collection: Option<String>,
}

/// One entry of the provider's `thumbnails` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Thumbnails keyed by size name (`default`, `medium`, `high`, ...).
pub type Thumbnails = BTreeMap<String, Thumbnail>;

/// Hydrated metadata for a single video, as returned by the provider.
///
/// `youtube_id` is empty when the provider returned an item without an id;
/// the sync pipeline counts those as skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoMetadata {
    pub youtube_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: Option<String>,
    pub published_at: Option<String>,
    /// ISO 8601 duration, e.g. `PT12M3S`.
    pub duration: Option<String>,
    pub thumbnails: Thumbnails,
    /// Best available thumbnail, resolved at decode time.
    pub thumbnail_url: String,
    pub tags: Vec<String>,
}

/// Output of the enrichment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub category: String,
    pub summary: String,
    pub topics: Vec<String>,
}

/// Everything needed to insert or update one `videos` row.
#[derive(Debug, Clone, Default)]
pub struct VideoPayload {
    pub youtube_id: String,
    pub source_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub channel_title: Option<String>,
    pub published_at: Option<String>,
    pub duration: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnails: Thumbnails,
    pub tags: Vec<String>,
    pub ai_category: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_topics: Vec<String>,
}

/// A stored video, with JSON columns decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
    pub id: i64,
    pub youtube_id: String,
    pub source_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub channel_title: Option<String>,
    pub published_at: Option<String>,
    pub duration: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnails: Thumbnails,
    pub tags: Vec<String>,
    pub ai_category: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_topics: Vec<String>,
    pub collections: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// A homepage row: videos sharing a category, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup {
    pub name: String,
    pub slug: String,
    pub hero: Option<Video>,
    pub videos: Vec<Video>,
}

/// Filter for [`CatalogStore::fetch_videos`](crate::catalog::CatalogStore::fetch_videos).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoFilter {
    /// Case-insensitive substring over title, description, and channel.
    pub search: Option<String>,
    /// Exact match on the AI category or the source label.
    pub category: Option<String>,
    pub limit: Option<i64>,
}

/// Outcome of synchronizing one source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSyncResult {
    pub source: Source,
    pub synced: usize,
    pub skipped: usize,
    /// Non-fatal warnings and per-video errors, in the order they occurred.
    pub errors: Vec<String>,
}

impl SourceSyncResult {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            synced: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }
}
