//! YouTube Data API v3 client.
//!
//! Wraps the two endpoints the pipeline needs:
//!
//! | Endpoint | Used for |
//! |----------|----------|
//! | `GET /search` | Discover video IDs by keyword or channel (paginated, ≤50 per page) |
//! | `GET /videos` | Hydrate full metadata for up to 50 IDs per call |
//!
//! The [`VideoProvider`] trait is the seam the [`sync`](crate::sync) pipeline
//! depends on, so tests can substitute an in-memory provider.
//!
//! # Errors
//!
//! Every request fails as a whole on a transport error, a non-2xx status, or
//! a body that is not valid JSON. API errors are surfaced with the message
//! from the provider's `{"error": {"message": ...}}` envelope. Nothing is
//! retried.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::debug;

use crate::config::YouTubeConfig;
use crate::models::{Source, SourceKind, Thumbnail, Thumbnails, VideoMetadata};

/// Maximum page size and batch size accepted by the provider.
pub const MAX_PAGE_SIZE: usize = 50;

/// Thumbnail sizes, best first.
const THUMBNAIL_PREFERENCE: [&str; 5] = ["maxres", "standard", "high", "medium", "default"];

const THUMBNAIL_CDN: &str = "https://img.youtube.com/vi/";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(
        "YouTube API key missing. Set YOUTUBE_API_KEY, [youtube].api_key, or save one with `reel keys set --youtube`."
    )]
    MissingApiKey,
    #[error("YouTube API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("YouTube API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("YouTube API returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Keyword search, newest first.
    async fn search_by_query(
        &self,
        query: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<SearchPage, ProviderError>;

    /// Videos uploaded by one channel, newest first.
    async fn search_by_channel(
        &self,
        channel_id: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<SearchPage, ProviderError>;

    /// Full metadata for `video_ids`, batched by [`MAX_PAGE_SIZE`].
    async fn hydrate_details(&self, video_ids: &[String])
        -> Result<Vec<VideoMetadata>, ProviderError>;
}

/// Collect up to `max_results` distinct video IDs for `source`, following
/// `nextPageToken` until the quota is met or the provider runs out of pages.
///
/// IDs are returned in discovery order; duplicates across pages are dropped.
pub async fn discover_video_ids(
    provider: &dyn VideoProvider,
    source: &Source,
    max_results: usize,
) -> Result<Vec<String>, ProviderError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut seen_tokens: HashSet<String> = HashSet::new();
    let mut ids = Vec::new();
    let mut page_token: Option<String> = None;

    while ids.len() < max_results {
        let remaining = (max_results - ids.len()).min(MAX_PAGE_SIZE);
        let page = match source.kind {
            SourceKind::Query => {
                provider
                    .search_by_query(&source.identifier, remaining, page_token.as_deref())
                    .await?
            }
            SourceKind::Channel => {
                provider
                    .search_by_channel(&source.identifier, remaining, page_token.as_deref())
                    .await?
            }
        };

        debug!(
            source = %source.label,
            page_ids = page.video_ids.len(),
            has_next = page.next_page_token.is_some(),
            "search page"
        );

        let page_was_empty = page.video_ids.is_empty();
        for id in page.video_ids {
            if ids.len() >= max_results {
                break;
            }
            if !id.is_empty() && seen.insert(id.clone()) {
                ids.push(id);
            }
        }

        match page.next_page_token {
            Some(token) if !page_was_empty && seen_tokens.insert(token.clone()) => {
                page_token = Some(token);
            }
            _ => break,
        }
    }

    Ok(ids)
}

/// Pick the best thumbnail by size preference, falling back to the CDN
/// image every video has.
pub fn best_thumbnail(thumbnails: &Thumbnails, youtube_id: &str) -> String {
    THUMBNAIL_PREFERENCE
        .iter()
        .filter_map(|size| thumbnails.get(*size))
        .map(|t| t.url.trim())
        .find(|url| !url.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback_thumbnail(youtube_id))
}

fn fallback_thumbnail(youtube_id: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse(THUMBNAIL_CDN) else {
        return format!("{}{}/hqdefault.jpg", THUMBNAIL_CDN, youtube_id);
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(youtube_id).push("hqdefault.jpg");
    }
    url.to_string()
}

// ============ HTTP client ============

pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl YouTubeClient {
    pub fn new(api_key: Option<String>, config: &YouTubeConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn require_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)
    }

    async fn search(
        &self,
        mut params: Vec<(&'static str, String)>,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<SearchPage, ProviderError> {
        params.extend([
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("order", "date".to_string()),
            (
                "maxResults",
                max_results.clamp(1, MAX_PAGE_SIZE).to_string(),
            ),
            ("key", self.require_key()?.to_string()),
        ]);
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let response: SearchResponse = self.get("search", &params).await?;
        Ok(SearchPage {
            video_ids: response
                .items
                .into_iter()
                .filter_map(|item| item.id.video_id)
                .collect(),
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, endpoint))
            .header("Accept", "application/json")
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let json: serde_json::Value = serde_json::from_str(&body)?;

        if !status.is_success() {
            let message = json
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
                .to_string();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_value(json)?)
    }
}

#[async_trait]
impl VideoProvider for YouTubeClient {
    async fn search_by_query(
        &self,
        query: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<SearchPage, ProviderError> {
        self.search(vec![("q", query.to_string())], max_results, page_token)
            .await
    }

    async fn search_by_channel(
        &self,
        channel_id: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<SearchPage, ProviderError> {
        self.search(
            vec![("channelId", channel_id.to_string())],
            max_results,
            page_token,
        )
        .await
    }

    async fn hydrate_details(
        &self,
        video_ids: &[String],
    ) -> Result<Vec<VideoMetadata>, ProviderError> {
        let mut videos = Vec::with_capacity(video_ids.len());

        for batch in video_ids.chunks(MAX_PAGE_SIZE) {
            let params = [
                ("part", "snippet,contentDetails".to_string()),
                ("id", batch.join(",")),
                ("key", self.require_key()?.to_string()),
            ];
            let response: VideosResponse = self.get("videos", &params).await?;
            videos.extend(response.items.into_iter().map(VideoItem::into_metadata));
        }

        Ok(videos)
    }
}

// ============ Wire types ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: SearchItemId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    channel_title: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    thumbnails: BTreeMap<String, RawThumbnail>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

impl VideoItem {
    fn into_metadata(self) -> VideoMetadata {
        let youtube_id = self.id.unwrap_or_default().trim().to_string();
        let thumbnails: Thumbnails = self
            .snippet
            .thumbnails
            .into_iter()
            .filter_map(|(size, raw)| {
                let url = raw.url.filter(|u| !u.is_empty())?;
                Some((
                    size,
                    Thumbnail {
                        url,
                        width: raw.width,
                        height: raw.height,
                    },
                ))
            })
            .collect();
        let thumbnail_url = best_thumbnail(&thumbnails, &youtube_id);

        VideoMetadata {
            title: self
                .snippet
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            description: self.snippet.description.unwrap_or_default(),
            channel_title: self.snippet.channel_title,
            published_at: self.snippet.published_at,
            duration: self.content_details.duration,
            thumbnails,
            thumbnail_url,
            tags: self.snippet.tags,
            youtube_id,
        }
    }
}
