//! Content enrichment: category, summary, and topic tags for a video.
//!
//! The [`Enricher`] trait is what the sync pipeline calls. The shipped
//! implementation, [`EnrichmentEngine`], asks an OpenAI-compatible chat
//! completion endpoint for a strict JSON answer when a key is configured and
//! degrades to [`heuristics`](crate::heuristics) otherwise:
//!
//! ```text
//! key configured? ──no──▶ heuristics::enrich
//!        │yes
//!        ▼
//! POST /chat/completions ──Err(EnrichError)──▶ warn! + heuristics::enrich
//!        │Ok
//!        ▼
//! normalize (empty category → preferred topic → "Uncategorized")
//! ```
//!
//! The remote call returns `Result<Enrichment, EnrichError>`; the engine
//! chooses to degrade explicitly, so `EnrichmentEngine::enrich` never fails.
//! Other `Enricher` implementations may fail, and the pipeline guards for it.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::heuristics;
use crate::models::{Enrichment, VideoMetadata};

/// Longest description excerpt sent in a prompt.
const PROMPT_DESCRIPTION_CHARS: usize = 2000;

const SYSTEM_PROMPT: &str = "You are an editorial assistant for a Netflix-style streaming video catalog. \
Given YouTube video metadata, respond ONLY with JSON: \
{\"category\": a short genre-style label (e.g. \"Tech Explained\", \"Lifestyle\", \"Music\"), \
\"summary\": 1-2 sentences for viewers or null, \
\"topics\": an array of 3-5 concise topical tags}. \
When preferredTopic is provided, lean towards it for the category.";

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("AI request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("AI API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("AI response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("AI response missing content: {0}")]
    MissingContent(String),
}

#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        video: &VideoMetadata,
        preferred_topic: Option<&str>,
    ) -> Result<Enrichment, EnrichError>;
}

pub struct EnrichmentEngine {
    remote: Option<ChatCompletionClient>,
}

impl EnrichmentEngine {
    /// Build an engine; `api_key = None` (or blank) means heuristics only.
    pub fn new(
        api_key: Option<String>,
        model: String,
        config: &AiConfig,
    ) -> Result<Self, EnrichError> {
        let remote = match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => Some(ChatCompletionClient::new(key, model, config)?),
            None => None,
        };
        Ok(Self { remote })
    }

    pub fn heuristic_only() -> Self {
        Self { remote: None }
    }

    pub fn is_ai_configured(&self) -> bool {
        self.remote.is_some()
    }
}

#[async_trait]
impl Enricher for EnrichmentEngine {
    async fn enrich(
        &self,
        video: &VideoMetadata,
        preferred_topic: Option<&str>,
    ) -> Result<Enrichment, EnrichError> {
        if let Some(remote) = &self.remote {
            match remote.complete(video, preferred_topic).await {
                Ok(answer) => return Ok(answer.normalize(video, preferred_topic)),
                Err(err) => warn!(
                    video = %video.youtube_id,
                    error = %err,
                    "AI enrichment failed, using heuristics"
                ),
            }
        }

        Ok(heuristics::enrich(
            &video.title,
            &video.description,
            preferred_topic,
        ))
    }
}

// ============ Remote client ============

struct ChatCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

/// The JSON object the model is constrained to produce.
#[derive(Debug, Deserialize)]
struct RemoteAnswer {
    category: String,
    summary: Option<String>,
    topics: Vec<String>,
}

impl ChatCompletionClient {
    fn new(api_key: String, model: String, config: &AiConfig) -> Result<Self, EnrichError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.trim().to_string(),
            model,
        })
    }

    async fn complete(
        &self,
        video: &VideoMetadata,
        preferred_topic: Option<&str>,
    ) -> Result<RemoteAnswer, EnrichError> {
        let description: String = video
            .description
            .chars()
            .take(PROMPT_DESCRIPTION_CHARS)
            .collect();
        let user_message = json!({
            "preferredTopic": preferred_topic,
            "title": video.title,
            "description": description,
            "channel": video.channel_title,
            "duration": video.duration,
        });

        let body = json!({
            "model": self.model,
            "temperature": 0.4,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_message.to_string()},
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "video_enrichment",
                    "strict": true,
                    "schema": {
                        "type": "object",
                        "required": ["category", "summary", "topics"],
                        "additionalProperties": false,
                        "properties": {
                            "category": {"type": "string"},
                            "summary": {"type": ["string", "null"]},
                            "topics": {
                                "type": "array",
                                "items": {"type": "string"},
                                "minItems": 3,
                                "maxItems": 5
                            }
                        }
                    }
                }
            }
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let json: serde_json::Value = serde_json::from_str(&text)?;

        if !status.is_success() {
            let message = json
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
                .to_string();
            return Err(EnrichError::Api {
                status: status.as_u16(),
                message,
            });
        }

        parse_completion(&json)
    }
}

/// Pull `choices[0].message.content` and decode it as a [`RemoteAnswer`].
fn parse_completion(json: &serde_json::Value) -> Result<RemoteAnswer, EnrichError> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| EnrichError::MissingContent("choices[0].message.content".to_string()))?;
    debug!(content_len = content.len(), "AI completion received");
    Ok(serde_json::from_str(content)?)
}

impl RemoteAnswer {
    fn normalize(self, video: &VideoMetadata, preferred_topic: Option<&str>) -> Enrichment {
        let category = Some(self.category.trim())
            .filter(|c| !c.is_empty())
            .or_else(|| preferred_topic.map(str::trim).filter(|t| !t.is_empty()))
            .unwrap_or(heuristics::UNCATEGORIZED)
            .to_string();

        let summary = self
            .summary
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| heuristics::summarize(&video.title, &video.description));

        let mut topics: Vec<String> = self
            .topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            topics = heuristics::extract_topics(
                &format!("{} {}", video.title, summary),
                heuristics::MAX_HEURISTIC_TOPICS,
            );
        }

        Enrichment {
            category,
            summary,
            topics,
        }
    }
}
