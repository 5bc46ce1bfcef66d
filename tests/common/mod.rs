//! A local stand-in for the YouTube Data API, served with axum on an
//! ephemeral port.
//!
//! Search behaviour by `q` / `channelId`:
//!
//! - `dupes`: two pages, `[a1, b2]` then `[b2, c3]`.
//! - `many`: 120 sequential ids (`m0`..`m119`), paged by `maxResults`.
//! - `quota`: 403 with an API error envelope.
//! - anything else: a single page `[s1]`.
//!
//! Every request must carry `key=test-key`. `/videos` returns one item per
//! requested id; the id `noid` comes back without an `id` field.

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const API_KEY: &str = "test-key";
const MANY_TOTAL: usize = 120;

#[derive(Default)]
pub struct Recorded {
    pub searches: Mutex<Vec<HashMap<String, String>>>,
    pub video_batches: Mutex<Vec<Vec<String>>>,
}

pub struct StubYouTube {
    pub base_url: String,
    pub recorded: Arc<Recorded>,
}

impl StubYouTube {
    pub async fn start() -> Self {
        let recorded = Arc::new(Recorded::default());
        let app = Router::new()
            .route("/search", get(handle_search))
            .route("/videos", get(handle_videos))
            .with_state(recorded.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            recorded,
        }
    }

    pub fn video_batches(&self) -> Vec<Vec<String>> {
        self.recorded.video_batches.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<HashMap<String, String>> {
        self.recorded.searches.lock().unwrap().clone()
    }
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({"error": {"code": status.as_u16(), "message": message}})),
    )
        .into_response()
}

fn search_item(id: &str) -> Value {
    json!({"kind": "youtube#searchResult", "id": {"kind": "youtube#video", "videoId": id}})
}

async fn handle_search(
    State(recorded): State<Arc<Recorded>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    recorded.searches.lock().unwrap().push(params.clone());

    if params.get("key").map(String::as_str) != Some(API_KEY) {
        return api_error(StatusCode::BAD_REQUEST, "API key not valid. Please pass a valid API key.");
    }

    let target = params
        .get("q")
        .or_else(|| params.get("channelId"))
        .cloned()
        .unwrap_or_default();
    let token = params.get("pageToken").cloned();

    match target.as_str() {
        "quota" => api_error(StatusCode::FORBIDDEN, "The request cannot be completed because you have exceeded your quota."),
        "dupes" => match token.as_deref() {
            None => Json(json!({
                "items": [search_item("a1"), search_item("b2")],
                "nextPageToken": "PAGE2"
            }))
            .into_response(),
            _ => Json(json!({"items": [search_item("b2"), search_item("c3")]})).into_response(),
        },
        "many" => {
            let offset: usize = token.and_then(|t| t.parse().ok()).unwrap_or(0);
            let size: usize = params
                .get("maxResults")
                .and_then(|m| m.parse().ok())
                .unwrap_or(5);
            let end = (offset + size).min(MANY_TOTAL);
            let items: Vec<Value> = (offset..end).map(|n| search_item(&format!("m{}", n))).collect();
            let mut body = json!({"items": items});
            if end < MANY_TOTAL {
                body["nextPageToken"] = json!(end.to_string());
            }
            Json(body).into_response()
        }
        _ => Json(json!({"items": [search_item("s1")]})).into_response(),
    }
}

async fn handle_videos(
    State(recorded): State<Arc<Recorded>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("key").map(String::as_str) != Some(API_KEY) {
        return api_error(StatusCode::BAD_REQUEST, "API key not valid. Please pass a valid API key.");
    }

    let ids: Vec<String> = params
        .get("id")
        .map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    recorded.video_batches.lock().unwrap().push(ids.clone());

    let items: Vec<Value> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let mut item = json!({
                "kind": "youtube#video",
                "id": id,
                "snippet": {
                    "title": format!("Coding tutorial {}", id),
                    "description": format!("Learn Rust with {}. Part two follows.", id),
                    "channelTitle": "Stub Channel",
                    "publishedAt": format!("2024-05-{:02}T12:00:00Z", (i % 28) + 1),
                    "tags": ["rust", "tutorial"],
                    "thumbnails": {
                        "default": {"url": format!("https://i.ytimg.com/vi/{}/default.jpg", id), "width": 120, "height": 90},
                        "high": {"url": format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id), "width": 480, "height": 360}
                    }
                },
                "contentDetails": {"duration": "PT4M13S"}
            });
            if id == "noid" {
                if let Some(obj) = item.as_object_mut() {
                    obj.remove("id");
                }
            }
            item
        })
        .collect();

    Json(json!({"kind": "youtube#videoListResponse", "items": items})).into_response()
}
