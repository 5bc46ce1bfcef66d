//! YouTube client tests against a local axum stub of the Data API.

mod common;

use common::{StubYouTube, API_KEY};
use reelhouse::config::YouTubeConfig;
use reelhouse::models::{Source, SourceKind};
use reelhouse::youtube::{discover_video_ids, ProviderError, VideoProvider, YouTubeClient};

fn client(base_url: &str, key: Option<&str>) -> YouTubeClient {
    let config = YouTubeConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        ..YouTubeConfig::default()
    };
    YouTubeClient::new(key.map(str::to_string), &config).unwrap()
}

fn source(kind: SourceKind, identifier: &str) -> Source {
    Source {
        id: 1,
        kind,
        identifier: identifier.to_string(),
        label: identifier.to_string(),
        ai_topic: None,
        collection: None,
        last_fetched_at: None,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

#[tokio::test]
async fn test_search_sends_expected_params() {
    let stub = StubYouTube::start().await;
    let yt = client(&stub.base_url, Some(API_KEY));

    let page = yt.search_by_channel("UC123", 75, None).await.unwrap();
    assert_eq!(page.video_ids, vec!["s1"]);
    assert!(page.next_page_token.is_none());

    let searches = stub.searches();
    let params = &searches[0];
    assert_eq!(params["channelId"], "UC123");
    assert_eq!(params["part"], "snippet");
    assert_eq!(params["type"], "video");
    assert_eq!(params["order"], "date");
    // Page size is capped at the provider limit.
    assert_eq!(params["maxResults"], "50");
    assert!(!params.contains_key("pageToken"));
}

#[tokio::test]
async fn test_discover_dedups_across_pages() {
    let stub = StubYouTube::start().await;
    let yt = client(&stub.base_url, Some(API_KEY));

    let ids = discover_video_ids(&yt, &source(SourceKind::Query, "dupes"), 40)
        .await
        .unwrap();
    assert_eq!(ids, vec!["a1", "b2", "c3"]);

    let searches = stub.searches();
    assert_eq!(searches.len(), 2);
    assert_eq!(searches[1]["pageToken"], "PAGE2");
}

#[tokio::test]
async fn test_discover_stops_at_max_results() {
    let stub = StubYouTube::start().await;
    let yt = client(&stub.base_url, Some(API_KEY));

    let ids = discover_video_ids(&yt, &source(SourceKind::Query, "dupes"), 1)
        .await
        .unwrap();
    assert_eq!(ids, vec!["a1"]);
    assert_eq!(stub.searches().len(), 1);
}

#[tokio::test]
async fn test_hydrate_batches_by_fifty() {
    let stub = StubYouTube::start().await;
    let yt = client(&stub.base_url, Some(API_KEY));

    let ids = discover_video_ids(&yt, &source(SourceKind::Channel, "many"), 120)
        .await
        .unwrap();
    assert_eq!(ids.len(), 120);

    let videos = yt.hydrate_details(&ids).await.unwrap();
    assert_eq!(videos.len(), 120);

    let batch_sizes: Vec<usize> = stub.video_batches().iter().map(Vec::len).collect();
    assert_eq!(batch_sizes, vec![50, 50, 20]);

    // Concatenated in request order.
    let hydrated: Vec<&str> = videos.iter().map(|v| v.youtube_id.as_str()).collect();
    let requested: Vec<&str> = ids.iter().map(String::as_str).collect();
    assert_eq!(hydrated, requested);
}

#[tokio::test]
async fn test_hydrate_decodes_metadata() {
    let stub = StubYouTube::start().await;
    let yt = client(&stub.base_url, Some(API_KEY));

    let videos = yt
        .hydrate_details(&["abc".to_string(), "noid".to_string()])
        .await
        .unwrap();
    assert_eq!(videos.len(), 2);

    let v = &videos[0];
    assert_eq!(v.youtube_id, "abc");
    assert_eq!(v.title, "Coding tutorial abc");
    assert_eq!(v.channel_title.as_deref(), Some("Stub Channel"));
    assert_eq!(v.duration.as_deref(), Some("PT4M13S"));
    assert_eq!(v.thumbnail_url, "https://i.ytimg.com/vi/abc/hqdefault.jpg");
    assert_eq!(v.thumbnails.len(), 2);
    assert_eq!(v.tags, vec!["rust", "tutorial"]);

    assert!(videos[1].youtube_id.is_empty());
}

#[tokio::test]
async fn test_api_error_message_is_surfaced() {
    let stub = StubYouTube::start().await;
    let yt = client(&stub.base_url, Some(API_KEY));

    let err = yt.search_by_query("quota", 10, None).await.unwrap_err();
    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("exceeded your quota"), "{}", message);
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_key_is_an_api_error() {
    let stub = StubYouTube::start().await;
    let yt = client(&stub.base_url, Some("wrong"));

    let err = yt.hydrate_details(&["abc".to_string()]).await.unwrap_err();
    assert!(err.to_string().contains("API key not valid"), "{}", err);
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let yt = client("http://127.0.0.1:9", Some(API_KEY));
    let err = yt.search_by_query("rust", 5, None).await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "{:?}", err);
}
