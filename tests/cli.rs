//! CLI tests driving the compiled `reel` binary.

mod common;

use common::{StubYouTube, API_KEY};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn reel_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("reel");
    path
}

fn setup_test_env(youtube: Option<(&str, &str)>) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let youtube_section = match youtube {
        Some((base_url, key)) => format!(
            "[youtube]\nbase_url = \"{}\"\napi_key = \"{}\"\ntimeout_secs = 5\n",
            base_url, key
        ),
        None => String::new(),
    };

    let config_content = format!(
        r#"[db]
path = "{}/data/reel.sqlite"

{}
[ai]
base_url = "http://127.0.0.1:9"
timeout_secs = 1

[sync]
default_limit = 40
"#,
        root.display(),
        youtube_section
    );

    let config_path = config_dir.join("reel.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_reel(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = reel_binary();
    let workdir = config_path.parent().and_then(Path::parent).unwrap();
    let output = Command::new(&binary)
        .current_dir(workdir)
        .env_remove("YOUTUBE_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_MODEL")
        .env("RUST_LOG", "off")
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run reel binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env(None);

    let (stdout, stderr, success) = run_reel(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/reel.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env(None);

    let (_, _, success1) = run_reel(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_reel(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_sync_without_sources() {
    let (_tmp, config_path) = setup_test_env(None);
    run_reel(&config_path, &["init"]);

    let (stdout, stderr, success) = run_reel(&config_path, &["sync"]);
    assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("No sources configured yet"));
}

#[test]
fn test_missing_config_reports_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("config/nope.toml");

    let output = Command::new(reel_binary())
        .current_dir(tmp.path())
        .arg("--config")
        .arg(&missing)
        .arg("sync")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("[error] "), "stderr={}", stderr);
    assert!(stderr.contains("Failed to read config file"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sync_limit_below_one_is_raised_to_one() {
    let stub = StubYouTube::start().await;
    let (_tmp, config_path) = setup_test_env(Some((&stub.base_url, API_KEY)));

    let (zero, negative) = tokio::task::spawn_blocking(move || {
        run_reel(&config_path, &["init"]);
        run_reel(&config_path, &["sources", "add", "channel", "dupes"]);
        let zero = run_reel(&config_path, &["sync", "--limit=0"]);
        let negative = run_reel(&config_path, &["sync", "--limit", "-3"]);
        (zero, negative)
    })
    .await
    .unwrap();

    for (stdout, stderr, success) in [zero, negative] {
        assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
        assert!(stdout.contains("Synced videos: 1"), "stdout={}", stdout);
    }
    assert!(stub
        .video_batches()
        .iter()
        .all(|batch| batch == &vec!["a1".to_string()]));
}

#[test]
fn test_sources_add_list_remove() {
    let (_tmp, config_path) = setup_test_env(None);
    run_reel(&config_path, &["init"]);

    let (stdout, stderr, success) = run_reel(
        &config_path,
        &[
            "sources",
            "add",
            "channel",
            "UC123",
            "--label",
            "Test Channel",
            "--collection",
            "Weekend Watchlist",
        ],
    );
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Test Channel"));

    let (stdout, _, success) = run_reel(&config_path, &["sources", "list"]);
    assert!(success);
    assert!(stdout.contains("UC123"));
    assert!(stdout.contains("Weekend Watchlist"));
    assert!(stdout.contains("never"));

    let (_, stderr, success) = run_reel(&config_path, &["sources", "add", "channel", "UC123"]);
    assert!(!success, "duplicate source should fail");
    assert!(stderr.contains("[error]") && stderr.contains("already exists"), "{}", stderr);

    let (_, stderr, success) = run_reel(&config_path, &["sources", "add", "playlist", "PL1"]);
    assert!(!success);
    assert!(stderr.contains("unknown source type"), "{}", stderr);

    let (stdout, _, success) = run_reel(&config_path, &["sources", "remove", "1"]);
    assert!(success);
    assert!(stdout.contains("Source removed."));

    let (_, _, success) = run_reel(&config_path, &["sources", "remove", "1"]);
    assert!(!success);
}

#[test]
fn test_sync_without_api_key_reports_warning() {
    let (_tmp, config_path) = setup_test_env(None);
    run_reel(&config_path, &["init"]);
    run_reel(&config_path, &["sources", "add", "query", "rust"]);

    let (stdout, stderr, success) = run_reel(&config_path, &["sync"]);
    assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Source: rust"));
    assert!(stdout.contains("Synced videos: 0"));
    assert!(stdout.contains("Warnings:"));
    assert!(stdout.contains("YouTube API key missing"));
}

#[test]
fn test_keys_set() {
    let (_tmp, config_path) = setup_test_env(None);
    run_reel(&config_path, &["init"]);

    let (stdout, _, success) = run_reel(&config_path, &["keys", "set"]);
    assert!(success);
    assert!(stdout.contains("No changes were made"));

    let (stdout, _, success) = run_reel(&config_path, &["keys", "set", "--youtube", "AIza-test"]);
    assert!(success);
    assert!(stdout.contains("YouTube API key saved."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sync_end_to_end_against_stub() {
    let stub = StubYouTube::start().await;
    let (_tmp, config_path) = setup_test_env(Some((&stub.base_url, API_KEY)));

    let output = tokio::task::spawn_blocking(move || {
        run_reel(&config_path, &["init"]);
        run_reel(
            &config_path,
            &["sources", "add", "channel", "dupes", "--label", "Test Channel"],
        );
        let sync = run_reel(&config_path, &["sync", "--limit", "40"]);
        let videos = run_reel(&config_path, &["videos", "--category", "Tech & Coding"]);
        let get = run_reel(&config_path, &["get", "c3"]);
        let stats = run_reel(&config_path, &["stats"]);
        (sync, videos, get, stats)
    })
    .await
    .unwrap();

    let ((stdout, stderr, success), videos, get, stats) = output;
    assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Source: Test Channel"));
    assert!(stdout.contains(&"-".repeat(60)));
    assert!(stdout.contains("Synced videos: 3"));
    assert!(!stdout.contains("Skipped videos"));
    assert!(!stdout.contains("Warnings:"));

    // a1, b2 on page one; b2 (dup) and c3 on page two; hydrated once.
    assert_eq!(
        stub.video_batches(),
        vec![vec!["a1".to_string(), "b2".to_string(), "c3".to_string()]]
    );

    let (videos_out, _, videos_ok) = videos;
    assert!(videos_ok);
    assert!(videos_out.contains("Coding tutorial a1"));
    assert!(videos_out.contains("Coding tutorial c3"));

    let (get_out, _, get_ok) = get;
    assert!(get_ok);
    assert!(get_out.contains("youtube_id:  c3"));
    assert!(get_out.contains("PT4M13S"));

    let (stats_out, _, stats_ok) = stats;
    assert!(stats_ok);
    assert!(stats_out.contains("Videos:      3"));
}
