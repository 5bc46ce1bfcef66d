//! Video catalog store.
//!
//! Owns every persisted row: sources, videos, collections, and the
//! `collection_videos` join table. The store wraps a [`SqlitePool`] that the
//! caller constructs (see [`db::connect`](crate::db::connect)) and passes in.
//!
//! # Invariants
//!
//! - `videos.youtube_id` is unique; [`CatalogStore::upsert_video`] updates every
//!   mutable field on conflict and keeps the original `created_at`.
//! - The video upsert and its collection memberships are written in one
//!   transaction; a failure rolls both back.
//! - Collections are keyed by [`slugify`]d name; names that collide on a slug
//!   share one row.
//! - Deleting a source detaches its videos (`source_id = NULL`).
//! - JSON columns are decoded defensively: missing or malformed values read
//!   back as empty collections.

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashSet;

use crate::models::{
    CategoryGroup, Collection, NewSource, Source, Thumbnails, Video, VideoFilter, VideoPayload,
};

pub const DEFAULT_VIDEO_LIMIT: i64 = 40;
const MAX_VIDEO_LIMIT: i64 = 500;

/// Homepage group name for videos without a category.
pub const FRESH_PICKS: &str = "Fresh Picks";

const VIDEO_COLUMNS: &str = r#"
    v.id, v.youtube_id, v.source_id, v.title, v.description, v.channel_title,
    v.published_at, v.duration, v.thumbnail_url, v.thumbnails, v.tags,
    v.ai_category, v.ai_summary, v.ai_topics, v.created_at, v.updated_at,
    (SELECT json_group_array(name) FROM (
        SELECT c.name AS name
        FROM collection_videos cv
        JOIN collections c ON c.id = cv.collection_id
        WHERE cv.video_id = v.id
        ORDER BY cv.position
    )) AS collections_json
"#;

const SOURCE_COLUMNS: &str =
    "id, type, identifier, label, ai_topic, collection, last_fetched_at, created_at";

/// Current UTC time as an RFC 3339 string (`2024-05-01T12:00:00Z`).
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Derive a URL slug: lowercase, runs of non-alphanumerics become a single
/// `-`, and leading/trailing `-` are trimmed. Idempotent.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[derive(Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ============ Sources ============

    pub async fn all_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM video_sources ORDER BY id ASC",
            SOURCE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(source_from_row).collect()
    }

    pub async fn find_source(&self, id: i64) -> Result<Option<Source>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM video_sources WHERE id = ?",
            SOURCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(source_from_row).transpose()
    }

    /// Insert a source. Fails when `(kind, identifier)` already exists.
    pub async fn create_source(&self, source: &NewSource) -> Result<Source> {
        let result = sqlx::query(
            r#"
            INSERT INTO video_sources (type, identifier, label, ai_topic, collection, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(source.kind.as_str())
        .bind(&source.identifier)
        .bind(&source.label)
        .bind(&source.ai_topic)
        .bind(&source.collection)
        .bind(now_iso())
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(anyhow!(
                    "a {} source for '{}' already exists",
                    source.kind,
                    source.identifier
                ));
            }
            Err(e) => return Err(e.into()),
        };

        self.find_source(id)
            .await?
            .ok_or_else(|| anyhow!("source {} vanished after insert", id))
    }

    /// Delete a source, orphaning (never deleting) its videos.
    ///
    /// Returns `false` when no source had that id.
    pub async fn delete_source(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE videos SET source_id = NULL WHERE source_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM video_sources WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    /// Stamp the source's freshness timestamp with the current time.
    pub async fn mark_fetched(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE video_sources SET last_fetched_at = ? WHERE id = ?")
            .bind(now_iso())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ============ Videos ============

    /// Insert or update a video by `youtube_id`.
    ///
    /// When `collections` is non-empty, the video's memberships are replaced
    /// by exactly those collections (in order) inside the same transaction.
    pub async fn upsert_video(&self, payload: &VideoPayload, collections: &[String]) -> Result<Video> {
        if payload.youtube_id.trim().is_empty() {
            anyhow::bail!("video payload has an empty youtube_id");
        }

        let now = now_iso();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO videos (
                youtube_id, source_id, title, description, channel_title, published_at,
                duration, thumbnail_url, thumbnails, tags, ai_category, ai_summary, ai_topics,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(youtube_id) DO UPDATE SET
                source_id = excluded.source_id,
                title = excluded.title,
                description = excluded.description,
                channel_title = excluded.channel_title,
                published_at = excluded.published_at,
                duration = excluded.duration,
                thumbnail_url = excluded.thumbnail_url,
                thumbnails = excluded.thumbnails,
                tags = excluded.tags,
                ai_category = excluded.ai_category,
                ai_summary = excluded.ai_summary,
                ai_topics = excluded.ai_topics,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&payload.youtube_id)
        .bind(payload.source_id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.channel_title)
        .bind(&payload.published_at)
        .bind(&payload.duration)
        .bind(&payload.thumbnail_url)
        .bind(serde_json::to_string(&payload.thumbnails)?)
        .bind(serde_json::to_string(&payload.tags)?)
        .bind(&payload.ai_category)
        .bind(&payload.ai_summary)
        .bind(serde_json::to_string(&payload.ai_topics)?)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to upsert video {}", payload.youtube_id))?;

        let video_id: i64 = sqlx::query_scalar("SELECT id FROM videos WHERE youtube_id = ?")
            .bind(&payload.youtube_id)
            .fetch_one(&mut *tx)
            .await?;

        if !collections.is_empty() {
            replace_collections(&mut *tx, video_id, collections, &now).await?;
        }

        tx.commit().await?;

        self.find_video(&payload.youtube_id)
            .await?
            .ok_or_else(|| anyhow!("video {} vanished after upsert", payload.youtube_id))
    }

    pub async fn find_video(&self, youtube_id: &str) -> Result<Option<Video>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM videos v WHERE v.youtube_id = ?",
            VIDEO_COLUMNS
        ))
        .bind(youtube_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(video_from_row))
    }

    /// Browse the catalog, newest first (unknown publish dates last).
    ///
    /// `search` is a SQLite `LIKE` substring match, which folds case for
    /// ASCII letters only: `rust` finds `Rust`, but `ü` does not find `Ü`.
    pub async fn fetch_videos(&self, filter: &VideoFilter) -> Result<Vec<Video>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_VIDEO_LIMIT)
            .clamp(1, MAX_VIDEO_LIMIT);

        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM videos v
            LEFT JOIN video_sources s ON s.id = v.source_id
            WHERE (?1 IS NULL
                   OR v.title LIKE ?1 ESCAPE '\'
                   OR v.description LIKE ?1 ESCAPE '\'
                   OR v.channel_title LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR v.ai_category = ?2 OR s.label = ?2)
            ORDER BY v.published_at IS NULL, v.published_at DESC, v.created_at DESC, v.id DESC
            LIMIT ?3
            "#,
            VIDEO_COLUMNS
        ))
        .bind(search)
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(video_from_row).collect())
    }

    pub async fn recent_videos(&self, limit: i64) -> Result<Vec<Video>> {
        self.fetch_videos(&VideoFilter {
            limit: Some(limit),
            ..Default::default()
        })
        .await
    }

    pub async fn count_videos(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Category names with their video counts, largest first.
    pub async fn categories(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT ai_category AS name, COUNT(*) AS total
            FROM videos
            WHERE ai_category IS NOT NULL AND ai_category != ''
            GROUP BY ai_category
            ORDER BY total DESC, name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| (row.get("name"), row.get("total")))
            .collect())
    }

    /// Every video grouped into homepage rows by category slug.
    ///
    /// Groups appear in the order their newest video appears; the hero of a
    /// group is its newest video.
    pub async fn homepage(&self) -> Result<Vec<CategoryGroup>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM videos v
            ORDER BY v.published_at IS NULL, v.published_at DESC, v.created_at DESC, v.id DESC
            "#,
            VIDEO_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut groups: Vec<CategoryGroup> = Vec::new();
        for video in rows.iter().map(video_from_row) {
            let name = video
                .ai_category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(FRESH_PICKS)
                .to_string();
            let slug = slugify(&name);

            match groups.iter_mut().find(|g| g.slug == slug) {
                Some(group) => group.videos.push(video),
                None => groups.push(CategoryGroup {
                    name,
                    slug,
                    hero: Some(video.clone()),
                    videos: vec![video],
                }),
            }
        }
        Ok(groups)
    }

    // ============ Collections ============

    pub async fn collections(&self) -> Result<Vec<Collection>> {
        let rows = sqlx::query("SELECT id, name, slug, description FROM collections ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(collection_from_row).collect())
    }

    pub async fn find_collection(&self, slug: &str) -> Result<Option<Collection>> {
        let row =
            sqlx::query("SELECT id, name, slug, description FROM collections WHERE slug = ?")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.as_ref().map(collection_from_row))
    }

    pub async fn collection_videos(&self, slug: &str) -> Result<Vec<Video>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM videos v
            JOIN collection_videos cv ON cv.video_id = v.id
            JOIN collections c ON c.id = cv.collection_id
            WHERE c.slug = ?
            ORDER BY v.published_at IS NULL, v.published_at DESC, v.created_at DESC
            "#,
            VIDEO_COLUMNS
        ))
        .bind(slug)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(video_from_row).collect())
    }
}

/// Delete the video's join rows and reinsert one per distinct slug, keeping
/// the caller's order as `position`.
async fn replace_collections(
    conn: &mut SqliteConnection,
    video_id: i64,
    names: &[String],
    now: &str,
) -> Result<()> {
    sqlx::query("DELETE FROM collection_videos WHERE video_id = ?")
        .bind(video_id)
        .execute(&mut *conn)
        .await?;

    let mut seen = HashSet::new();
    let mut position = 0i64;
    for name in names {
        let name = name.trim();
        let slug = slugify(name);
        if slug.is_empty() || !seen.insert(slug.clone()) {
            continue;
        }

        let collection_id = first_or_create_collection(&mut *conn, name, &slug, now).await?;
        sqlx::query(
            "INSERT INTO collection_videos (collection_id, video_id, position) VALUES (?, ?, ?)",
        )
        .bind(collection_id)
        .bind(video_id)
        .bind(position)
        .execute(&mut *conn)
        .await?;
        position += 1;
    }

    Ok(())
}

async fn first_or_create_collection(
    conn: &mut SqliteConnection,
    name: &str,
    slug: &str,
    now: &str,
) -> Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO collections (name, slug, description, created_at, updated_at)
        VALUES (?, ?, NULL, ?, ?)
        ON CONFLICT(slug) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(slug)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM collections WHERE slug = ?")
        .bind(slug)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn source_from_row(row: &SqliteRow) -> Result<Source> {
    let kind: String = row.get("type");
    Ok(Source {
        id: row.get("id"),
        kind: kind.parse()?,
        identifier: row.get("identifier"),
        label: row.get("label"),
        ai_topic: row.get("ai_topic"),
        collection: row.get("collection"),
        last_fetched_at: row.get("last_fetched_at"),
        created_at: row.get("created_at"),
    })
}

fn collection_from_row(row: &SqliteRow) -> Collection {
    Collection {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
    }
}

fn video_from_row(row: &SqliteRow) -> Video {
    Video {
        id: row.get("id"),
        youtube_id: row.get("youtube_id"),
        source_id: row.get("source_id"),
        title: row.get("title"),
        description: row.get("description"),
        channel_title: row.get("channel_title"),
        published_at: row.get("published_at"),
        duration: row.get("duration"),
        thumbnail_url: row.get("thumbnail_url"),
        thumbnails: decode_thumbnails(row.get("thumbnails")),
        tags: decode_string_list(row.get("tags")),
        ai_category: row.get("ai_category"),
        ai_summary: row.get("ai_summary"),
        ai_topics: decode_string_list(row.get("ai_topics")),
        collections: decode_string_list(row.get("collections_json")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Decode a JSON array column, keeping only string (and numeric) entries.
fn decode_string_list(raw: Option<String>) -> Vec<String> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
        Ok(values) => values
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn decode_thumbnails(raw: Option<String>) -> Thumbnails {
    raw.and_then(|r| serde_json::from_str::<Thumbnails>(&r).ok())
        .unwrap_or_default()
}
