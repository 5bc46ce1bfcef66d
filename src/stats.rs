//! Catalog statistics.
//!
//! Video totals, enrichment coverage, per-category counts, and per-source
//! freshness. Printed by `reel stats` and served as JSON on `/api/stats`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::db;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub videos: i64,
    /// Videos with a stored AI (or heuristic) summary.
    pub enriched: i64,
    pub orphaned: i64,
    pub collections: i64,
    pub categories: Vec<CategoryCount>,
    pub sources: Vec<SourceStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub videos: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStats {
    pub id: i64,
    pub label: String,
    pub kind: String,
    pub videos: i64,
    pub last_fetched_at: Option<String>,
}

pub async fn collect_stats(pool: &SqlitePool) -> Result<CatalogStats> {
    let videos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
        .fetch_one(pool)
        .await?;
    let enriched: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM videos WHERE ai_summary IS NOT NULL AND ai_summary != ''",
    )
    .fetch_one(pool)
    .await?;
    let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE source_id IS NULL")
        .fetch_one(pool)
        .await?;
    let collections: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collections")
        .fetch_one(pool)
        .await?;

    let categories = CatalogStore::new(pool.clone())
        .categories()
        .await?
        .into_iter()
        .map(|(name, videos)| CategoryCount { name, videos })
        .collect();

    let source_rows = sqlx::query(
        r#"
        SELECT s.id, s.label, s.type, s.last_fetched_at, COUNT(v.id) AS video_count
        FROM video_sources s
        LEFT JOIN videos v ON v.source_id = s.id
        GROUP BY s.id
        ORDER BY s.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let sources = source_rows
        .iter()
        .map(|row| SourceStats {
            id: row.get("id"),
            label: row.get("label"),
            kind: row.get("type"),
            videos: row.get("video_count"),
            last_fetched_at: row.get("last_fetched_at"),
        })
        .collect();

    Ok(CatalogStats {
        videos,
        enriched,
        orphaned,
        collections,
        categories,
        sources,
    })
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let stats = collect_stats(&pool).await?;
    pool.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Reelhouse — Catalog Stats");
    println!("=========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Videos:      {}", stats.videos);
    println!(
        "  Enriched:    {} / {} ({}%)",
        stats.enriched,
        stats.videos,
        if stats.videos > 0 {
            (stats.enriched * 100) / stats.videos
        } else {
            0
        }
    );
    println!("  Orphaned:    {}", stats.orphaned);
    println!("  Collections: {}", stats.collections);

    if !stats.categories.is_empty() {
        println!();
        println!("  By category:");
        for c in &stats.categories {
            println!("  {:<32} {:>6}", c.name, c.videos);
        }
    }

    if !stats.sources.is_empty() {
        println!();
        println!("  By source:");
        println!(
            "  {:<4} {:<28} {:<8} {:>6}   {}",
            "ID", "SOURCE", "TYPE", "VIDEOS", "LAST SYNC"
        );
        println!("  {}", "-".repeat(68));
        for s in &stats.sources {
            println!(
                "  {:<4} {:<28} {:<8} {:>6}   {}",
                s.id,
                s.label,
                s.kind,
                s.videos,
                format_last_sync(s.last_fetched_at.as_deref())
            );
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// "never", a relative time within the last 30 days, or a date.
pub fn format_last_sync(stamp: Option<&str>) -> String {
    let Some(stamp) = stamp else {
        return "never".to_string();
    };
    match DateTime::parse_from_rfc3339(stamp) {
        Ok(dt) => format_relative(dt.with_timezone(&Utc), Utc::now()),
        Err(_) => stamp.to_string(),
    }
}

fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = (now - then).num_seconds();

    if delta < 0 {
        return then.format("%Y-%m-%d %H:%M").to_string();
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        then.format("%Y-%m-%d %H:%M").to_string()
    }
}
