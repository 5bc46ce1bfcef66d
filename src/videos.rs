//! Catalog browsing commands: `reel videos` and `reel get`.

use anyhow::{bail, Result};

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::db;
use crate::models::{Video, VideoFilter};

pub async fn run_videos(config: &Config, filter: VideoFilter) -> Result<()> {
    let pool = db::connect(config).await?;
    let videos = CatalogStore::new(pool.clone()).fetch_videos(&filter).await?;
    pool.close().await;

    if videos.is_empty() {
        println!("No videos found.");
        return Ok(());
    }

    for (i, v) in videos.iter().enumerate() {
        println!(
            "{}. [{}] {}",
            i + 1,
            v.ai_category.as_deref().unwrap_or("-"),
            v.title
        );
        println!(
            "    id: {}  channel: {}  published: {}",
            v.youtube_id,
            v.channel_title.as_deref().unwrap_or("-"),
            v.published_at.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}

pub async fn run_get(config: &Config, youtube_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let video = CatalogStore::new(pool.clone()).find_video(youtube_id).await?;
    pool.close().await;

    let Some(video) = video else {
        bail!("video not found: {}", youtube_id);
    };
    print_video(&video);
    Ok(())
}

fn print_video(v: &Video) {
    println!("--- Video ---");
    println!("youtube_id:  {}", v.youtube_id);
    println!("title:       {}", v.title);
    println!("channel:     {}", v.channel_title.as_deref().unwrap_or("-"));
    println!("published:   {}", v.published_at.as_deref().unwrap_or("unknown"));
    println!("duration:    {}", v.duration.as_deref().unwrap_or("-"));
    println!("thumbnail:   {}", v.thumbnail_url.as_deref().unwrap_or("-"));
    println!("category:    {}", v.ai_category.as_deref().unwrap_or("-"));
    if !v.ai_topics.is_empty() {
        println!("topics:      {}", v.ai_topics.join(", "));
    }
    if !v.collections.is_empty() {
        println!("collections: {}", v.collections.join(", "));
    }
    if !v.tags.is_empty() {
        println!("tags:        {}", v.tags.join(", "));
    }
    println!("updated:     {}", v.updated_at);
    println!();
    if let Some(summary) = &v.ai_summary {
        println!("--- Summary ---");
        println!("{}", summary);
        println!();
    }
    println!("--- Description ---");
    println!("{}", v.description);
}
