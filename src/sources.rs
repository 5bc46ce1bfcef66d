use anyhow::Result;

use crate::admin::{self, AddSourceForm, AdminActions};
use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::db;
use crate::stats::format_last_sync;

pub async fn list_sources(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let sources = CatalogStore::new(pool.clone()).all_sources().await?;
    pool.close().await;

    if sources.is_empty() {
        println!("No sources configured yet. Add one with `reel sources add`.");
        return Ok(());
    }

    println!(
        "{:<4} {:<8} {:<28} {:<28} {:<16} {:<20} LAST SYNC",
        "ID", "TYPE", "LABEL", "IDENTIFIER", "AI TOPIC", "COLLECTION"
    );
    for s in &sources {
        println!(
            "{:<4} {:<8} {:<28} {:<28} {:<16} {:<20} {}",
            s.id,
            s.kind,
            s.label,
            s.identifier,
            s.ai_topic.as_deref().unwrap_or("-"),
            s.collection.as_deref().unwrap_or("-"),
            format_last_sync(s.last_fetched_at.as_deref())
        );
    }
    Ok(())
}

pub async fn add_source(config: &Config, form: AddSourceForm) -> Result<()> {
    let pool = db::connect(config).await?;
    let outcome = AdminActions::new(&pool, config).add_source(form).await?;
    pool.close().await;
    admin::print_outcome(&outcome)
}

pub async fn remove_source(config: &Config, id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let outcome = AdminActions::new(&pool, config).delete_source(id).await?;
    pool.close().await;
    admin::print_outcome(&outcome)
}
