//! # Reelhouse CLI (`reel`)
//!
//! The `reel` binary manages the video catalog: database setup, sources,
//! synchronization, browsing, API keys, and the JSON HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! reel --config ./config/reel.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `reel init` | Create the SQLite database and run schema migrations |
//! | `reel sources list` | List configured sources |
//! | `reel sources add <kind> <identifier>` | Add a channel or query source |
//! | `reel sources remove <id>` | Remove a source (its videos are kept) |
//! | `reel sync` | Fetch, enrich, and store videos for every source |
//! | `reel videos` | Browse the catalog |
//! | `reel get <youtube_id>` | Show one video |
//! | `reel keys set` | Save API keys to the settings table |
//! | `reel stats` | Catalog statistics |
//! | `reel serve` | Start the JSON HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! reel init
//! reel sources add channel UCsBjURrPoezykLs9EqgamOA --label Fireship --ai-topic "Tech Explained"
//! reel sources add query "rust programming" --label "Rust"
//! reel sync --limit 20
//! reel sync --source 2
//! reel videos --category "Tech & Coding"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use reelhouse::admin::{self, AddSourceForm, SaveKeysForm};
use reelhouse::models::VideoFilter;
use reelhouse::{config, logging, migrate, server, sources, stats, sync, videos};

/// Reelhouse — a YouTube-backed video catalog with AI enrichment.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/reel.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "reel",
    about = "Reelhouse — a YouTube-backed video catalog with AI enrichment",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/reel.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Manage video sources.
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },

    /// Fetch, enrich, and store videos.
    ///
    /// Syncs every source in id order unless `--source` is given. A failing
    /// source is reported and the next one still runs.
    Sync {
        /// Only sync the source with this id.
        #[arg(long)]
        source: Option<i64>,

        /// Maximum videos to collect per source (default: `[sync].default_limit`).
        /// Values below 1 are raised to 1.
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Browse stored videos, newest first.
    Videos {
        /// Case-insensitive substring over title, description, and channel.
        #[arg(long)]
        search: Option<String>,

        /// Exact category or source label.
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show a stored video by its YouTube id.
    Get { youtube_id: String },

    /// Manage API keys stored in the database.
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Show catalog statistics.
    Stats,

    /// Start the JSON HTTP API on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum SourcesAction {
    List,
    Add {
        /// `channel` or `query`.
        kind: String,
        /// Channel ID or search query.
        identifier: String,
        /// Display label (defaults to the identifier).
        #[arg(long, default_value = "")]
        label: String,
        /// Category hint passed to enrichment.
        #[arg(long)]
        ai_topic: Option<String>,
        /// Curated collection every synced video joins.
        #[arg(long)]
        collection: Option<String>,
    },
    Remove {
        id: i64,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// Save any of the given values; omitted ones are left unchanged.
    Set {
        #[arg(long)]
        youtube: Option<String>,
        #[arg(long)]
        openai: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[error] {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sources { action } => match action {
            SourcesAction::List => sources::list_sources(&cfg).await?,
            SourcesAction::Add {
                kind,
                identifier,
                label,
                ai_topic,
                collection,
            } => {
                let form = AddSourceForm {
                    kind,
                    identifier,
                    label,
                    ai_topic,
                    collection,
                };
                sources::add_source(&cfg, form).await?;
            }
            SourcesAction::Remove { id } => sources::remove_source(&cfg, id).await?,
        },
        Commands::Sync { source, limit } => {
            let limit = limit.map(|n| usize::try_from(n.max(1)).unwrap_or(usize::MAX));
            sync::run_sync(&cfg, source, limit).await?;
        }
        Commands::Videos {
            search,
            category,
            limit,
        } => {
            let filter = VideoFilter {
                search,
                category,
                limit,
            };
            videos::run_videos(&cfg, filter).await?;
        }
        Commands::Get { youtube_id } => videos::run_get(&cfg, &youtube_id).await?,
        Commands::Keys { action } => match action {
            KeysAction::Set {
                youtube,
                openai,
                model,
            } => {
                let form = SaveKeysForm {
                    youtube_api_key: youtube,
                    openai_api_key: openai,
                    openai_model: model,
                };
                admin::run_save_keys(&cfg, form).await?;
            }
        },
        Commands::Stats => stats::run_stats(&cfg).await?,
        Commands::Serve => server::run_server(&cfg).await?,
    }

    Ok(())
}
