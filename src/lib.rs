//! # Reelhouse
//!
//! A YouTube-backed video catalog with AI enrichment.
//!
//! Reelhouse discovers videos from configured sources (a channel or a keyword
//! query), hydrates their metadata from the YouTube Data API, tags each one
//! with a category, summary, and topics (via an OpenAI-compatible model or
//! local heuristics), and stores the result in SQLite for browsing from the
//! CLI or a JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────┐   ┌──────────┐
//! │   Sources   │──▶│  YouTube API │──▶│  Enrich   │──▶│  SQLite  │
//! │ channel/qry │   │ search+hydr. │   │ AI / heur │   │ catalog  │
//! └─────────────┘   └──────────────┘   └───────────┘   └────┬─────┘
//!                                                           │
//!                                       ┌───────────────────┤
//!                                       ▼                   ▼
//!                                  ┌──────────┐       ┌──────────┐
//!                                  │   CLI    │       │   HTTP   │
//!                                  │  (reel)  │       │  (JSON)  │
//!                                  └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! reel init
//! reel keys set --youtube AIza...
//! reel sources add query "rust programming" --label Rust
//! reel sync --limit 20
//! reel videos --search borrow
//! reel serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`settings`] | Stored API keys and credential resolution |
//! | [`youtube`] | YouTube Data API client |
//! | [`enrich`] | AI enrichment with heuristic fallback |
//! | [`heuristics`] | Local category, topic, and summary rules |
//! | [`catalog`] | Sources, videos, and collections in SQLite |
//! | [`sync`] | The synchronization pipeline |
//! | [`admin`] | Admin actions shared by CLI and HTTP |
//! | [`server`] | JSON HTTP API |
//! | [`stats`] | Catalog statistics |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod admin;
pub mod catalog;
pub mod config;
pub mod db;
pub mod enrich;
pub mod heuristics;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod server;
pub mod settings;
pub mod sources;
pub mod stats;
pub mod sync;
pub mod videos;
pub mod youtube;
