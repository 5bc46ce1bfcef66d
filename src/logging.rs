//! Tracing subscriber setup.
//!
//! Logs go to stderr so `reel` output on stdout stays parseable. The filter
//! comes from `RUST_LOG`, defaulting to `reelhouse=info`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "reelhouse=info,warn";

pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second init (tests, embedding) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
