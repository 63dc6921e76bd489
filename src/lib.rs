pub mod api;
pub mod config;
pub mod db;
pub mod identity; // Bearer token → owner resolution
pub mod models;
pub mod schedule; // Owner-scoped medication store

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise falls back to `config::default_log_filter()`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
