use std::sync::Arc;

use medset::api::{start_server, ApiContext};
use medset::config::{self, ServerConfig};
use medset::identity::TokenRegistry;
use medset::schedule::ScheduleStore;

#[tokio::main]
async fn main() {
    medset::init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let server_config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let store = match ScheduleStore::open(&server_config.database_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(path = %server_config.database_path.display(), "Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    let registry = match TokenRegistry::from_spec(&server_config.api_tokens) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Invalid {}: {e}", config::ENV_API_TOKENS);
            std::process::exit(2);
        }
    };
    if registry.is_empty() {
        tracing::warn!(
            "No API tokens configured ({} is empty); every medication request will be rejected",
            config::ENV_API_TOKENS
        );
    }

    let ctx = ApiContext::new(store, Arc::new(registry));

    let server = match start_server(ctx, server_config.bind_addr).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %server.addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }

    server.stop().await;
}
