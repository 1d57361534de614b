//! Itemport Server - Main entry point

use anyhow::Result;
use itemport_common::logging::{init_logging, LogConfig};
use tracing::info;

use itemport_server::{api, config::Config, db, features::FeatureState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Defaults for the server; environment variables take precedence
    let log_config = LogConfig::builder()
        .log_file_prefix("itemport-server")
        .filter_directives("itemport_server=debug,itemport_ingest=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting itemport server");

    let config = Config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        store = ?config.store,
        policy = %config.import.conflict_policy,
        "Configuration loaded"
    );

    let store = db::connect_item_store(&config).await?;
    let state = FeatureState::new(store, &config.import);

    api::serve(config, state).await
}
