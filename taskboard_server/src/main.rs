use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use taskboard_server::{ServerConfig, open_store, serve, spawn_change_logger};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    let db = open_store(&config)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    spawn_change_logger(db.change_rx());

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    log::info!("Serving task board API on http://{}/graphql", config.listen);

    serve(listener, Arc::new(db), config.include_error_details).await?;
    Ok(())
}
