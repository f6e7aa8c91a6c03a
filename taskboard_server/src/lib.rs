//! HTTP gateway for the task board.
//!
//! [`gateway::Gateway`] dispatches named operations to a
//! [`TaskBoardDb`](taskboard::TaskBoardDb), [`routes::router`] exposes it over
//! axum, and [`client::HttpBoardApi`] lets a [`Board`](taskboard::board::Board)
//! drive a remote server.

pub mod client;
pub mod config;
pub mod gateway;
pub mod routes;

use std::sync::Arc;

use taskboard::{ChangeNotification, TaskBoardDb, TaskBoardDbBuilder};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

pub use client::HttpBoardApi;
pub use config::ServerConfig;
pub use gateway::{Gateway, GraphRequest, GraphResponse};

/// Open the store described by `config`.
pub async fn open_store(config: &ServerConfig) -> Result<TaskBoardDb, taskboard::TaskBoardError> {
    let db = TaskBoardDbBuilder::new(&config.database_url)
        .with_page_limits(config.default_page_size, config.max_page_size)
        .build()
        .await?;
    Ok(db)
}

/// Log every committed write until the store goes away.
pub fn spawn_change_logger(mut rx: broadcast::Receiver<ChangeNotification>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(change) => log::info!(
                    "{} {:?} {}",
                    change.table,
                    change.kind,
                    change.primary_key
                ),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("Change logger lagged, skipped {n} notifications");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Serve the gateway on an already bound listener until the server stops.
pub async fn serve(
    listener: TcpListener,
    db: Arc<TaskBoardDb>,
    include_error_details: bool,
) -> std::io::Result<()> {
    let gateway = Gateway::new(db).with_error_details(include_error_details);
    axum::serve(listener, routes::router(gateway)).await
}
