//! HTTP surface for the habit tracker.

pub mod api;
pub mod config;
mod error;

pub use api::router;
pub use config::ServerConfig;
pub use error::ApiError;

use anyhow::Result;
use habit_core::HabitStore;
use log::info;
use std::sync::Arc;

/// Serves the API on `config.addr()` until Ctrl-C.
///
/// The store must already be connected; handlers fail with 500 otherwise.
pub async fn serve(config: &ServerConfig, store: Arc<HabitStore>) -> Result<()> {
    let addr = config.addr();
    let app = router(store);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("event=server_start module=http status=ok addr=http://{addr}");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("event=server_shutdown module=http status=start");
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("event=server_shutdown module=http status=ok");
    Ok(())
}
