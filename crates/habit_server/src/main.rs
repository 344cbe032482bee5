//! Habit tracker server entry point.
//!
//! Startup order: config, logging, store connection, listener. A store that
//! cannot be opened aborts startup.

use anyhow::{Context, Result};
use clap::Parser;
use habit_core::{init_logging, HabitStore};
use habit_server::{serve, ServerConfig};
use log::error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    let log_dir = config
        .resolved_log_dir()
        .context("failed to resolve log directory")?;
    init_logging(config.log_level(), &log_dir).context("failed to start logging")?;

    let store = Arc::new(HabitStore::file(&config.db_path));
    if let Err(err) = store.connect() {
        error!(
            "event=store_connect module=db status=error target={} error={}",
            store.target(),
            err
        );
        return Err(err).context("failed to connect habit store");
    }

    serve(&config, store).await
}
