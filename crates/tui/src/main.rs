mod app;
mod config;
mod error;
mod ui;

use std::{fs::OpenOptions, sync::Arc};

use tracing_subscriber::EnvFilter;

use crate::error::{AppError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_tracing(&config)?;

    let mut app = app::App::new(config)?;
    app.run().await?;
    Ok(())
}

/// Logs go to a file, the terminal belongs to the UI.
fn init_tracing(config: &config::AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    let filter = EnvFilter::try_new(format!(
        "email_engine_tui={level},client={level}",
        level = config.log_level
    ))
    .map_err(|err| AppError::Logging(err.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .try_init()
        .map_err(|err| AppError::Logging(err.to_string()))?;

    tracing::info!(base_url = %config.base_url, "email engine tui starting");
    Ok(())
}
