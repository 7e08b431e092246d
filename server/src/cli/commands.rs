// server/src/cli/commands.rs

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use lib::{open_storage, AppConfig, SystemClock};
use rest_api::AppState;

use crate::seed;

pub async fn serve(mut config: AppConfig, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    let storage = open_storage(&config.storage).context("Failed to open storage")?;
    let state = AppState::new(storage, &config, Arc::new(SystemClock))?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal.");
    };

    rest_api::serve(&config, state, shutdown).await
}

pub async fn seed(config: AppConfig, file: &Path) -> Result<()> {
    let seed_file = seed::load(file)?;
    let storage = open_storage(&config.storage).context("Failed to open storage")?;
    let state = AppState::new(storage, &config, Arc::new(SystemClock))?;
    let report = seed::apply(&state, seed_file).await?;
    info!(
        "Seeded {} hospital(s), {} doctor(s) and {} prescription(s), skipped {} existing record(s)",
        report.hospitals, report.doctors, report.prescriptions, report.skipped
    );
    Ok(())
}

pub fn show_config(config: &AppConfig) -> Result<()> {
    println!("{}", render_config(config)?);
    Ok(())
}

fn render_config(config: &AppConfig) -> Result<String> {
    let mut shown = config.clone();
    shown.auth.jwt_secret = "<redacted>".to_string();
    Ok(serde_json::to_string_pretty(&shown)?)
}
