mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use cli::Cli;
use flowchat::app::{AppConfig, AppState};
use flowchat::logging::{self, LOG_FILE_NAME};
use flowchat::logs::render_markdown;
use flowchat::platform::AppPaths;
use flowchat::tui;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = AppPaths::new()?;
    paths.ensure_dirs_exist()?;

    let log_file = paths.logs_dir().join(LOG_FILE_NAME);
    logging::init(&log_file, cli.debug)?;
    info!("Starting FlowChat {}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(init_app_state(&cli, &paths).await?);
    info!("Application state initialized successfully");

    let result = tui::run(Arc::clone(&state)).await;
    if let Err(e) = &result {
        error!("Terminal UI failed: {}", e);
    }

    if let Some(path) = &cli.dump_logs {
        dump_logs(&state, path).await?;
        println!("Session log written to {}", path.display());
    }

    result.context("Terminal UI failed")
}

async fn init_app_state(cli: &Cli, paths: &AppPaths) -> Result<AppState> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path).await,
        None => AppConfig::load(paths).await,
    }
    .context("Failed to load configuration")?;

    if let Some(endpoint) = &cli.endpoint {
        info!("Using endpoint from command line: {}", endpoint);
        config.endpoint.url = endpoint.clone();
        config.validate().context("Invalid --endpoint")?;
    }

    AppState::new(config).context("Failed to initialize application state")
}

async fn dump_logs(state: &AppState, path: &Path) -> Result<()> {
    let markdown = render_markdown(&state.logs().entries());
    tokio::fs::write(path, markdown)
        .await
        .with_context(|| format!("Failed to write logs to {}", path.display()))
}
