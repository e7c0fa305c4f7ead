use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use india_radio_tui::{app, config, player, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = config::Config::log_path();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    // The terminal belongs to the UI, so logs go to a file. RUST_LOG wins.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("india radio log: {}", log_path.display());
    tracing::info!("india radio starting");

    let config = config::Config::load();

    let client = Client::builder()
        .user_agent(config.directory.user_agent.as_str())
        .timeout(Duration::from_secs(config.directory.timeout_secs))
        .build()?;

    let options = player::SessionOptions {
        stream: config.playback.stream,
        volume: config.playback.volume,
    };
    let controller =
        player::PlaybackController::new(player::RodioEngine::new(), options, app::initial_group());
    let state = app::AppState::new(controller);

    if let Err(e) = ui::run_ui(client, &config, state).await {
        tracing::error!("ui error: {:#}", e);
        eprintln!("UI error: {:?}", e);
        return Err(e);
    }

    println!("Thanks for listening!");
    Ok(())
}
