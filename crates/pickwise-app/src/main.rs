// Pickwise entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Load the player catalog
// 4. Create and start the DraftSession
// 5. Wire session observers into the outbound broadcast channel
// 6. Spawn WebSocket server task
// 7. Run the app loop until Ctrl+C
// 8. Cleanup on exit

use std::sync::Arc;

use pickwise_app::app;
use pickwise_app::ws_server;
use pickwise_core::catalog;
use pickwise_core::config;
use pickwise_core::draft::session::DraftSession;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Pickwise starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, {} rounds, {:?} order",
        config.league.name, config.league.num_teams, config.league.rounds, config.league.draft_order
    );

    // 3. Load the player catalog
    let players_path = config.players_path();
    let players = catalog::load_players(&players_path)
        .with_context(|| format!("failed to load players from {}", players_path.display()))?;

    // 4. Create and start the session
    let session = Arc::new(DraftSession::with_notify_count(config.recommendation_count));
    session
        .start(config.league.clone(), config.teams.clone(), players)
        .context("failed to start draft session")?;

    // 5. Session events go to every viewer
    let (outbound, _) = broadcast::channel(app::OUTBOUND_CAPACITY);
    app::forward_session_events(&session, &outbound);

    // 6. Spawn WebSocket server task
    let (ws_tx, ws_rx) = mpsc::channel(256);
    let ws_port = config.ws_port;
    let ws_outbound = outbound.clone();
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_server::run(ws_port, ws_tx, ws_outbound).await {
            error!("WebSocket server error: {}", e);
        }
    });

    // 7. Run the app loop until Ctrl+C
    info!("Application ready. WebSocket server listening on 127.0.0.1:{}", ws_port);
    let state = app::AppState::new(session, outbound, config.recommendation_count);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };
    if let Err(e) = app::run(ws_rx, shutdown, state).await {
        error!("Application loop error: {}", e);
    }

    // 8. Cleanup: the server loops forever
    ws_handle.abort();

    info!("Pickwise shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to `logs/pickwise.log` under the base directory.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = config::base_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("pickwise.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pickwise=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
