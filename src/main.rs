mod agent;
mod error;
mod routes;
mod search;
mod settings;
mod state;

use anyhow::Result;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use settings::{ServerSettings, Settings};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env file: {e}");
        }
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("agent_relay=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Settings failures leave the service running in degraded mode.
    let settings = Settings::from_env();
    let server = match &settings {
        Ok(settings) => settings.server.clone(),
        Err(_) => {
            warn!("Using default server settings");
            ServerSettings::default()
        }
    };

    let app_state = AppState::initialize(settings);
    info!(
        env = %server.env,
        settings = app_state.is_settings_loaded(),
        agent = app_state.is_agent_ready(),
        search = app_state.search.is_some(),
        "Initialized application state"
    );

    let app = routes::build_app(app_state);

    let addr = server.socket_addr();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, outbound clients released");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
