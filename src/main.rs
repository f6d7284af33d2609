mod models;
mod handlers;
mod routes;
mod docs;
mod config;
mod services;
mod websocket;
mod ws;

use config::Config;
use routes::create_app_routes;
use std::panic;
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use ws::{lifecycle, registry::SessionRegistry};

/// State shared by every HTTP and WebSocket handler
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.session_timeout()));
        Self {
            config: Arc::new(config),
            registry,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Load configuration first so LOG_LEVEL can shape the default filter
    let loaded = Config::load();
    let log_filter = match &loaded {
        Ok(config) => config.log_filter(),
        Err(_) => Config::default().log_filter(),
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .init();

    info!("Starting server...");

    let config = match loaded {
        Ok(config) => {
            info!("✅ Configuration loaded successfully");
            config
        }
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            warn!("Using default configuration");
            Config::default()
        }
    };
    info!(
        "Presence sessions expire after {}s, swept every {}s",
        config.session_timeout_secs, config.sweep_interval().as_secs()
    );

    let state = Arc::new(AppState::new(config));

    // Background staleness sweep
    let _sweeper = lifecycle::spawn_sweeper(state.registry.clone(), state.config.sweep_interval());

    let app_routes = create_app_routes(state.clone());

    // Start the HTTP/WebSocket server
    let address = state.config.server_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("🚀 Server running on http://{}", address);
    info!("📡 WebSocket available at ws://{}/ws", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
