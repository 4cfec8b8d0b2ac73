use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipshare_core::{
    load_config, validate_config, HttpDispatcher, JobDispatcher, SqliteTicketStore,
    StatusUpdateIngress, TicketService, TicketStore,
};

use clipshare_server::api::create_router;
use clipshare_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("clipshare {} starting", VERSION);

    // Determine config path
    let config_path = std::env::var("CLIPSHARE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Job intake: {}", config.dispatch.url);

    // Log a config hash so deployments are comparable in the logs
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Config hash: {}", &config_hash[..16]);

    // Create SQLite ticket store
    let ticket_store: Arc<dyn TicketStore> = Arc::new(
        SqliteTicketStore::new(&config.database.path).context("Failed to create ticket store")?,
    );
    info!("Ticket store initialized");

    // Create the job dispatcher for the worker intake
    let dispatcher: Arc<dyn JobDispatcher> =
        Arc::new(HttpDispatcher::new(config.dispatch.clone()));

    // Create the lifecycle service
    let service = Arc::new(
        TicketService::new(Arc::clone(&ticket_store), dispatcher)
            .with_max_save_attempts(config.service.max_save_attempts),
    );

    // Wire the status-update ingress; the HTTP intake feeds this channel
    let (status_tx, status_rx) = mpsc::channel(config.ingress.buffer);
    let ingress_handle = tokio::spawn(StatusUpdateIngress::new(Arc::clone(&service), status_rx).run());
    info!("Status update ingress started");

    // Create app state
    let app_state = Arc::new(AppState::new(
        config.clone(),
        service,
        ticket_store,
        status_tx,
    ));

    // Create router
    let app = create_router(Arc::clone(&app_state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    // Drop every holder of the status sender so the ingress channel closes,
    // then wait for it to drain whatever is still queued.
    drop(app_state);
    let _ = ingress_handle.await;
    info!("Status update ingress stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
