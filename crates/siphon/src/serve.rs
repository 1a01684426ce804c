//! Server wiring and lifecycle
//!
//! Startup order: config → store → registry → supervisor → HTTP API.
//! Shutdown on SIGINT/SIGTERM stops every listener (awaiting loop exit)
//! before the process leaves; a startup failure exits nonzero.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use siphon_api::{build_router, AppState};
use siphon_config::ConfigStore;
use siphon_modules::ModuleRegistry;
use siphon_server::{Pipeline, ServerStats, Supervisor};
use siphon_store::LogStore;

pub async fn run(config_path: PathBuf) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "siphon starting"
    );

    // Config document: created with defaults when absent, fatal when
    // malformed.
    let config = Arc::new(
        ConfigStore::load_or_create(&config_path).context("failed to load configuration")?,
    );

    // Seed the listener table from the legacy `servers` section on a fresh
    // install, so default ports work without manual setup.
    if config.listeners().is_empty() {
        let seeded = config.snapshot().listeners_from_servers();
        if !seeded.is_empty() {
            info!(count = seeded.len(), "seeding listeners from servers config");
            config.mutate(|c| c.listeners = seeded)?;
        }
    }

    let db_path = config.snapshot().database.path;
    let store = Arc::new(
        LogStore::open(&db_path)
            .await
            .with_context(|| format!("failed to open log store at {}", db_path))?,
    );

    let registry = Arc::new(ModuleRegistry::new());
    let enabled_modules = config.enabled_modules();
    if !enabled_modules.is_empty() {
        registry.set_enabled_modules(&enabled_modules);
    }

    let stats = Arc::new(ServerStats::new());
    let pipeline = Arc::new(Pipeline::new(
        Arc::clone(&store),
        Arc::clone(&config),
        Arc::clone(&registry),
        Arc::clone(&stats),
    ));
    let supervisor = Arc::new(Supervisor::new(pipeline));

    // Start every enabled listener; individual failures are logged and do
    // not stop the process.
    supervisor.start_all(&config.listeners()).await;

    let web_port = config.snapshot().web.port;
    let state = AppState::new(
        Arc::clone(&store),
        Arc::clone(&config),
        Arc::clone(&supervisor),
        registry,
        stats,
    );
    let app = build_router(state);

    let http_listener = tokio::net::TcpListener::bind(("0.0.0.0", web_port))
        .await
        .with_context(|| format!("failed to bind web port {}", web_port))?;

    info!(port = web_port, "HTTP API listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            error!(error = %e, "HTTP server error");
        }
    });

    wait_for_shutdown().await;

    info!("shutdown signal received, stopping listeners...");
    supervisor.shutdown().await;
    server.abort();

    info!("siphon shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
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
