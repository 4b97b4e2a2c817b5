//! slirc-services - Straylight IRC Services
//!
//! Links to a P10 hub as a services server and runs account, host-cloak
//! and anti-spam pseudo-clients.

mod config;
mod db;
mod error;
mod flags;
mod http;
mod metrics;
mod security;
mod services;
mod state;
mod sync;

use crate::config::Config;
use crate::db::Database;
use crate::security::HomoglyphSet;
use crate::services::ServicesContext;
use crate::sync::Supervisor;
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "services.toml".to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(true)
        .init();

    info!(
        server = %config.server.name,
        numeric = %config.server.numeric,
        hub = %config.hub.address(),
        "Starting slirc-services"
    );

    // Refuse a guessable cloak secret unless explicitly allowed.
    if config.services.host.enabled
        && crate::security::cloaking::is_default_secret(&config.services.host.cloak_secret)
    {
        if std::env::var("SLIRC_ALLOW_INSECURE_CLOAK").is_ok() {
            warn!("INSECURE: running with a weak cloak_secret (allowed via SLIRC_ALLOW_INSECURE_CLOAK)");
        } else {
            error!("Refusing to start: services.host.cloak_secret is a known default");
            error!("  Generate one with: openssl rand -hex 32");
            return Err(anyhow::anyhow!("insecure cloak_secret"));
        }
    }

    let homoglyph_path = &config.abuse.homoglyph_file;
    let homoglyphs = HomoglyphSet::load(homoglyph_path).map_err(|e| {
        error!(path = %homoglyph_path, error = %e, "Homoglyph file is required");
        e
    })?;
    info!(count = homoglyphs.len(), "Loaded homoglyphs");

    let db = Database::new(&config.database.path)
        .await
        .with_context(|| format!("failed to open database {}", config.database.path))?;

    match config.server.metrics_addr() {
        None => info!("Metrics disabled"),
        Some(addr) => {
            let server = http::MetricsServer::bind(addr)
                .await
                .with_context(|| format!("failed to bind metrics endpoint on {addr}"))?;
            metrics::init();
            tokio::spawn(server.serve());
        }
    }

    let supervisor = Supervisor::new(ServicesContext {
        config: Arc::new(config),
        db,
        homoglyphs: Arc::new(homoglyphs),
    });

    let (stop_tx, stop_rx) = watch::channel(false);
    spawn_rehash_listener(supervisor.clone(), config_path);

    let run = tokio::spawn(supervisor.clone().run(stop_rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!(link = ?supervisor.link_status(), "Shutdown requested");
    let _ = stop_tx.send(true);
    if let Err(e) = run.await {
        error!(error = %e, "Supervisor task failed");
    }
    info!("Goodbye");
    Ok(())
}

/// Reload the config file on SIGHUP and hand it to the supervisor.
#[cfg(unix)]
fn spawn_rehash_listener(supervisor: Supervisor, path: String) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "SIGHUP handler unavailable, rehash disabled");
            return;
        }
    };
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            match Config::load(&path) {
                Ok(config) => {
                    info!(path = %path, "Rehashing");
                    supervisor.rehash(Arc::new(config));
                }
                Err(e) => warn!(path = %path, error = %e, "Rehash failed, keeping current config"),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_rehash_listener(_supervisor: Supervisor, _path: String) {}
