// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Gateway binary entrypoint.

use std::sync::Arc;

use clap::Parser;
use gavel_core::{AsyncControlPlane, LedgerStorage};
use gavel_sandbox::{BlastBox, SandboxRuntime, TokioSandbox};
use gavel_storage::{FileStorage, SqlStorage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gavel_server::config::GatewayConfig;
use gavel_server::identities::IdentityAllowList;
use gavel_server::router::create_router;
use gavel_server::state::AppState;

/// gavel gateway
#[derive(Parser)]
#[command(name = "gavel-server")]
#[command(about = "HTTP gateway for the gavel governance control plane", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "GAVEL_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "GAVEL_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Ledger connection string or file path
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "GAVEL_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut config = GatewayConfig::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))?;

    if let Some(listen_addr) = cli.listen_addr {
        config.listen_addr = listen_addr;
    }
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }

    println!(
        r#"
   __ _  __ ___   _____| |
  / _` |/ _` \ \ / / _ \ |
 | (_| | (_| |\ V /  __/ |
  \__, |\__,_| \_/ \___|_|
  |___/
  gavel governance gateway {}
  listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.listen_addr
    );

    let storage: Box<dyn LedgerStorage> = if config.database_url.contains("://") {
        Box::new(
            SqlStorage::connect(&config.database_url)
                .await
                .map_err(|e| anyhow::anyhow!("failed to connect to {}: {e}", config.database_url))?,
        )
    } else {
        Box::new(
            FileStorage::open(&config.database_url)
                .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", config.database_url))?,
        )
    };

    let control_plane = AsyncControlPlane::with_approval_ttl(storage, config.approval_ttl_seconds);
    let blast_box = BlastBox::new(config.blast_box.clone());
    let sandbox_runtime: Arc<dyn SandboxRuntime> = Arc::new(TokioSandbox::new());
    let identities = IdentityAllowList::load(&config.identities_path)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", config.identities_path))?;

    let state = AppState::new(control_plane, blast_box, sandbox_runtime, identities, &config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {e}", config.listen_addr))?;

    tracing::info!(addr = %config.listen_addr, "gavel gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;

    tracing::info!("gavel gateway shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received terminate signal, initiating graceful shutdown");
        }
    }
}
