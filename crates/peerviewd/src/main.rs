//! peerviewd — role-aware WebRTC signaling daemon.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use peerview_core::PeerviewConfig;
use peerview_services::{PeerDirectory, PeerView, SignalRelay};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = PeerviewConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = PeerviewConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        PeerviewConfig::default()
    });
    tracing::info!(
        pairing = config.pairing.enabled,
        respect_capacity = config.pairing.respect_capacity,
        wait_timeout_secs = config.signaling.wait_timeout_secs,
        "peerviewd starting"
    );
    if config.pairing.respect_capacity && !config.pairing.enabled {
        tracing::warn!("respect_capacity has no effect while pairing is disabled");
    }

    // Shared state
    let directory = PeerDirectory::new();
    let view = Arc::new(PeerView::new(directory.clone(), config.pairing));
    let relay = SignalRelay::new(directory, &config.signaling);
    let state = peerview_api::ApiState::new(view, relay);

    let addr = format!("{}:{}", config.network.bind_addr, config.network.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);
    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    peerview_api::serve(state, listener, async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    tracing::info!("shutting down");
    Ok(())
}
