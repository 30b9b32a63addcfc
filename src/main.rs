// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use gobuzz_proof_relay::{
    api::router,
    config::{Config, DEFAULT_LOG_FILTER},
    logging::{init_logging, LogFormat},
    providers::{ProofProvider, ReclaimClient, TwitterClient},
    session_sweeper::SessionSweeper,
    state::AppState,
};

#[tokio::main]
async fn main() {
    init_logging(LogFormat::from_env(), DEFAULT_LOG_FILTER);

    let config = Config::from_env().expect("Invalid configuration");

    let reclaim = ReclaimClient::new(config.reclaim.clone(), config.upstream_timeout)
        .expect("Failed to build Reclaim client");
    if !reclaim.is_configured() {
        warn!(
            "Reclaim credentials or trusted witnesses missing; sessions cannot be opened or proofs verified"
        );
    }
    let twitter = TwitterClient::new(config.twitter_bearer_token.clone(), config.upstream_timeout)
        .expect("Failed to build Twitter client");

    let bind_host = config.host.clone();
    let port = config.port;
    let sweep_interval = config.sweep_interval;
    let policy = config.comment_policy;

    let state = AppState::new(config, Arc::new(reclaim), Arc::new(twitter));

    let shutdown = CancellationToken::new();
    let sweeper = SessionSweeper::new(state.sessions.clone(), sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let app = router(state);
    let listener = bind_listener(&bind_host, port)
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read bound address");

    info!(%addr, ?policy, "GO BUZZ proof relay listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .expect("HTTP server failed");

    shutdown.cancel();
    if let Err(e) = sweeper_handle.await {
        warn!(error = %e, "Session sweeper did not stop cleanly");
    }
    info!("Server stopped");
}

/// `host` may be an IP literal or a name such as `localhost`.
async fn bind_listener(host: &str, port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((host, port)).await
}

/// Resolves on Ctrl-C or SIGTERM and cancels background tasks.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_hostnames_and_ip_literals() {
        for host in ["localhost", "127.0.0.1"] {
            let listener = bind_listener(host, 0).await.expect("bind succeeds");
            assert!(listener.local_addr().unwrap().ip().is_loopback());
        }
    }
}
