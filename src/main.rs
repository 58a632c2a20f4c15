// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, future::Future, io, net::SocketAddr, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use identity_gateway::{
    api::router,
    config::{FirebaseConfig, LogFormat, ServerConfig},
    providers::{firebase::FirebaseClient, IdentityProvider},
    state::AppState,
};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let config = ServerConfig::from_env()?;
    init_tracing(config.log_format);

    let provider = build_provider(&config)?;
    info!(
        provider = provider.name(),
        timeout_secs = config.provider_timeout.as_secs(),
        "Identity provider configured"
    );

    let state = AppState::new(provider).with_provider_timeout(config.provider_timeout);
    let app = router(state);
    let addr = config.bind_addr()?;

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    match &config.tls {
        Some(tls) => {
            // Must happen before any TLS configuration is built.
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| "failed to install rustls crypto provider")?;

            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            info!(%addr, "Identity gateway listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!(%addr, "Identity gateway listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn build_provider(config: &ServerConfig) -> Result<Arc<dyn IdentityProvider>, Box<dyn Error>> {
    #[cfg(feature = "dev")]
    {
        if !FirebaseConfig::is_configured() {
            warn!("FIREBASE_API_KEY not set, using in-memory identity provider (dev only)");
            return Ok(Arc::new(
                identity_gateway::providers::memory::InMemoryProvider::new(),
            ));
        }
    }

    let firebase = FirebaseConfig::from_env()?;
    let client = FirebaseClient::new(firebase, config.provider_timeout)?;
    Ok(Arc::new(client))
}

async fn shutdown_signal(handle: Handle<SocketAddr>) {
    drain_on(tokio::signal::ctrl_c(), handle).await;
}

/// Start a graceful shutdown once `signal` fires.
async fn drain_on<F>(signal: F, handle: Handle<SocketAddr>)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_server(handle: Handle<SocketAddr>) -> tokio::task::JoinHandle<io::Result<()>> {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        tokio::spawn(
            axum_server::bind(addr)
                .handle(handle)
                .serve(axum::Router::new().into_make_service()),
        )
    }

    #[tokio::test]
    async fn signal_drains_running_server() {
        let handle = Handle::new();
        let server = spawn_server(handle.clone());
        assert!(handle.listening().await.is_some());

        drain_on(async { Ok(()) }, handle).await;

        let stopped = tokio::time::timeout(Duration::from_secs(5), server).await;
        assert!(matches!(stopped, Ok(Ok(Ok(())))));
    }

    #[tokio::test]
    async fn failed_signal_leaves_server_running() {
        let handle = Handle::new();
        let mut server = spawn_server(handle.clone());
        assert!(handle.listening().await.is_some());

        drain_on(async { Err(io::Error::other("no signal handler")) }, handle.clone()).await;
        assert!(tokio::time::timeout(Duration::from_millis(200), &mut server)
            .await
            .is_err());

        handle.shutdown();
    }
}
