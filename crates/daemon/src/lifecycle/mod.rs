// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, serving, graceful shutdown.

mod startup;
pub use startup::{startup, startup_with};

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ConfigError, TlsConfig};
use crate::directory::Directory;
use crate::env;
use crate::metrics::{Metrics, MetricsError};
use crate::routes::RouteError;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot build routes: {0}")]
    Route(#[from] RouteError),

    #[error("cannot register metrics: {0}")]
    Metrics(#[from] MetricsError),

    #[error("cannot bind {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("cannot load TLS material {cert} / {key}: {source}")]
    Tls { cert: PathBuf, key: PathBuf, source: std::io::Error },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// A started gateway: routes built, directory updater running.
pub struct Daemon {
    pub directory: Arc<Directory>,
    pub metrics: Arc<Metrics>,
    app: Router,
    health: Router,
    http_addr: SocketAddr,
    https: Option<(SocketAddr, TlsConfig)>,
    health_addr: Option<SocketAddr>,
    shutdown: CancellationToken,
    updater: JoinHandle<()>,
}

impl Daemon {
    /// Cancelling this token starts a graceful shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The inbound router, for serving on a custom listener.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Bind every configured listener and serve until shutdown.
    pub async fn serve(self) -> Result<(), LifecycleError> {
        let listener = bind(self.http_addr).await?;
        self.serve_on(listener).await
    }

    /// Serve plain HTTP on `listener`, plus the HTTPS and health listeners
    /// when configured, until the shutdown token is cancelled.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), LifecycleError> {
        let drain = env::drain_timeout();
        let mut servers: Vec<JoinHandle<Result<(), LifecycleError>>> = Vec::new();

        if let Some(addr) = self.health_addr {
            let health = bind(addr).await?;
            info!(%addr, "health listener started");
            let server = serve_http(health, self.health.clone(), self.shutdown.clone(), drain);
            servers.push(tokio::spawn(server));
        }

        if let Some((addr, tls)) = &self.https {
            let rustls =
                RustlsConfig::from_pem_file(&tls.certificate, &tls.key).await.map_err(|source| {
                    LifecycleError::Tls {
                        cert: tls.certificate.clone(),
                        key: tls.key.clone(),
                        source,
                    }
                })?;
            info!(addr = %addr, "https listener started");
            let server = serve_https(*addr, rustls, self.app.clone(), self.shutdown.clone(), drain);
            servers.push(tokio::spawn(server));
        }

        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "http listener started");
        }
        let result = serve_http(listener, self.app.clone(), self.shutdown.clone(), drain).await;

        // Any listener failing takes the others down with it.
        self.shutdown.cancel();
        for server in servers {
            match server.await {
                Ok(Err(e)) => warn!(error = %e, "listener stopped with error"),
                Err(e) => warn!(error = %e, "listener task failed"),
                Ok(Ok(())) => {}
            }
        }
        if let Err(e) = self.updater.await {
            warn!(error = %e, "directory updater task failed");
        }
        info!("gateway stopped");
        result
    }
}

async fn bind(addr: SocketAddr) -> Result<TcpListener, LifecycleError> {
    TcpListener::bind(addr).await.map_err(|e| LifecycleError::BindFailed(addr, e))
}

async fn serve_http(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
    drain: Duration,
) -> Result<(), LifecycleError> {
    let token = shutdown.clone();
    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { token.cancelled().await })
        .into_future();

    tokio::select! {
        result = server => result.map_err(LifecycleError::Serve),
        _ = drain_deadline(&shutdown, drain) => {
            warn!(?drain, "drain timeout elapsed, dropping open connections");
            Ok(())
        }
    }
}

async fn serve_https(
    addr: SocketAddr,
    tls: RustlsConfig,
    app: Router,
    shutdown: CancellationToken,
    drain: Duration,
) -> Result<(), LifecycleError> {
    let handle = axum_server::Handle::new();
    let stopper = handle.clone();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        stopper.graceful_shutdown(Some(drain));
    });

    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(LifecycleError::Serve)
}

async fn drain_deadline(shutdown: &CancellationToken, drain: Duration) {
    shutdown.cancelled().await;
    tokio::time::sleep(drain).await;
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
