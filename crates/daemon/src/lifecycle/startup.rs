// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway startup: wire the directory, updater, transport and routes.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{Daemon, LifecycleError};
use crate::config::Config;
use crate::directory::{Directory, Updater};
use crate::health;
use crate::metrics::Metrics;
use crate::orchestrator::{Orchestrator, RemoteOrchestrator};
use crate::proxy::{build_client, HttpTransport, RoundTrip};
use crate::routes::{self, RouteContext};

/// Start the gateway against the configured orchestrator and backends.
///
/// Must run inside a tokio runtime: the directory updater is spawned here.
pub fn startup(config: Config) -> Result<Daemon, LifecycleError> {
    let client = build_client(&config.proxy.transport_config);
    let orchestrator = Arc::new(RemoteOrchestrator::new(
        config.workspace_info_provider_config.ws_manager_addr.clone(),
        client.clone(),
    ));
    startup_with(config, orchestrator, Arc::new(HttpTransport::new(client)))
}

/// Start the gateway with an explicit orchestrator and backend transport.
pub fn startup_with(
    config: Config,
    orchestrator: Arc<dyn Orchestrator>,
    transport: Arc<dyn RoundTrip>,
) -> Result<Daemon, LifecycleError> {
    config.validate()?;
    let config = Arc::new(config);

    let directory = Directory::new();
    let metrics = Arc::new(Metrics::new()?);
    let ctx = RouteContext::new(config.clone(), directory.clone(), transport);
    let app = routes::app(&ctx, metrics.clone())?;
    let health = health::router(directory.clone(), metrics.clone());

    // Spawned last: a route error must not leave the updater running.
    let shutdown = CancellationToken::new();
    let updater = Updater::new(
        orchestrator,
        directory.clone(),
        config.workspace_info_provider_config.reconnect_interval,
    )
    .spawn(shutdown.clone());

    info!(
        strategy = ?config.routing.strategy,
        host = %config.proxy.gitpod_installation.host_name,
        "gateway started"
    );

    let ingress = &config.ingress;
    Ok(Daemon {
        directory,
        metrics,
        app,
        health,
        http_addr: ingress.http_address,
        https: ingress.https_address.zip(ingress.tls.clone()),
        health_addr: config.readiness_probe_addr,
        shutdown,
        updater,
    })
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
