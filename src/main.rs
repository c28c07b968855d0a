// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use sbt_registry::{
    api::router,
    chain::{evm::EvmChainClient, ChainClient},
    config::{Config, LOG_FORMAT_ENV},
    coordinator::IssuanceCoordinator,
    reconciler::Reconciler,
    state::AppState,
    store::TokenDatabase,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let format = std::env::var(LOG_FORMAT_ENV).unwrap_or_default();
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env().expect("Failed to load configuration");

    let store = Arc::new(
        TokenDatabase::open(&config.database_path).expect("Failed to open token database"),
    );

    let chain: Arc<dyn ChainClient> = Arc::new(
        EvmChainClient::new(
            &config.rpc_url,
            &config.private_key,
            &config.contract_address,
        )
        .expect("Failed to construct chain client"),
    );

    let coordinator = Arc::new(IssuanceCoordinator::new(
        store.clone(),
        chain,
        config.confirmation_timeout,
    ));

    // Background reconciler settles records left pending by confirmation
    // timeouts or crashes between submission and confirmation.
    let shutdown = CancellationToken::new();
    let reconciler = Reconciler::new(coordinator.clone(), config.reconcile_interval);
    let reconciler_handle = tokio::spawn(reconciler.run(shutdown.clone()));

    let state = AppState::new(coordinator, store);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");

    tracing::info!(%addr, "SBT registry listening (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .expect("HTTP server failed");

    shutdown.cancel();
    let _ = reconciler_handle.await;
}
