// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::future::IntoFuture;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use kvlog_kernel::KeyValueStore;
use kvlog_node::config::NodeArgs;
use kvlog_node::log::{bootstrap, ReadyLog};
use kvlog_node::server::build_router;
use kvlog_node::service::KvService;
use kvlog_node::telemetry::init_telemetry;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    init_telemetry();

    let cfg = NodeArgs::parse().into_config();
    tracing::info!("Initializing kvlog node with config: {:?}", cfg);

    let store = Arc::new(KeyValueStore::new());

    let ReadyLog {
        handle,
        mut monitor,
        replayed,
        last_sequence,
    } = match bootstrap(&cfg, store.clone()).await {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(replayed, last_sequence, "Store restored from transaction log");

    let service = Arc::new(KvService::new(store, handle));
    let app = build_router(service, cfg.auth_token.clone());

    let listener = match TcpListener::bind(cfg.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %cfg.bind_addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Listening on {}", cfg.bind_addr);

    let served = tokio::select! {
        res = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).into_future() => {
            res.map_err(|e| e.to_string())
        }
        Some(err) = monitor.error() => Err(err.to_string()),
    };

    if let Err(e) = served {
        tracing::error!(error = %e, "Shutting down after fatal error");
        return ExitCode::FAILURE;
    }

    // Router (and every LogHandle in it) is gone; let the writer drain.
    match monitor.join().await {
        Ok(last) => {
            tracing::info!(last_sequence = last, "Transaction log closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Transaction log did not close cleanly");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
