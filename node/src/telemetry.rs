// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() {
    // 1. Initialize Tracing (Logs)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "kvlog_node=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Initialize Metrics (Prometheus)
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROM_HANDLE.set(handle).is_err() {
                tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed; /metrics disabled"),
    }

    // 3. Describe kvlog metrics
    metrics::describe_counter!("kvlog_events_written_total", "Events appended to the transaction log");
    metrics::describe_histogram!("kvlog_event_write_duration_seconds", "Time to write (and sync) one event");
    metrics::describe_counter!("kvlog_write_failures_total", "Fatal durable write failures");
    metrics::describe_counter!("kvlog_events_replayed_total", "Events applied during startup replay");
    metrics::describe_histogram!("kvlog_replay_duration_seconds", "Time taken to replay the transaction log");

    // Ensure at least one metric exists on startup
    metrics::gauge!("kvlog_node_up", 1.0);
}

/// Get the Prometheus handle to render metrics
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
