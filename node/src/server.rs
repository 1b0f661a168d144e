// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::errors::NodeError;
use crate::service::KvService;

pub type SharedService = Arc<KvService>;

async fn auth_guard(
    State(token): State<Arc<String>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.strip_prefix("Bearer "));

    match provided {
        Some(p) if p == token.as_str() => Ok(next.run(req).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

pub fn build_router(service: SharedService, auth_token: Option<String>) -> Router {
    let mut app = Router::new()
        .route(
            "/v1/key/:key",
            get(get_key).put(put_key).delete(delete_key),
        )
        .route("/metrics", get(metrics_handler))
        .with_state(service);

    if let Some(token) = auth_token {
        tracing::info!("Auth Enabled: Bearer token required");
        app = app.layer(from_fn_with_state(Arc::new(token), auth_guard));
    } else {
        tracing::warn!("Auth Disabled: No token configured");
    }

    app.layer(TraceLayer::new_for_http())
}

async fn put_key(
    State(service): State<SharedService>,
    Path(key): Path<String>,
    value: String,
) -> Result<StatusCode, NodeError> {
    service.put(key, value).await?;
    Ok(StatusCode::CREATED)
}

async fn get_key(
    State(service): State<SharedService>,
    Path(key): Path<String>,
) -> Result<String, NodeError> {
    service.get(&key)
}

async fn delete_key(
    State(service): State<SharedService>,
    Path(key): Path<String>,
) -> Result<StatusCode, NodeError> {
    service.delete(key).await?;
    Ok(StatusCode::OK)
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}
