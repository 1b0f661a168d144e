// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kvlog_kernel::{RecordError, StoreError};
use serde_json::json;
use thiserror::Error;

use crate::log::LogError;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("no such key: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(#[from] RecordError),
    #[error("store error: {0}")]
    Store(StoreError),
    #[error("transaction log error: {0}")]
    Log(#[from] LogError),
}

impl From<StoreError> for NodeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => NodeError::NotFound(key),
            other => NodeError::Store(other),
        }
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = match &self {
            NodeError::NotFound(_) => StatusCode::NOT_FOUND,
            NodeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            NodeError::Store(_) | NodeError::Log(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
