// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! HTTP API
//!
//! ```text
//! POST /api/analyze/url     {url}
//! POST /api/analyze/html    {htmlContent}
//! GET  /api/health
//! GET  /api/history?page&limit
//! GET  /api/reports/:id
//! ```

mod handlers;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::Error;
use crate::pipeline::AnalysisPipeline;
use crate::store::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub store: Option<Arc<dyn Store>>,
}

/// Create the API router
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/analyze/url", post(handlers::analyze_url))
        .route("/api/analyze/html", post(handlers::analyze_html))
        .route("/api/health", get(handlers::health))
        .route("/api/history", get(handlers::history))
        .route("/api/reports/:id", get(handlers::get_report))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}
