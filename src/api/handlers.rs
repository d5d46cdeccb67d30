// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Route handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use crate::error::{Error, Result};
use crate::render::{AnalysisMethod, AnalysisRequest, PoolStats};
use crate::report::Report;
use crate::store::{HistoryPage, ReportSummary};

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeUrlBody {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeHtmlBody {
    pub html_content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryData {
    pub reports: Vec<ReportSummary>,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub store_connected: bool,
    pub engine: String,
    pub renderer: RendererHealth,
}

#[derive(Debug, Serialize)]
pub struct RendererHealth {
    pub primary: Option<AnalysisMethod>,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}

pub async fn analyze_url(
    State(state): State<AppState>,
    body: std::result::Result<Json<AnalyzeUrlBody>, JsonRejection>,
) -> Result<Json<ApiResponse<Report>>> {
    let Json(body) = body.map_err(|e| {
        Error::InvalidUrl(format!("request body must be JSON with a \"url\" field ({})", e.body_text()))
    })?;

    let url = body.url.unwrap_or_default();
    info!("Analyzing URL {}", url.trim());

    let report = state.pipeline.analyze(&AnalysisRequest::url(url)).await?;
    persist(&state, &report);

    Ok(ApiResponse::ok(report))
}

pub async fn analyze_html(
    State(state): State<AppState>,
    body: std::result::Result<Json<AnalyzeHtmlBody>, JsonRejection>,
) -> Result<Json<ApiResponse<Report>>> {
    let Json(body) = body.map_err(|e| {
        Error::InvalidMarkup(format!(
            "request body must be JSON with an \"htmlContent\" field ({})",
            e.body_text()
        ))
    })?;

    let markup = body.html_content.unwrap_or_default();
    info!("Analyzing {} characters of submitted HTML", markup.chars().count());

    let report = state.pipeline.analyze(&AnalysisRequest::html(markup)).await?;
    persist(&state, &report);

    Ok(ApiResponse::ok(report))
}

/// Save in the background; the response never waits on the store
fn persist(state: &AppState, report: &Report) {
    let Some(store) = state.store.clone() else {
        return;
    };
    let report = report.clone();

    tokio::spawn(async move {
        match store.save_report(&report).await {
            Ok(()) => tracing::debug!("Saved report {}", report.id),
            Err(e) => warn!("Failed to save report {}: {}", report.id, e),
        }
    });
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = match &state.store {
        Some(store) => store.health_check().await.unwrap_or(false),
        None => false,
    };
    let coordinator = state.pipeline.coordinator();

    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        store_connected,
        engine: state.pipeline.engine().engine_name().to_string(),
        renderer: RendererHealth {
            primary: coordinator.primary(),
            fallback: coordinator.fallback_enabled(),
            pool: coordinator.pool_stats(),
        },
    })
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<ApiResponse<HistoryData>> {
    let page = HistoryPage::new(
        query.page.and_then(|p| p.trim().parse().ok()),
        query.limit.and_then(|l| l.trim().parse().ok()),
    );

    let reports = match &state.store {
        Some(store) => store.list_reports(page).await.unwrap_or_else(|e| {
            warn!("Failed to list reports: {}", e);
            Vec::new()
        }),
        None => Vec::new(),
    };

    ApiResponse::ok(HistoryData {
        reports,
        page: page.page,
        limit: page.limit,
    })
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Report>>> {
    let store = state.store.as_ref().ok_or(Error::StoreUnavailable)?;
    let id = Uuid::parse_str(id.trim()).map_err(|_| Error::NotFound("Report".to_string()))?;

    match store.get_report(id).await {
        Ok(Some(report)) => Ok(ApiResponse::ok(report)),
        Ok(None) => Err(Error::NotFound("Report".to_string())),
        Err(e) => {
            warn!("Failed to load report {}: {}", id, e);
            Err(Error::StoreUnavailable)
        }
    }
}
