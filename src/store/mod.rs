// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Report persistence
//!
//! Storage is optional. Callers hold an `Option<Arc<dyn Store>>` and treat
//! a missing store as "history unavailable", never as a request failure.

pub mod models;
mod sqlite;

pub use models::{HistoryPage, ReportSummary};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::report::Report;

/// Abstract store trait for different database backends
#[async_trait]
pub trait Store: Send + Sync {
    async fn save_report(&self, report: &Report) -> Result<()>;
    async fn get_report(&self, id: Uuid) -> Result<Option<Report>>;
    /// Newest first
    async fn list_reports(&self, page: HistoryPage) -> Result<Vec<ReportSummary>>;

    // Utility
    async fn health_check(&self) -> Result<bool>;
}

/// Open the configured store; a disabled or unreachable database yields `None`
pub async fn connect(config: &DatabaseConfig) -> Option<Arc<dyn Store>> {
    if !config.enabled {
        info!("Report store disabled");
        return None;
    }

    match SqliteStore::new(&config.url, config.max_connections).await {
        Ok(store) => {
            info!("Report store connected: {}", config.url);
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!("Report store unavailable ({}), continuing without history", e);
            None
        }
    }
}
