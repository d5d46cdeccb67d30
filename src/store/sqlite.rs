// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! SQLite store implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use uuid::Uuid;

use super::{models::*, Store};
use crate::error::{Error, Result};
use crate::render::AnalysisMethod;
use crate::report::Report;

/// SQLite-backed store
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                input_kind TEXT NOT NULL,
                input_label TEXT NOT NULL,
                analysis_method TEXT NOT NULL,
                reduced_fidelity INTEGER NOT NULL DEFAULT 0,
                compliance_score INTEGER NOT NULL,
                total_issues INTEGER NOT NULL,
                accessibility_impact_score INTEGER NOT NULL,
                report_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn save_report(&self, report: &Report) -> Result<()> {
        let report_json = serde_json::to_string(report)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO reports (
                id, input_kind, input_label, analysis_method, reduced_fidelity,
                compliance_score, total_issues, accessibility_impact_score,
                report_json, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(report.id.to_string())
        .bind(report.input.kind())
        .bind(report.input.label())
        .bind(report.analysis_method.as_str())
        .bind(report.reduced_fidelity)
        .bind(i64::from(report.compliance_score))
        .bind(report.total_issues as i64)
        .bind(i64::from(report.accessibility_impact_score))
        .bind(&report_json)
        .bind(report.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<Report>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT report_json FROM reports WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(json,)| serde_json::from_str(&json).map_err(Error::from))
            .transpose()
    }

    async fn list_reports(&self, page: HistoryPage) -> Result<Vec<ReportSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT id, input_kind, input_label, analysis_method, reduced_fidelity,
                   compliance_score, total_issues, accessibility_impact_score, created_at
            FROM reports
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn health_check(&self) -> Result<bool> {
        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.0 == 1)
    }
}

// =============================================================================
// Row types for sqlx
// =============================================================================

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: String,
    input_kind: String,
    input_label: String,
    analysis_method: String,
    reduced_fidelity: bool,
    compliance_score: i64,
    total_issues: i64,
    accessibility_impact_score: i64,
    created_at: String,
}

impl TryFrom<SummaryRow> for ReportSummary {
    type Error = Error;

    fn try_from(row: SummaryRow) -> Result<Self> {
        let analysis_method: AnalysisMethod =
            serde_json::from_value(serde_json::Value::String(row.analysis_method))?;

        Ok(ReportSummary {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| Error::Internal(format!("Invalid report id: {}", e)))?,
            timestamp: parse_timestamp(&row.created_at)?,
            input_kind: row.input_kind,
            input_label: row.input_label,
            analysis_method,
            reduced_fidelity: row.reduced_fidelity,
            compliance_score: row.compliance_score.clamp(0, 100) as u8,
            total_issues: row.total_issues.max(0) as usize,
            accessibility_impact_score: row.accessibility_impact_score.clamp(0, 100) as u8,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RawFindings, RawRuleResult};
    use crate::report::{build_report_at, AnalysisContext, ReportInput};
    use chrono::TimeZone;

    async fn memory_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:", 1).await.unwrap()
    }

    fn report_at(url: &str, minute: u32) -> Report {
        let context = AnalysisContext {
            input: ReportInput::Url { url: url.to_string() },
            method: AnalysisMethod::HttpFetch,
            fallback_used: false,
            reduced_fidelity: false,
        };
        let findings = RawFindings {
            violations: vec![RawRuleResult {
                id: "html-has-lang".to_string(),
                impact: Some("serious".to_string()),
                description: String::new(),
                help: "<html> element must have a lang attribute".to_string(),
                help_url: None,
                tags: vec!["wcag2a".to_string()],
                nodes: Vec::new(),
            }],
            ..Default::default()
        };
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 10, minute, 0).unwrap();
        build_report_at(context, &findings, Uuid::new_v4(), at)
    }

    #[tokio::test]
    async fn test_save_and_get_roundtrip() {
        let store = memory_store().await;
        let report = report_at("https://example.org/", 0);

        store.save_report(&report).await.unwrap();
        let loaded = store.get_report(report.id).await.unwrap();

        assert_eq!(loaded, Some(report));
    }

    #[tokio::test]
    async fn test_missing_report_is_none() {
        let store = memory_store().await;
        assert!(store.get_report(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paged() {
        let store = memory_store().await;
        for minute in 0..5 {
            store
                .save_report(&report_at(&format!("https://example.org/{}", minute), minute))
                .await
                .unwrap();
        }

        let first = store.list_reports(HistoryPage::new(Some(1), Some(2))).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].input_label, "https://example.org/4");
        assert_eq!(first[1].input_label, "https://example.org/3");
        assert_eq!(first[0].total_issues, 1);
        assert_eq!(first[0].analysis_method, AnalysisMethod::HttpFetch);

        let last = store.list_reports(HistoryPage::new(Some(3), Some(2))).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].input_label, "https://example.org/0");
    }

    #[tokio::test]
    async fn test_health_check() {
        assert!(memory_store().await.health_check().await.unwrap());
    }
}
