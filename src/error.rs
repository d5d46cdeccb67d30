// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for wcagbot

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wcagbot
#[derive(Error, Debug)]
pub enum Error {
    // Caller input
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid markup: {0}")]
    InvalidMarkup(String),

    // Content acquisition
    #[error("Navigation timed out after {}s", .0.as_secs())]
    NavigationTimeout(Duration),

    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Response exceeded {limit} bytes")]
    ResponseTooLarge { limit: usize },

    #[error("Upstream responded with HTTP {0}")]
    UpstreamStatus(u16),

    // Analysis
    #[error("Rule engine failure: {0}")]
    RuleEngineFailure(String),

    // Persistence
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Report store unavailable")]
    StoreUnavailable,

    #[error("Not found: {0}")]
    NotFound(String),

    // Everything else
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classes, used for status mapping and fallback decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself is defective; never retried
    CallerInput,
    /// The page could not be acquired
    Acquisition,
    /// The page was acquired but could not be analyzed
    Analysis,
    /// Report store failures; never fatal to an analysis
    Persistence,
    Internal,
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::InvalidUrl(_) | Error::InvalidMarkup(_) => ErrorClass::CallerInput,
            Error::NavigationTimeout(_)
            | Error::NetworkUnreachable(_)
            | Error::BrowserLaunchFailed(_)
            | Error::ResponseTooLarge { .. }
            | Error::UpstreamStatus(_) => ErrorClass::Acquisition,
            Error::RuleEngineFailure(_) => ErrorClass::Analysis,
            Error::Database(_) | Error::StoreUnavailable | Error::NotFound(_) => {
                ErrorClass::Persistence
            }
            Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Internal(_) => {
                ErrorClass::Internal
            }
        }
    }

    /// HTTP status code for the response envelope
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) | Error::StoreUnavailable => 404,
            _ if self.class() == ErrorClass::CallerInput => 400,
            _ => 500,
        }
    }

    /// Whether a different rendering backend may be tried after this error
    pub fn allows_fallback(&self) -> bool {
        self.class() == ErrorClass::Acquisition
    }

    /// Caller-facing message
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidUrl(reason) => format!("Invalid URL: {}", reason),
            Error::InvalidMarkup(reason) => format!("Invalid HTML content: {}", reason),
            Error::NavigationTimeout(after) => format!(
                "The page took too long to load (timed out after {}s)",
                after.as_secs()
            ),
            Error::NetworkUnreachable(reason) => {
                format!("Could not reach the requested page: {}", reason)
            }
            Error::BrowserLaunchFailed(reason) => {
                format!("The rendering browser could not be started: {}", reason)
            }
            Error::ResponseTooLarge { limit } => {
                format!("The page exceeds the maximum size of {} bytes", limit)
            }
            Error::UpstreamStatus(code) => {
                format!("The page responded with HTTP status {}", code)
            }
            Error::RuleEngineFailure(reason) => format!("Accessibility analysis failed: {}", reason),
            Error::NotFound(what) => format!("{} not found", what),
            Error::StoreUnavailable => "Report history is not available".to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Classify a transport-level HTTP client error
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Error::NavigationTimeout(timeout)
        } else {
            Error::NetworkUnreachable(err.to_string())
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors_map_to_400() {
        assert_eq!(Error::InvalidUrl("not-a-url".into()).status_code(), 400);
        assert_eq!(Error::InvalidMarkup("empty".into()).status_code(), 400);
    }

    #[test]
    fn test_pipeline_errors_map_to_500() {
        assert_eq!(Error::NavigationTimeout(Duration::from_secs(30)).status_code(), 500);
        assert_eq!(Error::RuleEngineFailure("boom".into()).status_code(), 500);
        assert_eq!(Error::ResponseTooLarge { limit: 10 }.status_code(), 500);
    }

    #[test]
    fn test_missing_resources_map_to_404() {
        assert_eq!(Error::NotFound("Report".into()).status_code(), 404);
        assert_eq!(Error::StoreUnavailable.status_code(), 404);
    }

    #[test]
    fn test_only_acquisition_errors_allow_fallback() {
        assert!(Error::NetworkUnreachable("dns".into()).allows_fallback());
        assert!(Error::BrowserLaunchFailed("missing".into()).allows_fallback());
        assert!(!Error::InvalidUrl("ftp".into()).allows_fallback());
        assert!(!Error::RuleEngineFailure("x".into()).allows_fallback());
    }

    #[test]
    fn test_timeout_message_mentions_load() {
        let msg = Error::NavigationTimeout(Duration::from_secs(45)).user_message();
        assert!(msg.contains("took too long to load"));
        assert!(msg.contains("45s"));
    }
}
