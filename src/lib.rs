// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! wcagbot - WCAG accessibility analysis service
//!
//! Accepts a page URL or raw markup and returns a scored, categorized
//! compliance report with remediation guidance.
//!
//! # Architecture
//!
//! ```text
//! request → RenderingCoordinator → RenderedDocument → RuleEngineAdapter
//!         → RawFindings → build_report → Report → (Store) + response
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::AnalysisPipeline;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::pipeline::AnalysisPipeline;
    pub use crate::render::AnalysisRequest;
    pub use crate::report::Report;
    pub use crate::store::Store;
}
