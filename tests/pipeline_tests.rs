// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! End-to-end pipeline tests: acquisition, built-in engine, report

use wcagbot::config::{Config, RenderingConfig};
use wcagbot::error::Error;
use wcagbot::render::{AnalysisMethod, AnalysisRequest};
use wcagbot::report::{ReportInput, Severity};
use wcagbot::AnalysisPipeline;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INACCESSIBLE: &str = include_str!("fixtures/inaccessible.html");
const ACCESSIBLE: &str = include_str!("fixtures/accessible.html");

/// Pipeline over the given backends with the remote service on the mock server
fn pipeline(server_url: &str, backends: Vec<AnalysisMethod>) -> AnalysisPipeline {
    let mut rendering = RenderingConfig {
        backends,
        timeout_secs: 5,
        settle_ms: 0,
        ..Default::default()
    };
    rendering.remote.endpoint = server_url.to_string();

    let config = Config {
        rendering,
        ..Default::default()
    };
    AnalysisPipeline::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_url_analysis_over_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(INACCESSIBLE))
        .mount(&server)
        .await;

    let pipeline = pipeline(&server.uri(), vec![AnalysisMethod::HttpFetch]);
    let url = format!("{}/shop", server.uri());
    let report = pipeline.analyze(&AnalysisRequest::url(url.clone())).await.unwrap();

    assert_eq!(report.analysis_method, AnalysisMethod::HttpFetch);
    assert!(!report.fallback_used);
    assert!(!report.reduced_fidelity);
    assert_eq!(report.input, ReportInput::Url { url });
    assert_eq!(report.total_issues, 8);
    assert_eq!(report.severity_breakdown.critical, 4);
    assert_eq!(report.severity_breakdown.serious, 4);
    assert_eq!(report.accessibility_impact_score, 100);
    // 0 passes, 1 incomplete out of 9 rule results
    assert_eq!(report.compliance_score, 6);

    let ordinals: Vec<usize> = report.violations.iter().map(|v| v.id).collect();
    assert_eq!(ordinals, (1..=8).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_html_analysis_skips_rendering() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server.uri(), vec![AnalysisMethod::HttpFetch]);
    let report = pipeline
        .analyze(&AnalysisRequest::html(ACCESSIBLE))
        .await
        .unwrap();

    assert_eq!(report.analysis_method, AnalysisMethod::InlineMarkup);
    assert_eq!(report.compliance_score, 100);
    assert_eq!(report.total_issues, 0);
    assert_eq!(report.passes.len(), 8);
    match &report.input {
        ReportInput::Html { preview, length } => {
            assert!(preview.starts_with("<!DOCTYPE html>"));
            assert_eq!(*length, ACCESSIBLE.chars().count());
        }
        other => panic!("expected html input, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fallback_is_recorded_in_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/content"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACCESSIBLE))
        .mount(&server)
        .await;

    let pipeline = pipeline(
        &server.uri(),
        vec![AnalysisMethod::RemoteBrowser, AnalysisMethod::HttpFetch],
    );
    let report = pipeline
        .analyze(&AnalysisRequest::url(format!("{}/", server.uri())))
        .await
        .unwrap();

    assert_eq!(report.analysis_method, AnalysisMethod::HttpFetch);
    assert!(report.fallback_used);
    assert!(report.reduced_fidelity);
}

#[tokio::test]
async fn test_invalid_url_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server.uri(), vec![AnalysisMethod::HttpFetch]);
    let err = pipeline
        .analyze(&AnalysisRequest::url("not-a-url"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidUrl(_)));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_plain_text_is_rejected() {
    let server = MockServer::start().await;
    let pipeline = pipeline(&server.uri(), vec![AnalysisMethod::HttpFetch]);

    let err = pipeline
        .analyze(&AnalysisRequest::html("no markup here"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidMarkup(_)));
}

#[tokio::test]
async fn test_upstream_error_fails_the_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let pipeline = pipeline(&server.uri(), vec![AnalysisMethod::HttpFetch]);
    let err = pipeline
        .analyze(&AnalysisRequest::url(format!("{}/down", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UpstreamStatus(503)));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn test_severity_display_names() {
    assert_eq!(Severity::Critical.to_string(), "Critical");
    assert_eq!(Severity::Minor.to_string(), "Minor");
}
