// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Built-in static rule engine
//!
//! Evaluates a fixed catalogue of WCAG rules against parsed markup. No
//! scripts run and no stylesheets are loaded, so colour checks only see
//! inline styles and report what they cannot decide as incomplete.
//!
//! Per rule: no applicable nodes means the rule is left out, any failing
//! node makes it a violation, any undecidable node adds it to incomplete,
//! and a rule with only passing nodes is a pass.

pub mod aria;
pub mod contrast;
pub mod forms;
pub mod language;
pub mod names;
pub mod text_alternatives;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{Impact, RawFindings, RawNode, RawRuleResult, RuleEngine, RuleSelection};
use crate::error::{Error, Result};
use crate::render::RenderedDocument;

/// Opening-tag snippets longer than this are cut
const MAX_SNIPPET_CHARS: usize = 250;

/// A single static check
pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;

    fn impact(&self) -> Impact;

    fn description(&self) -> &'static str;

    fn help(&self) -> &'static str;

    fn help_url(&self) -> &'static str;

    fn tags(&self) -> &'static [&'static str];

    /// Check every applicable node
    fn evaluate(&self, document: &Html) -> Vec<NodeCheck>;
}

/// Outcome for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(String),
    CantTell(String),
}

#[derive(Debug, Clone)]
pub struct NodeCheck {
    pub target: String,
    pub html: String,
    pub outcome: Outcome,
}

impl NodeCheck {
    fn new(element: ElementRef<'_>, outcome: Outcome) -> Self {
        Self {
            target: css_path(element),
            html: opening_tag(element),
            outcome,
        }
    }

    pub fn pass(element: ElementRef<'_>) -> Self {
        Self::new(element, Outcome::Pass)
    }

    pub fn fail(element: ElementRef<'_>, summary: impl Into<String>) -> Self {
        Self::new(element, Outcome::Fail(summary.into()))
    }

    pub fn cant_tell(element: ElementRef<'_>, summary: impl Into<String>) -> Self {
        Self::new(element, Outcome::CantTell(summary.into()))
    }

    fn into_raw(self, impact: Impact) -> RawNode {
        let failure_summary = match self.outcome {
            Outcome::Pass => None,
            Outcome::Fail(summary) => Some(format!("Fix any of the following:\n  {}", summary)),
            Outcome::CantTell(summary) => Some(format!("Review the following:\n  {}", summary)),
        };

        RawNode {
            target: self.target,
            html: self.html,
            failure_summary,
            impact: Some(impact.as_str().to_string()),
        }
    }
}

/// The rule catalogue, in evaluation order
pub fn catalogue() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(text_alternatives::ImageAlt),
        Box::new(language::HtmlHasLang),
        Box::new(text_alternatives::DocumentTitle),
        Box::new(forms::Label),
        Box::new(names::ButtonName),
        Box::new(names::LinkName),
        Box::new(text_alternatives::FrameTitle),
        Box::new(aria::AriaRoles),
        Box::new(contrast::ColorContrast),
    ]
}

/// Run every selected catalogue rule over `markup`
pub fn evaluate_markup(markup: &str, selection: RuleSelection) -> RawFindings {
    evaluate_rules(&catalogue(), markup, selection)
}

fn evaluate_rules(rules: &[Box<dyn Rule>], markup: &str, selection: RuleSelection) -> RawFindings {
    let document = Html::parse_document(markup);
    let mut findings = RawFindings::default();

    for rule in rules {
        if !selection.matches(rule.tags()) {
            debug!("Skipping {} (outside selection)", rule.id());
            continue;
        }

        let checks = rule.evaluate(&document);
        if checks.is_empty() {
            continue;
        }

        let (mut failing, mut undecided, mut passing) = (Vec::new(), Vec::new(), Vec::new());
        for check in checks {
            match check.outcome {
                Outcome::Pass => passing.push(check),
                Outcome::Fail(_) => failing.push(check),
                Outcome::CantTell(_) => undecided.push(check),
            }
        }

        let clean = failing.is_empty() && undecided.is_empty();
        if !failing.is_empty() {
            findings.violations.push(rule_result(rule.as_ref(), failing));
        }
        if !undecided.is_empty() {
            findings.incomplete.push(rule_result(rule.as_ref(), undecided));
        }
        if clean {
            findings.passes.push(rule_result(rule.as_ref(), passing));
        }
    }

    findings
}

fn rule_result(rule: &dyn Rule, checks: Vec<NodeCheck>) -> RawRuleResult {
    let impact = rule.impact();
    RawRuleResult {
        id: rule.id().to_string(),
        impact: Some(impact.as_str().to_string()),
        description: rule.description().to_string(),
        help: rule.help().to_string(),
        help_url: Some(rule.help_url().to_string()),
        tags: rule.tags().iter().map(|t| t.to_string()).collect(),
        nodes: checks.into_iter().map(|c| c.into_raw(impact)).collect(),
    }
}

/// Static rule engine over parsed markup
#[derive(Debug, Default, Clone)]
pub struct StaticRuleEngine;

impl StaticRuleEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RuleEngine for StaticRuleEngine {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn evaluate(
        &self,
        document: &RenderedDocument,
        selection: RuleSelection,
    ) -> Result<RawFindings> {
        // Parsed trees are not Send, so parsing and evaluation stay on one blocking thread
        let markup = document.markup.clone();
        tokio::task::spawn_blocking(move || evaluate_markup(&markup, selection))
            .await
            .map_err(|e| Error::RuleEngineFailure(format!("rule evaluation aborted: {}", e)))
    }
}

/// Selector path from the root (or nearest id) down to `element`
pub fn css_path(element: ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        let name = el.value().name();

        if let Some(id) = el.value().id() {
            if is_plain_ident(id) {
                segments.push(format!("#{}", id));
                break;
            }
        }

        if name == "html" {
            segments.push(name.to_string());
            break;
        }

        let before = el
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .filter(|s| s.value().name() == name)
            .count();
        let after = el
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .filter(|s| s.value().name() == name)
            .count();

        if before + after > 0 {
            segments.push(format!("{}:nth-of-type({})", name, before + 1));
        } else {
            segments.push(name.to_string());
        }

        current = el.parent().and_then(ElementRef::wrap);
    }

    segments.reverse();
    segments.join(" > ")
}

fn is_plain_ident(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Reconstruct the element's opening tag
pub fn opening_tag(element: ElementRef<'_>) -> String {
    let attrs: String = element
        .value()
        .attrs()
        .map(|(k, v)| format!(" {}=\"{}\"", k, v))
        .collect();
    let tag = format!("<{}{}>", element.value().name(), attrs);

    if tag.chars().count() > MAX_SNIPPET_CHARS {
        let cut: String = tag.chars().take(MAX_SNIPPET_CHARS).collect();
        format!("{}...>", cut)
    } else {
        tag
    }
}

/// Non-empty, trimmed attribute value
pub fn non_empty_attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Visible text with whitespace collapsed
pub fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the elements an aria-labelledby attribute points at
pub fn labelledby_text(document: &Html, element: ElementRef<'_>) -> String {
    let Some(ids) = element.value().attr("aria-labelledby") else {
        return String::new();
    };

    let id_sel = Selector::parse("[id]").expect("valid selector");
    ids.split_whitespace()
        .filter_map(|id| document.select(&id_sel).find(|e| e.value().id() == Some(id)))
        .map(collapsed_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Approximate accessible name: aria-labelledby, aria-label, content, then title
pub fn accessible_name(document: &Html, element: ElementRef<'_>) -> String {
    let labelled = labelledby_text(document, element);
    if !labelled.is_empty() {
        return labelled;
    }

    if let Some(label) = non_empty_attr(element, "aria-label") {
        return label.to_string();
    }

    let text = collapsed_text(element);
    if !text.is_empty() {
        return text;
    }

    let img_sel = Selector::parse("img[alt]").expect("valid selector");
    let alts: Vec<&str> = element
        .select(&img_sel)
        .filter_map(|img| non_empty_attr(img, "alt"))
        .collect();
    if !alts.is_empty() {
        return alts.join(" ");
    }

    non_empty_attr(element, "title").unwrap_or_default().to_string()
}

/// Whether the element or an ancestor hides it from assistive technology
pub fn is_hidden(element: ElementRef<'_>) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| el.value().attr("hidden").is_some() || el.value().attr("aria-hidden") == Some("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first<'a>(document: &'a Html, selector: &str) -> ElementRef<'a> {
        let sel = Selector::parse(selector).unwrap();
        document.select(&sel).next().unwrap()
    }

    #[test]
    fn test_css_path_uses_nth_of_type_for_siblings() {
        let document = Html::parse_document(
            "<html><body><main><p>a</p><p>b</p></main></body></html>",
        );
        let sel = Selector::parse("p").unwrap();
        let second = document.select(&sel).nth(1).unwrap();
        assert_eq!(css_path(second), "html > body > main > p:nth-of-type(2)");
    }

    #[test]
    fn test_css_path_stops_at_id() {
        let document = Html::parse_document(
            r#"<html><body><div id="content"><img src="a.png"></div></body></html>"#,
        );
        assert_eq!(css_path(first(&document, "img")), "#content > img");
    }

    #[test]
    fn test_opening_tag_keeps_attributes() {
        let document = Html::parse_document(r#"<img src="logo.png" class="brand">"#);
        let tag = opening_tag(first(&document, "img"));
        assert!(tag.starts_with("<img "));
        assert!(tag.contains(r#"src="logo.png""#));
        assert!(tag.contains(r#"class="brand""#));
    }

    #[test]
    fn test_accessible_name_sources() {
        let document = Html::parse_document(
            r#"<span id="lbl">Search site</span>
               <button aria-labelledby="lbl"></button>
               <a href="/" aria-label="Home"></a>
               <a href="/x"><img src="x.png" alt="Profile"></a>
               <a href="/y" title="Settings"></a>
               <a href="/z"></a>"#,
        );

        assert_eq!(accessible_name(&document, first(&document, "button")), "Search site");
        assert_eq!(accessible_name(&document, first(&document, r#"a[href="/"]"#)), "Home");
        assert_eq!(accessible_name(&document, first(&document, r#"a[href="/x"]"#)), "Profile");
        assert_eq!(accessible_name(&document, first(&document, r#"a[href="/y"]"#)), "Settings");
        assert_eq!(accessible_name(&document, first(&document, r#"a[href="/z"]"#)), "");
    }

    #[test]
    fn test_clean_document_produces_only_passes() {
        let markup = r#"<!DOCTYPE html>
            <html lang="en"><head><title>Fine</title></head>
            <body><img src="a.png" alt="A chart"><a href="/">Home</a></body></html>"#;

        let findings = evaluate_markup(markup, RuleSelection::wcag21_aa());
        assert!(findings.violations.is_empty(), "{:?}", findings.violations);
        assert!(findings.incomplete.is_empty());

        let ids: Vec<&str> = findings.passes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["image-alt", "html-has-lang", "document-title", "link-name"]);
    }

    #[test]
    fn test_failing_node_makes_rule_a_violation_only() {
        let markup = r#"<html lang="en"><head><title>t</title></head>
            <body><img src="a.png" alt="ok"><img src="b.png"></body></html>"#;

        let findings = evaluate_markup(markup, RuleSelection::wcag21_aa());
        let image_alt = findings.violations.iter().find(|r| r.id == "image-alt").unwrap();
        assert_eq!(image_alt.nodes.len(), 1);
        assert_eq!(image_alt.impact.as_deref(), Some("critical"));
        assert!(image_alt.nodes[0].html.contains("b.png"));
        assert!(image_alt.nodes[0].failure_summary.is_some());
        assert!(!findings.passes.iter().any(|r| r.id == "image-alt"));
    }

    /// Fails every element carrying tabindex; tagged best-practice only
    struct PositiveTabindex;

    impl Rule for PositiveTabindex {
        fn id(&self) -> &'static str {
            "tabindex"
        }

        fn impact(&self) -> Impact {
            Impact::Serious
        }

        fn description(&self) -> &'static str {
            "Ensures tabindex attribute values are not greater than 0"
        }

        fn help(&self) -> &'static str {
            "Elements should not have tabindex greater than zero"
        }

        fn help_url(&self) -> &'static str {
            "https://www.w3.org/WAI/WCAG21/Understanding/focus-order.html"
        }

        fn tags(&self) -> &'static [&'static str] {
            &["cat.keyboard", "best-practice"]
        }

        fn evaluate(&self, document: &Html) -> Vec<NodeCheck> {
            let sel = Selector::parse("[tabindex]").unwrap();
            document
                .select(&sel)
                .map(|el| NodeCheck::fail(el, "tabindex is greater than 0"))
                .collect()
        }
    }

    #[test]
    fn test_rules_outside_selection_are_skipped() {
        let markup = r#"<html lang="en"><head><title>t</title></head>
            <body><div tabindex="5">x</div></body></html>"#;
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(PositiveTabindex),
            Box::new(text_alternatives::DocumentTitle),
        ];

        let findings = evaluate_rules(&rules, markup, RuleSelection::wcag21_aa());
        assert!(findings.violations.is_empty(), "{:?}", findings.violations);
        let ids: Vec<&str> = findings.passes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["document-title"]);
    }

    #[test]
    fn test_catalogue_is_inside_selection() {
        let selection = RuleSelection::wcag21_aa();
        for rule in catalogue() {
            assert!(selection.matches(rule.tags()), "{} is never evaluated", rule.id());
        }
    }

    #[tokio::test]
    async fn test_engine_evaluates_rendered_document() {
        let document = RenderedDocument::inline("<p>No title, no lang</p>").unwrap();
        let findings = StaticRuleEngine::new()
            .evaluate(&document, RuleSelection::wcag21_aa())
            .await
            .unwrap();

        let ids: Vec<&str> = findings.violations.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.contains(&"html-has-lang"));
        assert!(ids.contains(&"document-title"));
    }
}
