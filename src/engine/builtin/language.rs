// SPDX-License-Identifier: PMPL-1.0-or-later
//! Language of page - WCAG 3.1.1 (Level A)

use scraper::Html;

use super::{NodeCheck, Rule};
use crate::engine::Impact;

/// The <html> element must declare a language
pub struct HtmlHasLang;

impl Rule for HtmlHasLang {
    fn id(&self) -> &'static str {
        "html-has-lang"
    }

    fn impact(&self) -> Impact {
        Impact::Serious
    }

    fn description(&self) -> &'static str {
        "Ensures every HTML document has a lang attribute"
    }

    fn help(&self) -> &'static str {
        "<html> element must have a lang attribute"
    }

    fn help_url(&self) -> &'static str {
        "https://www.w3.org/WAI/WCAG21/Understanding/language-of-page.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["cat.language", "wcag2a", "wcag311"]
    }

    fn evaluate(&self, document: &Html) -> Vec<NodeCheck> {
        let root = document.root_element();
        let lang = root
            .value()
            .attr("lang")
            .or_else(|| root.value().attr("xml:lang"))
            .map(str::trim)
            .unwrap_or("");

        let check = if lang.is_empty() {
            NodeCheck::fail(root, "The <html> element does not have a lang attribute")
        } else if !is_plausible_lang(lang) {
            NodeCheck::fail(root, format!("Value of lang attribute \"{}\" is not a language tag", lang))
        } else {
            NodeCheck::pass(root)
        };

        vec![check]
    }
}

/// Primary subtag of 2-3 letters, then optional alphanumeric subtags
fn is_plausible_lang(lang: &str) -> bool {
    let mut parts = lang.split('-');
    let primary_ok = parts
        .next()
        .map_or(false, |p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic()));
    primary_ok && parts.all(|p| !p.is_empty() && p.len() <= 8 && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::builtin::Outcome;

    fn outcome(markup: &str) -> Outcome {
        let document = Html::parse_document(markup);
        HtmlHasLang.evaluate(&document).remove(0).outcome
    }

    #[test]
    fn test_lang_present() {
        assert_eq!(outcome(r#"<html lang="en"><body></body></html>"#), Outcome::Pass);
        assert_eq!(outcome(r#"<html lang="pt-BR"></html>"#), Outcome::Pass);
    }

    #[test]
    fn test_lang_missing_or_bogus() {
        assert!(matches!(outcome("<html><body></body></html>"), Outcome::Fail(_)));
        assert!(matches!(outcome(r#"<html lang=""></html>"#), Outcome::Fail(_)));
        assert!(matches!(outcome(r#"<html lang="english!"></html>"#), Outcome::Fail(_)));
    }

    #[test]
    fn test_fragment_is_wrapped_in_html_root() {
        assert!(matches!(outcome("<p>hello</p>"), Outcome::Fail(_)));
    }
}
