// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessible names for buttons and links - WCAG 4.1.2, 2.4.4

use scraper::{Html, Selector};

use super::{accessible_name, is_hidden, non_empty_attr, NodeCheck, Rule};
use crate::engine::Impact;

/// Buttons must have discernible text
pub struct ButtonName;

impl Rule for ButtonName {
    fn id(&self) -> &'static str {
        "button-name"
    }

    fn impact(&self) -> Impact {
        Impact::Critical
    }

    fn description(&self) -> &'static str {
        "Ensures buttons have discernible text"
    }

    fn help(&self) -> &'static str {
        "Buttons must have discernible text"
    }

    fn help_url(&self) -> &'static str {
        "https://www.w3.org/WAI/WCAG21/Understanding/name-role-value.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["cat.name-role-value", "wcag2a", "wcag412", "section508"]
    }

    fn evaluate(&self, document: &Html) -> Vec<NodeCheck> {
        let button_sel = Selector::parse(
            r#"button, input[type="button"], input[type="submit"], input[type="reset"]"#,
        )
        .expect("valid selector");

        document
            .select(&button_sel)
            .filter(|b| !is_hidden(*b))
            .map(|button| {
                let named = if button.value().name() == "input" {
                    // submit and reset inputs get a default label from the browser
                    let input_type = button.value().attr("type").unwrap_or("").to_ascii_lowercase();
                    non_empty_attr(button, "value").is_some()
                        || non_empty_attr(button, "aria-label").is_some()
                        || non_empty_attr(button, "title").is_some()
                        || input_type == "submit"
                        || input_type == "reset"
                } else {
                    !accessible_name(document, button).is_empty()
                };

                if named {
                    NodeCheck::pass(button)
                } else {
                    NodeCheck::fail(
                        button,
                        "Element does not have inner text, aria-label, aria-labelledby or title",
                    )
                }
            })
            .collect()
    }
}

/// Links must have discernible text
pub struct LinkName;

impl Rule for LinkName {
    fn id(&self) -> &'static str {
        "link-name"
    }

    fn impact(&self) -> Impact {
        Impact::Serious
    }

    fn description(&self) -> &'static str {
        "Ensures links have discernible text"
    }

    fn help(&self) -> &'static str {
        "Links must have discernible text"
    }

    fn help_url(&self) -> &'static str {
        "https://www.w3.org/WAI/WCAG21/Understanding/link-purpose-in-context.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["cat.name-role-value", "wcag2a", "wcag412", "wcag244", "section508"]
    }

    fn evaluate(&self, document: &Html) -> Vec<NodeCheck> {
        let link_sel = Selector::parse("a[href]").expect("valid selector");

        document
            .select(&link_sel)
            .filter(|a| !is_hidden(*a))
            .map(|link| {
                if accessible_name(document, link).is_empty() {
                    NodeCheck::fail(
                        link,
                        "Element does not have text that is visible to screen readers",
                    )
                } else {
                    NodeCheck::pass(link)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::builtin::Outcome;

    fn outcomes(rule: &dyn Rule, markup: &str) -> Vec<Outcome> {
        let document = Html::parse_document(markup);
        rule.evaluate(&document).into_iter().map(|c| c.outcome).collect()
    }

    #[test]
    fn test_button_names() {
        let results = outcomes(
            &ButtonName,
            r#"<button>Save</button>
               <button aria-label="Close"><svg></svg></button>
               <input type="submit">
               <input type="button">
               <button><i class="icon-trash"></i></button>"#,
        );
        assert_eq!(results.len(), 5);
        assert!(results[..3].iter().all(|o| *o == Outcome::Pass));
        assert!(matches!(results[3], Outcome::Fail(_)));
        assert!(matches!(results[4], Outcome::Fail(_)));
    }

    #[test]
    fn test_link_names() {
        let results = outcomes(
            &LinkName,
            r#"<a href="/about">About us</a>
               <a href="/"><img src="logo.png" alt="Home"></a>
               <a href="/cart"><span class="icon"></span></a>
               <a name="anchor"></a>"#,
        );
        assert_eq!(results, vec![Outcome::Pass, Outcome::Pass, results[2].clone()]);
        assert!(matches!(results[2], Outcome::Fail(_)));
    }

    #[test]
    fn test_hidden_links_are_not_checked() {
        assert!(outcomes(&LinkName, r#"<nav aria-hidden="true"><a href="/"></a></nav>"#).is_empty());
    }
}
