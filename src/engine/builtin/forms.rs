// SPDX-License-Identifier: PMPL-1.0-or-later
//! Form labels - WCAG 1.3.1 Info and Relationships, 4.1.2 Name, Role, Value (Level A)

use scraper::{ElementRef, Html, Selector};

use super::{is_hidden, labelledby_text, non_empty_attr, NodeCheck, Rule};
use crate::engine::Impact;

/// Input types that do not need a visible label
const EXEMPT_INPUT_TYPES: &[&str] = &["hidden", "submit", "reset", "button", "image"];

/// Form controls must have labels
pub struct Label;

impl Rule for Label {
    fn id(&self) -> &'static str {
        "label"
    }

    fn impact(&self) -> Impact {
        Impact::Critical
    }

    fn description(&self) -> &'static str {
        "Ensures every form element has a label"
    }

    fn help(&self) -> &'static str {
        "Form elements must have labels"
    }

    fn help_url(&self) -> &'static str {
        "https://www.w3.org/WAI/WCAG21/Understanding/info-and-relationships.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["cat.forms", "wcag2a", "wcag412", "wcag131", "section508"]
    }

    fn evaluate(&self, document: &Html) -> Vec<NodeCheck> {
        let control_sel = Selector::parse("input, select, textarea").expect("valid selector");
        let label_sel = Selector::parse("label[for]").expect("valid selector");

        let label_fors: Vec<&str> = document
            .select(&label_sel)
            .filter(|l| !l.text().collect::<String>().trim().is_empty())
            .filter_map(|l| l.value().attr("for"))
            .collect();

        document
            .select(&control_sel)
            .filter(|control| {
                let input_type = control.value().attr("type").unwrap_or("text").to_ascii_lowercase();
                !(control.value().name() == "input" && EXEMPT_INPUT_TYPES.contains(&input_type.as_str()))
            })
            .filter(|control| !is_hidden(*control))
            .map(|control| {
                let explicit = control
                    .value()
                    .id()
                    .map_or(false, |id| label_fors.contains(&id));

                if explicit
                    || is_wrapped_in_label(control)
                    || non_empty_attr(control, "aria-label").is_some()
                    || !labelledby_text(document, control).is_empty()
                    || non_empty_attr(control, "title").is_some()
                {
                    NodeCheck::pass(control)
                } else if non_empty_attr(control, "placeholder").is_some() {
                    NodeCheck::fail(
                        control,
                        "Element relies on a placeholder, which is not a reliable label",
                    )
                } else {
                    NodeCheck::fail(
                        control,
                        "Form element does not have an implicit (wrapped) <label>, an explicit <label for>, aria-label or aria-labelledby",
                    )
                }
            })
            .collect()
    }
}

fn is_wrapped_in_label(control: ElementRef<'_>) -> bool {
    control
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "label")
        .map_or(false, |label| !label.text().collect::<String>().trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::builtin::Outcome;

    fn outcomes(markup: &str) -> Vec<Outcome> {
        let document = Html::parse_document(markup);
        Label.evaluate(&document).into_iter().map(|c| c.outcome).collect()
    }

    #[test]
    fn test_labelled_controls_pass() {
        let results = outcomes(
            r#"<form>
                <label for="email">Email</label><input type="email" id="email">
                <label>Name <input type="text"></label>
                <input type="search" aria-label="Search">
                <span id="qty-label">Quantity</span><input type="number" aria-labelledby="qty-label">
                <select title="Country"><option>NZ</option></select>
            </form>"#,
        );
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|o| *o == Outcome::Pass), "{:?}", results);
    }

    #[test]
    fn test_unlabelled_and_placeholder_only_fail() {
        let results = outcomes(
            r#"<input type="text" name="q"><textarea placeholder="Your message"></textarea>"#,
        );
        assert_eq!(results.len(), 2);
        match &results[1] {
            Outcome::Fail(summary) => assert!(summary.contains("placeholder")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_exempt_and_hidden_inputs_are_skipped() {
        let results = outcomes(
            r#"<input type="hidden" name="csrf"><input type="submit">
               <div hidden><input type="text"></div>"#,
        );
        assert!(results.is_empty());
    }
}
