// SPDX-License-Identifier: PMPL-1.0-or-later
//! Text alternatives: image alt text, document title, frame titles

use scraper::{Html, Selector};

use super::{accessible_name, non_empty_attr, labelledby_text, NodeCheck, Rule};
use crate::engine::Impact;

/// Images must have alternative text (WCAG 1.1.1)
pub struct ImageAlt;

impl Rule for ImageAlt {
    fn id(&self) -> &'static str {
        "image-alt"
    }

    fn impact(&self) -> Impact {
        Impact::Critical
    }

    fn description(&self) -> &'static str {
        "Ensures <img> elements have alternate text or a role of none or presentation"
    }

    fn help(&self) -> &'static str {
        "Images must have alternate text"
    }

    fn help_url(&self) -> &'static str {
        "https://www.w3.org/WAI/WCAG21/Understanding/non-text-content.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["cat.text-alternatives", "wcag2a", "wcag111", "section508"]
    }

    fn evaluate(&self, document: &Html) -> Vec<NodeCheck> {
        let img_sel = Selector::parse("img").expect("valid selector");

        document
            .select(&img_sel)
            .map(|img| {
                let presentational = matches!(
                    img.value().attr("role"),
                    Some("presentation") | Some("none")
                );
                // alt="" marks a decorative image and is valid
                let has_alt = img.value().attr("alt").is_some();
                let has_name = non_empty_attr(img, "aria-label").is_some()
                    || !labelledby_text(document, img).is_empty()
                    || non_empty_attr(img, "title").is_some();

                if presentational || has_alt || has_name {
                    NodeCheck::pass(img)
                } else {
                    NodeCheck::fail(
                        img,
                        "Element does not have an alt attribute, aria-label, aria-labelledby or title",
                    )
                }
            })
            .collect()
    }
}

/// Documents must have a non-empty <title> (WCAG 2.4.2)
pub struct DocumentTitle;

impl Rule for DocumentTitle {
    fn id(&self) -> &'static str {
        "document-title"
    }

    fn impact(&self) -> Impact {
        Impact::Serious
    }

    fn description(&self) -> &'static str {
        "Ensures each HTML document contains a non-empty <title> element"
    }

    fn help(&self) -> &'static str {
        "Documents must have <title> element to aid in navigation"
    }

    fn help_url(&self) -> &'static str {
        "https://www.w3.org/WAI/WCAG21/Understanding/page-titled.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["cat.text-alternatives", "wcag2a", "wcag242"]
    }

    fn evaluate(&self, document: &Html) -> Vec<NodeCheck> {
        let title_sel = Selector::parse("title").expect("valid selector");
        let root = document.root_element();

        let has_title = document
            .select(&title_sel)
            .any(|t| !t.text().collect::<String>().trim().is_empty());

        if has_title {
            vec![NodeCheck::pass(root)]
        } else {
            vec![NodeCheck::fail(
                root,
                "Document does not have a non-empty <title> element",
            )]
        }
    }
}

/// Frames must have an accessible name (WCAG 4.1.2)
pub struct FrameTitle;

impl Rule for FrameTitle {
    fn id(&self) -> &'static str {
        "frame-title"
    }

    fn impact(&self) -> Impact {
        Impact::Serious
    }

    fn description(&self) -> &'static str {
        "Ensures <iframe> and <frame> elements have an accessible name"
    }

    fn help(&self) -> &'static str {
        "Frames must have an accessible name"
    }

    fn help_url(&self) -> &'static str {
        "https://www.w3.org/WAI/WCAG21/Understanding/name-role-value.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["cat.text-alternatives", "wcag2a", "wcag412", "section508"]
    }

    fn evaluate(&self, document: &Html) -> Vec<NodeCheck> {
        let frame_sel = Selector::parse("iframe, frame").expect("valid selector");

        document
            .select(&frame_sel)
            .map(|frame| {
                if accessible_name(document, frame).is_empty() {
                    NodeCheck::fail(frame, "Element has no title attribute or aria-label")
                } else {
                    NodeCheck::pass(frame)
                }
            })
            .collect()
    }
}
