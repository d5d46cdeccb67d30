// SPDX-License-Identifier: PMPL-1.0-or-later
//! ARIA role validity - WCAG 4.1.2 Name, Role, Value (Level A)

use scraper::{Html, Selector};

use super::{NodeCheck, Rule};
use crate::engine::Impact;

/// Concrete (non-abstract) roles from WAI-ARIA 1.2
const VALID_ROLES: &[&str] = &[
    "alert", "alertdialog", "application", "article", "banner", "blockquote", "button",
    "caption", "cell", "checkbox", "code", "columnheader", "combobox", "complementary",
    "contentinfo", "definition", "deletion", "dialog", "directory", "document", "emphasis",
    "feed", "figure", "form", "generic", "grid", "gridcell", "group", "heading", "img",
    "insertion", "link", "list", "listbox", "listitem", "log", "main", "marquee", "math",
    "menu", "menubar", "menuitem", "menuitemcheckbox", "menuitemradio", "meter",
    "navigation", "none", "note", "option", "paragraph", "presentation", "progressbar",
    "radio", "radiogroup", "region", "row", "rowgroup", "rowheader", "scrollbar", "search",
    "searchbox", "separator", "slider", "spinbutton", "status", "strong", "subscript",
    "superscript", "switch", "tab", "table", "tablist", "tabpanel", "term", "textbox",
    "time", "timer", "toolbar", "tooltip", "tree", "treegrid", "treeitem",
];

/// role attributes must name valid ARIA roles
pub struct AriaRoles;

impl Rule for AriaRoles {
    fn id(&self) -> &'static str {
        "aria-roles"
    }

    fn impact(&self) -> Impact {
        Impact::Critical
    }

    fn description(&self) -> &'static str {
        "Ensures all elements with a role attribute use a valid value"
    }

    fn help(&self) -> &'static str {
        "ARIA roles used must conform to valid values"
    }

    fn help_url(&self) -> &'static str {
        "https://www.w3.org/WAI/WCAG21/Understanding/name-role-value.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["cat.aria", "wcag2a", "wcag412"]
    }

    fn evaluate(&self, document: &Html) -> Vec<NodeCheck> {
        let role_sel = Selector::parse("[role]").expect("valid selector");

        document
            .select(&role_sel)
            .filter_map(|el| {
                let role = el.value().attr("role")?.trim().to_ascii_lowercase();
                if role.is_empty() {
                    return None;
                }

                let invalid: Vec<&str> = role
                    .split_whitespace()
                    .filter(|r| !VALID_ROLES.contains(r))
                    .collect();

                Some(if invalid.is_empty() {
                    NodeCheck::pass(el)
                } else {
                    NodeCheck::fail(
                        el,
                        format!("Role {} is not a valid ARIA role", invalid.join(", ")),
                    )
                })
            })
            .collect()
    }
}
