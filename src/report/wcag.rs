// SPDX-License-Identifier: PMPL-1.0-or-later
//! Tag interpretation: WCAG references, levels, user groups, categories

use serde::{Deserialize, Serialize};

/// Reference used when no tag mentions WCAG
pub const NO_WCAG_REFERENCE: &str = "N/A";

/// Level used when no tag carries one
pub const DEFAULT_WCAG_LEVEL: &str = "A";

/// Group reported when no category tag matches
pub const ALL_USERS: &str = "All users";

/// Category tags in canonical order with the users they affect
const AFFECTED_GROUPS: &[(&str, &str)] = &[
    ("keyboard", "Keyboard-only users"),
    ("images", "Screen reader users"),
    ("color", "Users with low vision or color blindness"),
    ("forms", "Users of assistive technology filling in forms"),
];

/// Category name with the optional `cat.` prefix removed and aliases resolved
fn category_key(tag: &str) -> &str {
    match tag.strip_prefix("cat.").unwrap_or(tag) {
        "text-alternatives" => "images",
        other => other,
    }
}

/// First tag containing "wcag", with that first occurrence removed
pub fn wcag_reference(tags: &[String]) -> String {
    tags.iter()
        .find(|t| t.contains("wcag"))
        .map(|t| t.replacen("wcag", "", 1))
        .unwrap_or_else(|| NO_WCAG_REFERENCE.to_string())
}

/// First tag containing both "wcag" and "level", with both removed
pub fn wcag_level(tags: &[String]) -> String {
    tags.iter()
        .find(|t| t.contains("wcag") && t.contains("level"))
        .map(|t| t.replacen("wcag", "", 1).replacen("level", "", 1))
        .unwrap_or_else(|| DEFAULT_WCAG_LEVEL.to_string())
}

/// User groups affected by a rule, canonical order, never empty
pub fn affected_users(tags: &[String]) -> Vec<String> {
    let keys: Vec<&str> = tags.iter().map(|t| category_key(t)).collect();

    let groups: Vec<String> = AFFECTED_GROUPS
        .iter()
        .filter(|(key, _)| keys.contains(key))
        .map(|(_, group)| group.to_string())
        .collect();

    if groups.is_empty() {
        vec![ALL_USERS.to_string()]
    } else {
        groups
    }
}

/// Issue category used by the distribution chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Visual,
    Navigation,
    Forms,
    #[serde(rename = "ARIA")]
    Aria,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Visual,
        Category::Navigation,
        Category::Forms,
        Category::Aria,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Visual => "Visual",
            Category::Navigation => "Navigation",
            Category::Forms => "Forms",
            Category::Aria => "ARIA",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::Visual => "#3b82f6",
            Category::Navigation => "#10b981",
            Category::Forms => "#f59e0b",
            Category::Aria => "#8b5cf6",
        }
    }

    /// Category of the first tag that names one; Visual otherwise
    pub fn from_tags(tags: &[String]) -> Self {
        tags.iter()
            .find_map(|tag| match category_key(tag) {
                "color" | "images" => Some(Category::Visual),
                "keyboard" | "navigation" => Some(Category::Navigation),
                "forms" => Some(Category::Forms),
                "aria" => Some(Category::Aria),
                _ => None,
            })
            .unwrap_or(Category::Visual)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
