// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast - WCAG 1.4.3 Contrast (Minimum), Level AA
//!
//! Only inline styles are visible here. The foreground comes from the
//! nearest `color` declaration and the background from the nearest
//! `background`/`background-color` declaration, walking up from the text
//! element. When only one side is known the node is reported as
//! needing review rather than guessed.
//! - AA: 4.5:1 for normal text, 3:1 for large text

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use super::{NodeCheck, Rule};
use crate::engine::Impact;

const NORMAL_TEXT_MINIMUM: f64 = 4.5;
const LARGE_TEXT_MINIMUM: f64 = 3.0;

pub type Rgb = (u8, u8, u8);

static FONT_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)font-size\s*:\s*([\d.]+)\s*(px|pt)").expect("valid regex")
});

static FONT_WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)font-weight\s*:\s*(bold|bolder|[6-9]00)").expect("valid regex")
});

static RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*([\d.]+)\s*)?\)$")
        .expect("valid regex")
});

/// Text must meet the AA contrast ratio against its background
pub struct ColorContrast;

impl Rule for ColorContrast {
    fn id(&self) -> &'static str {
        "color-contrast"
    }

    fn impact(&self) -> Impact {
        Impact::Serious
    }

    fn description(&self) -> &'static str {
        "Ensures the contrast between foreground and background colors meets WCAG 2 AA minimum contrast ratio thresholds"
    }

    fn help(&self) -> &'static str {
        "Elements must meet minimum color contrast ratio thresholds"
    }

    fn help_url(&self) -> &'static str {
        "https://www.w3.org/WAI/WCAG21/Understanding/contrast-minimum.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["cat.color", "wcag2aa", "wcag143"]
    }

    fn evaluate(&self, document: &Html) -> Vec<NodeCheck> {
        let styled_sel = Selector::parse("[style]").expect("valid selector");

        document
            .select(&styled_sel)
            .filter(|el| has_own_text(*el))
            .filter(|el| {
                let style = el.value().attr("style").unwrap_or("");
                declaration(style, Property::Color).is_some()
                    || declaration(style, Property::Background).is_some()
            })
            .map(|el| {
                let fg = inherited(el, Property::Color);
                let bg = inherited(el, Property::Background);

                match (fg, bg) {
                    (Some(fg), Some(bg)) => {
                        let ratio = contrast_ratio(fg, bg);
                        let required = if is_large_text(el) {
                            LARGE_TEXT_MINIMUM
                        } else {
                            NORMAL_TEXT_MINIMUM
                        };

                        if ratio < required {
                            NodeCheck::fail(
                                el,
                                format!(
                                    "Element has insufficient color contrast of {:.2} (foreground color: {}, background color: {}, expected contrast ratio of {}:1)",
                                    ratio,
                                    to_hex(fg),
                                    to_hex(bg),
                                    required
                                ),
                            )
                        } else {
                            NodeCheck::pass(el)
                        }
                    }
                    (Some(_), None) => NodeCheck::cant_tell(
                        el,
                        "Element's background color could not be determined",
                    ),
                    _ => NodeCheck::cant_tell(
                        el,
                        "Element's foreground color could not be determined",
                    ),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum Property {
    Color,
    Background,
}

/// Raw value of the last matching declaration in an inline style
fn declaration(style: &str, property: Property) -> Option<String> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(name, _)| {
            let name = name.trim().to_ascii_lowercase();
            match property {
                Property::Color => name == "color",
                Property::Background => name == "background-color" || name == "background",
            }
        })
        .map(|(_, value)| value.trim().trim_end_matches("!important").trim().to_string())
        .last()
}

/// Nearest declared color for `property`, self first
///
/// A declaration that does not parse (a gradient, a variable, `inherit`)
/// makes the color unknown rather than skipping to an ancestor.
fn inherited(element: ElementRef<'_>, property: Property) -> Option<Rgb> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find_map(|el| declaration(el.value().attr("style")?, property))
        .and_then(|value| parse_color(&value))
}

fn has_own_text(element: ElementRef<'_>) -> bool {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .any(|text| !text.trim().is_empty())
}

/// 24px, or 18.66px when bold (14pt bold)
fn is_large_text(element: ElementRef<'_>) -> bool {
    let style = element.value().attr("style").unwrap_or("");
    let size_px = FONT_SIZE_RE.captures(style).and_then(|c| {
        let value: f64 = c[1].parse().ok()?;
        Some(if c[2].eq_ignore_ascii_case("pt") { value * 4.0 / 3.0 } else { value })
    });
    let bold = FONT_WEIGHT_RE.is_match(style)
        || matches!(element.value().name(), "b" | "strong" | "h1" | "h2" | "h3");

    match size_px {
        Some(px) => px >= 24.0 || (bold && px >= 18.66),
        None => false,
    }
}

fn to_hex((r, g, b): Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Parse a CSS hex color (#rgb, #rrggbb) into (r, g, b) components
pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some((r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Parse an rgb() or rgba() color; translucent colors are not decidable
pub fn parse_rgb_color(value: &str) -> Option<Rgb> {
    let caps = RGB_RE.captures(value)?;
    if let Some(alpha) = caps.get(4) {
        let alpha: f64 = alpha.as_str().parse().ok()?;
        if alpha < 1.0 {
            return None;
        }
    }
    let r: u8 = caps[1].parse().ok()?;
    let g: u8 = caps[2].parse().ok()?;
    let b: u8 = caps[3].parse().ok()?;
    Some((r, g, b))
}

/// Parse any CSS color value into (r, g, b)
pub fn parse_color(value: &str) -> Option<Rgb> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.starts_with('#') {
        parse_hex_color(&trimmed)
    } else if trimmed.starts_with("rgb") {
        parse_rgb_color(&trimmed)
    } else {
        parse_named_color(&trimmed)
    }
}

/// Parse a named CSS color
pub fn parse_named_color(name: &str) -> Option<Rgb> {
    match name {
        "white" => Some((255, 255, 255)),
        "black" => Some((0, 0, 0)),
        "red" => Some((255, 0, 0)),
        "green" => Some((0, 128, 0)),
        "blue" => Some((0, 0, 255)),
        "yellow" => Some((255, 255, 0)),
        "gray" | "grey" => Some((128, 128, 128)),
        "darkgray" | "darkgrey" => Some((169, 169, 169)),
        "lightgray" | "lightgrey" => Some((211, 211, 211)),
        "silver" => Some((192, 192, 192)),
        "maroon" => Some((128, 0, 0)),
        "olive" => Some((128, 128, 0)),
        "lime" => Some((0, 255, 0)),
        "aqua" | "cyan" => Some((0, 255, 255)),
        "teal" => Some((0, 128, 128)),
        "navy" => Some((0, 0, 128)),
        "fuchsia" | "magenta" => Some((255, 0, 255)),
        "purple" => Some((128, 0, 128)),
        "orange" => Some((255, 165, 0)),
        _ => None,
    }
}

/// Relative luminance per WCAG 2.x
/// <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>
pub fn relative_luminance((r, g, b): Rgb) -> f64 {
    let srgb = [r, g, b].map(|c| {
        let v = c as f64 / 255.0;
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    });
    0.2126 * srgb[0] + 0.7152 * srgb[1] + 0.0722 * srgb[2]
}

/// Contrast ratio between two colors, always >= 1.0
pub fn contrast_ratio(fg: Rgb, bg: Rgb) -> f64 {
    let l1 = relative_luminance(fg);
    let l2 = relative_luminance(bg);
    let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}
