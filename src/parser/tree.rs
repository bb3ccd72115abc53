//! Absolute element paths (`/html/body/div[3]/td`) compiled to CSS selectors.
//!
//! `tag[n]` is the n-th `tag` child of its parent (`:nth-of-type(n)`); a bare
//! `tag` matches every `tag` child.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

static STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z][a-z0-9]*)(?:\[([1-9]\d*)\])?$").unwrap());

/// One `/tag` or `/tag[n]` segment of an absolute element path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub tag: String,
    /// 1-based position among same-tag siblings; `None` selects all of them.
    pub position: Option<usize>,
}

/// Parse `/html/body/div[3]/td` into steps. `None` if any segment is malformed.
pub fn parse_path(path: &str) -> Option<Vec<Step>> {
    let rest = path.strip_prefix('/')?;
    rest.split('/')
        .map(|seg| {
            let caps = STEP_RE.captures(seg)?;
            let position = match caps.get(2) {
                Some(m) => Some(m.as_str().parse().ok()?),
                None => None,
            };
            Some(Step {
                tag: caps[1].to_string(),
                position,
            })
        })
        .collect()
}

/// Child-combinator selector text for a path, anchored at the document root.
/// `None` for a malformed path or a root step with a position other than 1.
pub fn css_for(path: &str) -> Option<String> {
    let steps = parse_path(path)?;
    let (root, rest) = steps.split_first()?;
    if root.position.is_some_and(|p| p != 1) {
        return None;
    }

    let mut css = format!("{}:root", root.tag);
    for step in rest {
        css.push_str(" > ");
        css.push_str(&step.tag);
        if let Some(p) = step.position {
            css.push_str(&format!(":nth-of-type({})", p));
        }
    }
    Some(css)
}

pub fn compile(path: &str) -> Option<Selector> {
    let css = css_for(path)?;
    Selector::parse(&css).ok()
}

/// Evaluate an absolute element path, returning matches in document order.
pub fn select<'a>(doc: &'a Html, path: &str) -> Vec<ElementRef<'a>> {
    match compile(path) {
        Some(selector) => doc.select(&selector).collect(),
        None => {
            debug!("Unusable layout path {}", path);
            Vec::new()
        }
    }
}

/// Concatenated descendant text with surrounding whitespace trimmed.
pub fn node_text(node: &ElementRef) -> String {
    node.text().collect::<String>().trim().to_string()
}

// ── Tests ──
