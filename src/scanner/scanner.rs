use std::io::Cursor;

use image::{ImageError, ImageReader};
use tracing::{debug, info};
use url::Url;

use crate::browser::page::{PageDriver, PageElement};
use crate::scanner::action_model::{Action, ActionKind};
use crate::scanner::annotate::annotate_screenshot;
use crate::scanner::error::ScanError;

/// Labels longer than this are cut before they reach the prompt.
pub const MAX_LABEL_CHARS: usize = 120;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Extra wait after the load event, for client-rendered content.
    pub settle_ms: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { settle_ms: 1000 }
    }
}

/// Everything captured from one render of the page.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub actions: Vec<Action>,
    pub raw_screenshot: Vec<u8>,
    pub annotated_screenshot: Vec<u8>,
    pub page_title: String,
}

// ============================================================================
// Scan
// ============================================================================

/// Load `url`, enumerate its interactive elements and capture both screenshots.
///
/// A page without interactive elements is a valid scan: `actions` is empty and
/// the annotated screenshot carries no markers.
pub fn scan(driver: &mut dyn PageDriver, url: &str, options: &ScanOptions) -> Result<ScanOutput, ScanError> {
    validate_url(url)?;

    driver
        .navigate(url, options.settle_ms)
        .map_err(|source| ScanError::Navigation {
            url: url.to_string(),
            source,
        })?;

    let page_title = driver.title()?;
    let elements = driver.interactive_elements()?;
    let raw_screenshot = driver.screenshot()?;
    let page_size = capture_size(&raw_screenshot)?;

    let actions = build_actions(&elements, page_size);
    debug!(
        candidates = elements.len(),
        kept = actions.len(),
        width = page_size.0,
        height = page_size.1,
        "filtered interactive elements"
    );

    let annotated_screenshot = annotate_screenshot(&raw_screenshot, &actions)?;

    info!(url, actions = actions.len(), title = %page_title, "scan complete");

    Ok(ScanOutput {
        actions,
        raw_screenshot,
        annotated_screenshot,
        page_title,
    })
}

fn validate_url(url: &str) -> Result<(), ScanError> {
    let parsed = Url::parse(url).map_err(|e| ScanError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" | "file" => Ok(()),
        other => Err(ScanError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Pixel dimensions of the capture, read from the PNG header.
fn capture_size(png: &[u8]) -> Result<(u32, u32), ScanError> {
    let reader = ImageReader::new(Cursor::new(png))
        .with_guessed_format()
        .map_err(ImageError::IoError)?;
    Ok(reader.into_dimensions()?)
}

// ============================================================================
// Element -> Action
// ============================================================================

/// Keep visible elements whose non-empty box lies at least partly on the
/// `(width, height)` capture, and number them in the order the page reported
/// them. Off-page elements such as parked skip links get no index.
pub fn build_actions(elements: &[PageElement], page_size: (u32, u32)) -> Vec<Action> {
    let (width, height) = page_size;
    elements
        .iter()
        .filter(|el| el.visible && el.bounds.has_area() && el.bounds.intersects_page(width, height))
        .enumerate()
        .map(|(index, el)| Action {
            index,
            id: stable_id(el),
            kind: classify_kind(el),
            selector: el.selector.clone(),
            label: resolve_label(el),
            bounds: el.bounds,
        })
        .collect()
}

/// Classify an element. An explicit ARIA role wins over the tag.
pub fn classify_kind(el: &PageElement) -> ActionKind {
    if let Some(role) = el.role.as_deref() {
        match role.trim().to_lowercase().as_str() {
            "link" => return ActionKind::Link,
            "button" | "tab" | "menuitem" | "switch" => return ActionKind::Button,
            "checkbox" => return ActionKind::Checkbox,
            "radio" => return ActionKind::Radio,
            "textbox" | "searchbox" | "combobox" => return ActionKind::Input,
            _ => {}
        }
    }

    match el.tag.to_lowercase().as_str() {
        "a" => ActionKind::Link,
        "button" | "summary" => ActionKind::Button,
        "select" => ActionKind::Select,
        "textarea" => ActionKind::Textarea,
        "input" => match el.input_type.as_deref().map(str::to_lowercase).as_deref() {
            Some("checkbox") => ActionKind::Checkbox,
            Some("radio") => ActionKind::Radio,
            Some("button" | "submit" | "reset" | "image") => ActionKind::Button,
            _ => ActionKind::Input,
        },
        _ => ActionKind::Clickable,
    }
}

/// Best-known accessible name, following the usual precedence: explicit ARIA
/// naming, then native labelling, then content, then hints.
///
/// A `<select>`'s content is every option's text, so only its selected value
/// stands in for content.
pub fn resolve_label(el: &PageElement) -> String {
    let content = if el.tag.eq_ignore_ascii_case("select") {
        None
    } else {
        el.text.as_deref()
    };
    let candidates = [
        el.labelled_by_text.as_deref(),
        el.aria_label.as_deref(),
        el.label_text.as_deref(),
        el.alt.as_deref(),
        content,
        el.value.as_deref(),
        el.title.as_deref(),
        el.placeholder.as_deref(),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(normalize_text)
        .find(|s| !s.is_empty())
        .map(|s| truncate_chars(&s, MAX_LABEL_CHARS))
        .unwrap_or_default()
}

fn stable_id(el: &PageElement) -> Option<String> {
    [el.dom_id.as_deref(), el.test_id.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
