use serde::{Deserialize, Serialize};

use crate::browser::error::BrowserError;

/// Bounding box of an element in full-page CSS pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementBounds {
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Whether any part of the box lies on a capture of `width` x `height`.
    pub fn intersects_page(&self, width: u32, height: u32) -> bool {
        self.x + self.width > 0.0
            && self.y + self.height > 0.0
            && self.x < f64::from(width)
            && self.y < f64::from(height)
    }
}

/// One interactive element as reported by the page, in document order.
///
/// The raw naming sources are kept separate so label resolution happens on
/// the Rust side and can be tested without a browser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,
    #[serde(default)]
    pub dom_id: Option<String>,
    #[serde(default)]
    pub test_id: Option<String>,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub labelled_by_text: Option<String>,
    #[serde(default)]
    pub label_text: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    pub selector: String,
    pub bounds: ElementBounds,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// The page automation capability the scanner is built on.
///
/// `BrowserSession` implements it against a real Chromium; tests drive the
/// scanner through an in-memory page.
pub trait PageDriver {
    /// Load `url` and wait `settle_ms` after the load event for late content.
    fn navigate(&mut self, url: &str, settle_ms: u64) -> Result<(), BrowserError>;

    fn title(&mut self) -> Result<String, BrowserError>;

    /// Interactive elements in document order.
    fn interactive_elements(&mut self) -> Result<Vec<PageElement>, BrowserError>;

    /// Full-page PNG capture of the current render.
    fn screenshot(&mut self) -> Result<Vec<u8>, BrowserError>;
}
