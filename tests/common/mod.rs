#![allow(dead_code)]

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use label_improver::browser::error::BrowserError;
use label_improver::browser::page::{ElementBounds, PageDriver, PageElement};

// =========================================================================
// In-memory page
// =========================================================================

/// A page that answers from fixed data instead of a browser.
pub struct FakePage {
    pub title: String,
    pub elements: Vec<PageElement>,
    pub screenshot: Vec<u8>,
    pub fail_navigation: Option<String>,
    pub navigated_to: Vec<String>,
}

impl FakePage {
    pub fn new(title: &str, elements: Vec<PageElement>) -> Self {
        Self {
            title: title.to_string(),
            elements,
            screenshot: white_png(300, 200),
            fail_navigation: None,
            navigated_to: Vec::new(),
        }
    }

    pub fn unreachable(error: &str) -> Self {
        let mut page = Self::new("", Vec::new());
        page.fail_navigation = Some(error.to_string());
        page
    }
}

impl PageDriver for FakePage {
    fn navigate(&mut self, url: &str, _settle_ms: u64) -> Result<(), BrowserError> {
        if let Some(error) = &self.fail_navigation {
            return Err(BrowserError::SessionProtocol {
                command: "navigate".into(),
                error: error.clone(),
            });
        }
        self.navigated_to.push(url.to_string());
        Ok(())
    }

    fn title(&mut self) -> Result<String, BrowserError> {
        Ok(self.title.clone())
    }

    fn interactive_elements(&mut self) -> Result<Vec<PageElement>, BrowserError> {
        Ok(self.elements.clone())
    }

    fn screenshot(&mut self) -> Result<Vec<u8>, BrowserError> {
        Ok(self.screenshot.clone())
    }
}

// =========================================================================
// Builders
// =========================================================================

pub fn white_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn bounds(x: f64, y: f64, width: f64, height: f64) -> ElementBounds {
    ElementBounds { x, y, width, height }
}

pub fn button(text: &str, selector: &str, at: ElementBounds) -> PageElement {
    PageElement {
        tag: "button".into(),
        text: (!text.is_empty()).then(|| text.to_string()),
        selector: selector.into(),
        bounds: at,
        visible: true,
        ..Default::default()
    }
}

pub fn link(text: &str, selector: &str, at: ElementBounds) -> PageElement {
    PageElement {
        tag: "a".into(),
        text: Some(text.to_string()),
        selector: selector.into(),
        bounds: at,
        visible: true,
        ..Default::default()
    }
}

/// Three buttons labelled "Submit", "" and "X".
pub fn dialog_page() -> FakePage {
    FakePage::new(
        "Dialog Demo",
        vec![
            button("Submit", "#submit", bounds(10.0, 40.0, 100.0, 30.0)),
            button("", "div.modal > button:nth-of-type(1)", bounds(200.0, 5.0, 24.0, 24.0)),
            button("X", "div.modal > button:nth-of-type(2)", bounds(240.0, 5.0, 24.0, 24.0)),
        ],
    )
}

pub const CLOSE_DIALOG_RESPONSE: &str = r#"[{"index":1,"suggestedLabel":"Close dialog","reason":"icon-only button lacks text","confidence":0.9}]"#;
