use thiserror::Error;

use crate::browser::error::BrowserError;

/// A scan that produced no usable page state. Fatal to the run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to load {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("page automation failed: {0}")]
    Driver(#[from] BrowserError),

    #[error("failed to annotate screenshot: {0}")]
    Annotate(#[from] image::ImageError),
}
