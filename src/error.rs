//! Error types for the DD1750 renderer.
//!
//! Template errors are fatal: the template is a fixed resource and a retry
//! would reproduce the same failure. Item errors come from the request input
//! layer only; the renderer itself assumes well-typed items.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Template file does not exist at the configured path.
    #[error("template not found: '{path}'")]
    TemplateNotFound { path: PathBuf },

    /// Template was read but cannot be used (corrupt, encrypted, no pages).
    #[error("invalid template: {detail}")]
    InvalidTemplate { detail: String },

    /// Raster template could not be decoded.
    #[error("failed to decode template image: {0}")]
    TemplateImage(#[from] image::ImageError),

    /// Structural failure while merging an overlay or assembling pages.
    #[error("PDF structure error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// The assembled document could not be serialized.
    #[error("failed to serialize PDF: {detail}")]
    Serialize { detail: String },

    /// A request item carried a field that cannot be coerced.
    #[error("item {index}: invalid {field} value {value}")]
    InvalidItem {
        index: usize,
        field: &'static str,
        value: String,
    },

    /// Request JSON is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
