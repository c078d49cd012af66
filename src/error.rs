//! Error types for docsift library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docsift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building, analyzing or serializing pages.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The analyzer expects a directory of page images.
    #[error("Expected a directory of page images, got {0}")]
    NotADirectory(PathBuf),

    /// The file format is not recognized as a page image.
    #[error("Unknown file format: not a supported image")]
    UnknownFormat,

    /// The file format is recognized but cannot be processed.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Error decoding pixel data.
    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    /// Error reading or writing JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error decoding embedded base64 image data.
    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Error parsing an annotation file.
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// Bounding box coordinates are not ordered or not finite.
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    /// An annotation id does not exist in the datapoint.
    #[error("Annotation not found: {0}")]
    AnnotationNotFound(String),

    /// Pixel data is required but has not been loaded.
    #[error("Image data not loaded for {0}")]
    MissingImage(String),

    /// A model backend failed.
    #[error("Model backend error: {0}")]
    Backend(String),

    /// A pipeline component failed while serving a datapoint.
    #[error("Pipeline component '{component}' failed: {message}")]
    Pipeline {
        /// Component name
        component: String,
        /// Failure description
        message: String,
    },

    /// No dataset with this name is registered.
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// The dataset has no such split.
    #[error("Unknown split '{0}'")]
    UnknownSplit(String),

    /// Malformed page selection string.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error raised inside a pipeline component.
    pub fn pipeline(component: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Error::Pipeline {
            component: component.into(),
            message: err.to_string(),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            image::ImageError::Unsupported(e) => Error::UnsupportedFormat(e.to_string()),
            _ => Error::ImageDecode(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
