//! Model backend abstraction layer.
//!
//! Detectors, text recognizers and token classifiers are plugged into the
//! pipeline through the traits below, isolating the concrete inference
//! runtime from the annotation logic. Implementations must be thread-safe:
//! the analyzer shares them between worker threads.

mod token_class;

pub use token_class::{TokenClassCategories, OUTSIDE_LABEL, OUTSIDE_SEMANTIC};

use crate::datapoint::{BoundingBox, CategoryName};
use crate::error::Result;
use image::DynamicImage;

/// A single detection returned by an [`ObjectDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// Box in the coordinates of the image passed to the detector
    pub bounding_box: BoundingBox,
    /// Detected category
    pub category_name: CategoryName,
    /// Model-specific category id
    pub category_id: Option<u32>,
    /// Confidence
    pub score: f32,
}

impl DetectionResult {
    /// Create a detection.
    pub fn new(bounding_box: BoundingBox, category_name: CategoryName, score: f32) -> Self {
        Self {
            bounding_box,
            category_name,
            category_id: None,
            score,
        }
    }
}

/// Layout, cell or row/column detector.
pub trait ObjectDetector: Send + Sync {
    /// Backend name, used in logs and errors.
    fn name(&self) -> &str;

    /// Categories the detector can emit.
    fn categories(&self) -> Vec<CategoryName>;

    /// Run detection on a decoded image.
    fn predict(&self, image: &DynamicImage) -> Result<Vec<DetectionResult>>;
}

/// A recognized word returned by a [`TextRecognizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct WordResult {
    /// Box in page coordinates
    pub bounding_box: BoundingBox,
    /// Recognized characters
    pub text: String,
    /// Confidence
    pub score: f32,
}

/// OCR engine or text-layer extractor.
pub trait TextRecognizer: Send + Sync {
    /// Backend name.
    fn name(&self) -> &str;

    /// Recognize the words on a decoded page.
    fn predict(&self, image: &DynamicImage) -> Result<Vec<WordResult>>;
}

/// Token classifier input: the words of one page in reading order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutEncoding {
    /// Word annotation ids, aligned with `tokens`
    pub annotation_ids: Vec<String>,
    /// Word texts
    pub tokens: Vec<String>,
    /// Word boxes normalised to `0..=1000`
    pub boxes: Vec<[u32; 4]>,
    /// Page width in pixels
    pub width: u32,
    /// Page height in pixels
    pub height: u32,
}

impl LayoutEncoding {
    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the encoding holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Prediction for one token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClassResult {
    /// Word annotation the prediction belongs to
    pub annotation_id: String,
    /// Token text
    pub token: String,
    /// Predicted label id
    pub class_id: u32,
    /// Full label (e.g. `B-QUESTION`), filled by [`TokenClassCategories::map_results`]
    pub class_name: String,
    /// Semantic part of the label
    pub semantic_name: String,
    /// BIO part of the label
    pub bio_tag: String,
    /// Confidence
    pub score: Option<f32>,
}

impl TokenClassResult {
    /// Create an unmapped result.
    pub fn new(annotation_id: impl Into<String>, token: impl Into<String>, class_id: u32) -> Self {
        Self {
            annotation_id: annotation_id.into(),
            token: token.into(),
            class_id,
            class_name: String::new(),
            semantic_name: String::new(),
            bio_tag: String::new(),
            score: None,
        }
    }
}

/// LayoutLM-style token classifier.
pub trait TokenClassifier: Send + Sync {
    /// Backend name.
    fn name(&self) -> &str;

    /// Label set of the model.
    fn categories(&self) -> &TokenClassCategories;

    /// Classify every token of an encoding.
    fn predict(&self, encoding: &LayoutEncoding) -> Result<Vec<TokenClassResult>>;
}
