//! Word tokens.

use crate::datapoint::{BoundingBox, ImageAnnotation, SubCategoryKey};
use serde::Serialize;
use std::cmp::Ordering;

/// A single word with its position, reading order and optional token labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Word {
    /// Id of the underlying annotation
    pub annotation_id: String,

    /// Recognized text
    pub text: String,

    /// Location on the page
    pub bounding_box: BoundingBox,

    /// Recognition confidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// 1-based position inside the enclosing block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_order: Option<u32>,

    /// Semantic token class (e.g. `QUESTION`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_class: Option<String>,

    /// BIO tag of the token class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Word {
    /// Build the word view of an annotation.
    pub fn from_annotation(ann: &ImageAnnotation) -> Self {
        Self {
            annotation_id: ann.annotation_id.clone(),
            text: ann
                .value(&SubCategoryKey::Characters)
                .unwrap_or_default()
                .to_string(),
            bounding_box: ann.bounding_box,
            score: ann.score,
            reading_order: ann.number(&SubCategoryKey::ReadingOrder),
            token_class: ann
                .sub_category(&SubCategoryKey::TokenClass)
                .map(|c| c.category_name.as_str().to_string()),
            tag: ann
                .sub_category(&SubCategoryKey::TokenTag)
                .map(|c| c.category_name.as_str().to_string()),
        }
    }

    /// The characters of the word.
    pub fn characters(&self) -> &str {
        &self.text
    }
}

/// Order by reading order; unordered words go last, by position.
pub(crate) fn reading_cmp(
    a_order: Option<u32>,
    a_box: &BoundingBox,
    b_order: Option<u32>,
    b_box: &BoundingBox,
) -> Ordering {
    match (a_order, b_order) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a_box
            .uly
            .total_cmp(&b_box.uly)
            .then(a_box.ulx.total_cmp(&b_box.ulx)),
    }
}

/// Sort words in reading order.
pub(crate) fn sort_words(words: &mut [Word]) {
    words.sort_by(|a, b| {
        reading_cmp(
            a.reading_order,
            &a.bounding_box,
            b.reading_order,
            &b.bounding_box,
        )
    });
}

/// Join word texts with single spaces.
pub(crate) fn join_words(words: &[Word]) -> String {
    words
        .iter()
        .map(|w| w.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
