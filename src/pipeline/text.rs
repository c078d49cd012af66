//! Text extraction service.

use super::PipelineComponent;
use crate::backend::TextRecognizer;
use crate::datapoint::{CategoryName, Image, ImageAnnotation, SubCategoryKey};
use crate::error::{Error, Result};
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

/// Adds one word annotation per recognized word.
pub struct TextExtractionService {
    recognizer: Arc<dyn TextRecognizer>,
    name: String,
}

impl TextExtractionService {
    /// Wrap a text recognizer.
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        let name = format!("text_extract_{}", recognizer.name());
        Self { recognizer, name }
    }
}

impl PipelineComponent for TextExtractionService {
    fn name(&self) -> &str {
        &self.name
    }

    fn serve(&self, image: &mut Image) -> Result<()> {
        let decoded = image.decode()?;
        let words = self
            .recognizer
            .predict(&decoded)
            .map_err(|e| Error::pipeline(&self.name, e))?;

        for word in words {
            let text: String = word.text.trim().nfc().collect();
            if text.is_empty() {
                continue;
            }
            let bounding_box = word
                .bounding_box
                .clamp(image.width as f32, image.height as f32);
            let mut annotation =
                ImageAnnotation::new(CategoryName::Word, bounding_box).with_score(word.score);
            annotation.set_value(SubCategoryKey::Characters, text);
            image.dump(annotation);
        }
        Ok(())
    }
}
