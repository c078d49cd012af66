//! Token classification service.

use super::{PageParsingConfig, PipelineComponent};
use crate::backend::{LayoutEncoding, TokenClassifier};
use crate::datapoint::{CategoryAnnotation, CategoryName, Image, SubCategoryKey};
use crate::error::{Error, Result};
use crate::model::reading_cmp;
use std::collections::HashSet;
use std::sync::Arc;

const BOX_SCALE: u32 = 1000;

/// Labels every word of a page with a token class and BIO tag.
pub struct LmTokenClassService {
    classifier: Arc<dyn TokenClassifier>,
    parsing: PageParsingConfig,
    name: String,
}

impl LmTokenClassService {
    /// Wrap a token classifier.
    pub fn new(classifier: Arc<dyn TokenClassifier>) -> Self {
        let name = format!("token_class_{}", classifier.name());
        Self {
            classifier,
            parsing: PageParsingConfig::default(),
            name,
        }
    }

    /// Use custom block categories to order the words.
    pub fn with_parsing(mut self, parsing: PageParsingConfig) -> Self {
        self.parsing = parsing;
        self
    }

    /// Word ids in page reading order.
    ///
    /// Blocks and tables are visited in their reading order, table words
    /// cell by cell. Words outside any block come last, by position.
    fn ordered_words(&self, image: &Image) -> Vec<String> {
        let word_categories = [self.parsing.word.clone()];
        let cell_categories = [self.parsing.cell.clone()];

        let mut blocks = image.get_annotation(&self.parsing.text_blocks);
        blocks.extend(image.get_annotation(std::slice::from_ref(&self.parsing.table)));
        blocks.sort_by(|a, b| {
            reading_cmp(
                a.number(&SubCategoryKey::ReadingOrder),
                &a.bounding_box,
                b.number(&SubCategoryKey::ReadingOrder),
                &b.bounding_box,
            )
        });

        let mut ordered = Vec::new();
        let mut seen = HashSet::new();
        let mut push_words = |container: &str, ordered: &mut Vec<String>| {
            let mut words = image.children_of_category(container, &word_categories);
            words.sort_by(|a, b| {
                reading_cmp(
                    a.number(&SubCategoryKey::ReadingOrder),
                    &a.bounding_box,
                    b.number(&SubCategoryKey::ReadingOrder),
                    &b.bounding_box,
                )
            });
            for word in words {
                if seen.insert(word.annotation_id.clone()) {
                    ordered.push(word.annotation_id.clone());
                }
            }
        };

        for block in blocks {
            if block.category_name == self.parsing.table {
                let mut cells = image.children_of_category(&block.annotation_id, &cell_categories);
                cells.sort_by_key(|c| {
                    (
                        c.number(&SubCategoryKey::RowNumber).unwrap_or(0),
                        c.number(&SubCategoryKey::ColumnNumber).unwrap_or(0),
                    )
                });
                for cell in cells {
                    push_words(&cell.annotation_id, &mut ordered);
                }
            } else {
                push_words(&block.annotation_id, &mut ordered);
            }
        }

        let mut rest = image.get_annotation(&word_categories);
        rest.retain(|w| !seen.contains(&w.annotation_id));
        rest.sort_by(|a, b| reading_cmp(None, &a.bounding_box, None, &b.bounding_box));
        ordered.extend(rest.into_iter().map(|w| w.annotation_id.clone()));
        ordered
    }

    fn encode(&self, image: &Image) -> LayoutEncoding {
        let mut encoding = LayoutEncoding {
            width: image.width,
            height: image.height,
            ..LayoutEncoding::default()
        };
        for id in self.ordered_words(image) {
            let Some(word) = image.annotation(&id) else {
                continue;
            };
            encoding.tokens.push(
                word.value(&SubCategoryKey::Characters)
                    .unwrap_or_default()
                    .to_string(),
            );
            encoding
                .boxes
                .push(word.bounding_box.normalized(image.width, image.height, BOX_SCALE));
            encoding.annotation_ids.push(id);
        }
        encoding
    }
}

impl PipelineComponent for LmTokenClassService {
    fn name(&self) -> &str {
        &self.name
    }

    fn serve(&self, image: &mut Image) -> Result<()> {
        let encoding = self.encode(image);
        if encoding.is_empty() {
            return Ok(());
        }

        let mut results = self
            .classifier
            .predict(&encoding)
            .map_err(|e| Error::pipeline(&self.name, e))?;
        self.classifier.categories().map_results(&mut results)?;

        for result in results {
            let word = image
                .annotation_mut(&result.annotation_id)
                .ok_or_else(|| Error::AnnotationNotFound(result.annotation_id.clone()))?;
            let mut class = CategoryAnnotation::new(CategoryName::from(result.semantic_name))
                .with_id(result.class_id);
            if let Some(score) = result.score {
                class = class.with_score(score);
            }
            word.set_sub_category(SubCategoryKey::TokenClass, class);
            word.set_sub_category(
                SubCategoryKey::TokenTag,
                CategoryAnnotation::new(CategoryName::from(result.bio_tag)),
            );
        }
        Ok(())
    }
}
