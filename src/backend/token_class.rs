//! Token classification label sets.

use super::TokenClassResult;
use crate::error::{Error, Result};

/// Label of tokens outside any entity.
pub const OUTSIDE_LABEL: &str = "O";

/// Semantic name of tokens outside any entity.
pub const OUTSIDE_SEMANTIC: &str = "OTHER";

/// Position of the outside label in the label list.
const OUTSIDE_POSITION: usize = 9;

/// Label list of a token classifier, indexed by class id.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClassCategories {
    labels: Vec<String>,
}

impl TokenClassCategories {
    /// Build the label list from semantic names and BIO tags.
    ///
    /// Every `bio-semantic` pair is generated (semantic `OTHER` excluded),
    /// pairs starting with `O` are dropped and the outside label is inserted
    /// at position 9, or appended when the list is shorter.
    pub fn from_semantics_and_bio(semantics: &[&str], bio: &[&str]) -> Self {
        let mut labels: Vec<String> = bio
            .iter()
            .flat_map(|tag| {
                semantics
                    .iter()
                    .filter(|s| **s != OUTSIDE_SEMANTIC)
                    .map(move |s| format!("{}-{}", tag, s))
            })
            .filter(|label| !label.starts_with('O'))
            .collect();
        let position = OUTSIDE_POSITION.min(labels.len());
        labels.insert(position, OUTSIDE_LABEL.to_string());
        Self { labels }
    }

    /// Use an explicit label list.
    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Label of a class id.
    pub fn label(&self, class_id: u32) -> Option<&str> {
        self.labels.get(class_id as usize).map(String::as_str)
    }

    /// All labels in id order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if there are no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Fill label, semantic name and BIO tag of each result from its class id.
    pub fn map_results(&self, results: &mut [TokenClassResult]) -> Result<()> {
        for result in results.iter_mut() {
            let label = self.label(result.class_id).ok_or_else(|| {
                Error::Backend(format!("unknown token class id {}", result.class_id))
            })?;
            let (bio_tag, semantic) = split_label(label);
            result.class_name = label.to_string();
            result.bio_tag = bio_tag.to_string();
            result.semantic_name = semantic.to_string();
        }
        Ok(())
    }
}

fn split_label(label: &str) -> (&str, &str) {
    match label.split_once('-') {
        Some((bio, semantic)) => (bio, semantic),
        None => (OUTSIDE_LABEL, OUTSIDE_SEMANTIC),
    }
}
