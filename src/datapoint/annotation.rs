//! Annotation types.

use super::{BoundingBox, CategoryName, SubCategoryKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A categorical attribute, optionally carrying a text value.
///
/// Numeric attributes (row numbers, reading order) keep the number in
/// `category_id`; text attributes (word characters) keep it in `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnnotation {
    /// Category label
    pub category_name: CategoryName,

    /// Numeric category id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u32>,

    /// Confidence score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// Text payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl CategoryAnnotation {
    /// Create a category annotation.
    pub fn new(category_name: CategoryName) -> Self {
        Self {
            category_name,
            category_id: None,
            score: None,
            value: None,
        }
    }

    /// Create a numeric attribute.
    pub fn number(key: &SubCategoryKey, number: u32) -> Self {
        Self {
            category_name: CategoryName::Other(key.as_str().to_string()),
            category_id: Some(number),
            score: None,
            value: None,
        }
    }

    /// Create a text attribute.
    pub fn container(key: &SubCategoryKey, value: impl Into<String>) -> Self {
        Self {
            category_name: CategoryName::Other(key.as_str().to_string()),
            category_id: None,
            score: None,
            value: Some(value.into()),
        }
    }

    /// Set the category id and return self.
    pub fn with_id(mut self, id: u32) -> Self {
        self.category_id = Some(id);
        self
    }

    /// Set the score and return self.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

fn default_active() -> bool {
    true
}

fn is_active(active: &bool) -> bool {
    *active
}

/// A located annotation on a page image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotation {
    /// Identifier assigned when the annotation is dumped into an [`super::Image`]
    #[serde(default)]
    pub annotation_id: String,

    /// Category label
    pub category_name: CategoryName,

    /// Numeric category id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u32>,

    /// Detection confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// Location in absolute page coordinates
    pub bounding_box: BoundingBox,

    /// Inactive annotations are kept in the graph but ignored by services
    #[serde(default = "default_active", skip_serializing_if = "is_active")]
    pub active: bool,

    /// Typed attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_categories: BTreeMap<SubCategoryKey, CategoryAnnotation>,

    /// Ids of child annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl ImageAnnotation {
    /// Create an annotation that has not been dumped yet.
    pub fn new(category_name: CategoryName, bounding_box: BoundingBox) -> Self {
        Self {
            annotation_id: String::new(),
            category_name,
            category_id: None,
            score: None,
            bounding_box,
            active: true,
            sub_categories: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set the score and return self.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Set the category id and return self.
    pub fn with_category_id(mut self, id: u32) -> Self {
        self.category_id = Some(id);
        self
    }

    /// Attach a sub-category, replacing an existing one under the same key.
    pub fn set_sub_category(&mut self, key: SubCategoryKey, category: CategoryAnnotation) {
        self.sub_categories.insert(key, category);
    }

    /// Get a sub-category.
    pub fn sub_category(&self, key: &SubCategoryKey) -> Option<&CategoryAnnotation> {
        self.sub_categories.get(key)
    }

    /// Attach a numeric attribute.
    pub fn set_number(&mut self, key: SubCategoryKey, number: u32) {
        let category = CategoryAnnotation::number(&key, number);
        self.sub_categories.insert(key, category);
    }

    /// Get a numeric attribute.
    pub fn number(&self, key: &SubCategoryKey) -> Option<u32> {
        self.sub_categories.get(key).and_then(|c| c.category_id)
    }

    /// Attach a text attribute.
    pub fn set_value(&mut self, key: SubCategoryKey, value: impl Into<String>) {
        let category = CategoryAnnotation::container(&key, value);
        self.sub_categories.insert(key, category);
    }

    /// Get a text attribute.
    pub fn value(&self, key: &SubCategoryKey) -> Option<&str> {
        self.sub_categories
            .get(key)
            .and_then(|c| c.value.as_deref())
    }

    /// Link a child annotation id (duplicates are ignored).
    pub fn add_child(&mut self, child_id: impl Into<String>) {
        let child_id = child_id.into();
        if !self.children.contains(&child_id) {
            self.children.push(child_id);
        }
    }

    /// Mark the annotation as inactive.
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}
