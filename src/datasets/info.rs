//! Dataset metadata, categories and on-disk layout.

use crate::datapoint::CategoryName;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Descriptive metadata of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    /// Registry name
    pub name: String,
    /// Short description
    pub description: String,
    /// License of the data
    pub license: String,
    /// Where to download it
    pub url: String,
    /// Split names mapped to a human readable description
    pub splits: BTreeMap<String, String>,
}

/// Categories of a dataset, optionally narrowed down to a subset.
///
/// Category ids are 1-based positions in the active list.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetCategories {
    init: Vec<CategoryName>,
    filtered: Option<Vec<CategoryName>>,
}

impl DatasetCategories {
    /// Create categories from the initial list.
    pub fn new(init: Vec<CategoryName>) -> Self {
        Self {
            init,
            filtered: None,
        }
    }

    /// The initial categories when `init` is set, else the active ones.
    pub fn categories(&self, init: bool) -> &[CategoryName] {
        match (&self.filtered, init) {
            (Some(filtered), false) => filtered,
            _ => &self.init,
        }
    }

    /// 1-based id of a category.
    pub fn id_of(&self, name: &CategoryName, init: bool) -> Option<u32> {
        self.categories(init)
            .iter()
            .position(|c| c == name)
            .map(|p| p as u32 + 1)
    }

    /// Keep only the given categories, in the initial order.
    ///
    /// Names that are not initial categories are ignored.
    pub fn filter_categories(&mut self, keep: &[CategoryName]) {
        let filtered: Vec<CategoryName> = self
            .init
            .iter()
            .filter(|c| keep.contains(c))
            .cloned()
            .collect();
        self.filtered = Some(filtered);
    }

    /// Whether a filter is active.
    pub fn is_filtered(&self) -> bool {
        self.filtered.is_some()
    }
}

/// Where a dataset lives below the dataset root.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetLocation {
    /// Dataset root directory
    pub root: PathBuf,
    /// Directory of this dataset relative to the root
    pub location: PathBuf,
    /// Annotation directory per split, relative to the workdir
    pub annotation_dirs: BTreeMap<String, PathBuf>,
    /// Image directory per split, relative to the workdir
    pub image_dirs: BTreeMap<String, PathBuf>,
}

impl DatasetLocation {
    /// Create a location with no splits.
    pub fn new(root: impl Into<PathBuf>, location: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            location: location.into(),
            annotation_dirs: BTreeMap::new(),
            image_dirs: BTreeMap::new(),
        }
    }

    /// Declare a split with its annotation and image directories.
    pub fn with_split(
        mut self,
        split: &str,
        annotation_dir: impl Into<PathBuf>,
        image_dir: impl Into<PathBuf>,
    ) -> Self {
        self.annotation_dirs
            .insert(split.to_string(), annotation_dir.into());
        self.image_dirs.insert(split.to_string(), image_dir.into());
        self
    }

    /// Root joined with the dataset location.
    pub fn workdir(&self) -> PathBuf {
        self.root.join(&self.location)
    }

    /// Annotation directory of a split.
    pub fn annotation_dir(&self, split: &str) -> Result<PathBuf> {
        self.split_dir(&self.annotation_dirs, split)
    }

    /// Image directory of a split.
    pub fn image_dir(&self, split: &str) -> Result<PathBuf> {
        self.split_dir(&self.image_dirs, split)
    }

    /// Declared split names.
    pub fn splits(&self) -> Vec<&str> {
        self.annotation_dirs.keys().map(String::as_str).collect()
    }

    fn split_dir(&self, dirs: &BTreeMap<String, PathBuf>, split: &str) -> Result<PathBuf> {
        dirs.get(split)
            .map(|dir| self.workdir().join(dir))
            .ok_or_else(|| Error::UnknownSplit(split.to_string()))
    }
}
