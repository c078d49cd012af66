//! Dataset builders.
//!
//! A dataset turns annotation files on disk into a lazy [`DataFlow`] of
//! [`Image`] datapoints. Datasets are looked up by name in a
//! [`DatasetRegistry`].
//!
//! # Example
//!
//! ```no_run
//! use docsift::datasets::{BuildOptions, DatasetRegistry};
//!
//! fn main() -> docsift::Result<()> {
//!     let registry = DatasetRegistry::with_defaults(docsift::datasets::dataset_root());
//!     let dataset = registry.get("iiitar13k")?;
//!     let options = BuildOptions::new().with_split("train").with_max_datapoints(10);
//!     for image in dataset.dataflow(&options)? {
//!         let image = image?;
//!         println!("{}: {} annotations", image.file_name, image.annotations.len());
//!     }
//!     Ok(())
//! }
//! ```

mod iiitar13k;
mod info;
mod pubtables1m;

pub use iiitar13k::IiitAr13k;
pub use info::{DatasetCategories, DatasetInfo, DatasetLocation};
pub use pubtables1m::PubTables1MDet;

use crate::dataflow::{DataFlow, DataFlowExt, SerializerFiles};
use crate::datapoint::{CategoryName, Image};
use crate::error::{Error, Result};
use crate::mapper::{VocAnnotation, VocMapper};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the dataset root directory.
pub const DATASET_DIR_ENV: &str = "DOCSIFT_DATASET_DIR";

/// The dataset root: `$DOCSIFT_DATASET_DIR`, else `./datasets`.
pub fn dataset_root() -> PathBuf {
    std::env::var_os(DATASET_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./datasets"))
}

/// Options for building a dataflow.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Split to read
    pub split: String,

    /// Maximum number of datapoints
    pub max_datapoints: Option<usize>,

    /// Load pixel data into each datapoint
    pub load_image: bool,
}

impl BuildOptions {
    /// Create build options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the split.
    pub fn with_split(mut self, split: impl Into<String>) -> Self {
        self.split = split.into();
        self
    }

    /// Limit the number of datapoints.
    pub fn with_max_datapoints(mut self, max: usize) -> Self {
        self.max_datapoints = Some(max);
        self
    }

    /// Load pixel data.
    pub fn with_load_image(mut self, load: bool) -> Self {
        self.load_image = load;
        self
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            split: "val".to_string(),
            max_datapoints: None,
            load_image: false,
        }
    }
}

/// A dataset that can be streamed as datapoints.
pub trait Dataset: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Descriptive metadata.
    fn info(&self) -> &DatasetInfo;

    /// Categories and the active filter.
    fn categories(&self) -> &DatasetCategories;

    /// Stream the datapoints of one split.
    fn dataflow(&self, options: &BuildOptions) -> Result<DataFlow<Image>>;
}

/// Registry of datasets, keyed by lower-case name.
pub struct DatasetRegistry {
    datasets: HashMap<String, Arc<dyn Dataset>>,
}

impl DatasetRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            datasets: HashMap::new(),
        }
    }

    /// Create a registry with the built-in datasets below `root`.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut registry = Self::new();
        registry.register(Arc::new(IiitAr13k::new(&root)));
        registry.register(Arc::new(PubTables1MDet::new(&root)));
        registry
    }

    /// Register a dataset, replacing one with the same name.
    pub fn register(&mut self, dataset: Arc<dyn Dataset>) {
        self.datasets.insert(dataset.name().to_lowercase(), dataset);
    }

    /// Get a dataset by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Dataset>> {
        self.datasets
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::DatasetNotFound(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.datasets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::with_defaults(dataset_root())
    }
}

/// How a VOC dataset maps its files.
pub(crate) struct VocSettings<'a> {
    pub location: &'a DatasetLocation,
    pub categories: &'a DatasetCategories,
    pub mapping: &'a [(&'static str, CategoryName)],
    pub filter_empty_image: bool,
    pub fake_score: bool,
}

/// Dataflow over a directory of Pascal VOC files.
pub(crate) fn voc_dataflow(
    settings: VocSettings<'_>,
    options: &BuildOptions,
) -> Result<DataFlow<Image>> {
    let annotation_dir = settings.location.annotation_dir(&options.split)?;
    let image_dir = settings.location.image_dir(&options.split)?;
    log::info!(
        "building dataflow from {} (split '{}')",
        annotation_dir.display(),
        options.split
    );

    let mapper = VocMapper::new(settings.categories.categories(false).to_vec(), image_dir)
        .with_mapping(settings.mapping.iter().map(|(label, c)| (*label, c.clone())))
        .with_load_image(options.load_image)
        .with_filter_empty_image(settings.filter_empty_image)
        .with_fake_score(settings.fake_score);

    // the limit counts annotation files, before empty images are dropped
    let flow = SerializerFiles::load(&annotation_dir, &["xml"], options.max_datapoints)?
        .map_data(|path| {
            let xml = fs::read_to_string(&path)?;
            VocAnnotation::parse(&xml).map_err(|e| match e {
                Error::Xml(msg) => Error::Xml(format!("{}: {}", path.display(), msg)),
                other => other,
            })
        })
        .filter_map_data(move |voc| mapper.map(&voc));

    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_options() {
        let options = BuildOptions::new();
        assert_eq!(options.split, "val");
        assert!(options.max_datapoints.is_none());

        let options = options.with_split("train").with_max_datapoints(5).with_load_image(true);
        assert_eq!(options.split, "train");
        assert_eq!(options.max_datapoints, Some(5));
        assert!(options.load_image);
    }

    #[test]
    fn test_registry() {
        let registry = DatasetRegistry::with_defaults("/data");
        assert_eq!(registry.names(), vec!["iiitar13k", "pubtables1m_det"]);
        assert_eq!(registry.get("IIITAR13K").unwrap().name(), "iiitar13k");
        assert!(matches!(
            registry.get("funsd"),
            Err(Error::DatasetNotFound(name)) if name == "funsd"
        ));
    }
}
