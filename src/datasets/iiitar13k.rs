//! IIIT-AR-13K: graphical objects in annual reports.

use super::{
    voc_dataflow, BuildOptions, Dataset, DatasetCategories, DatasetInfo, DatasetLocation,
    VocSettings,
};
use crate::dataflow::DataFlow;
use crate::datapoint::{CategoryName, Image};
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

const NAME: &str = "iiitar13k";

const DESCRIPTION: &str = "IIIT-AR-13K: manually annotated bounding boxes of graphical page \
objects in publicly available annual reports. About 13K page images with tables, figures, \
natural images, logos and signatures, in several languages.";

const URL: &str = "http://cvit.iiit.ac.in/usodi/iiitar13k.php";

const SPLITS: [(&str, &str, &str); 3] = [
    ("train", "training_xml", "training_images"),
    ("val", "validation_xml", "validation_images"),
    ("test", "test_xml", "test_images"),
];

fn mapping() -> [(&'static str, CategoryName); 5] {
    [
        ("natural_image", CategoryName::Figure),
        ("figure", CategoryName::Figure),
        ("logo", CategoryName::Logo),
        ("signature", CategoryName::Signature),
        ("table", CategoryName::Table),
    ]
}

/// The IIIT-AR-13K dataset (Pascal VOC annotations).
#[derive(Debug, Clone)]
pub struct IiitAr13k {
    info: DatasetInfo,
    categories: DatasetCategories,
    location: DatasetLocation,
}

impl IiitAr13k {
    /// Dataset below the given root directory.
    pub fn new(root: &Path) -> Self {
        let location = SPLITS.iter().fold(
            DatasetLocation::new(root, NAME),
            |location, (split, xml, images)| location.with_split(split, *xml, *images),
        );
        let splits: BTreeMap<String, String> = SPLITS
            .iter()
            .map(|(split, _, images)| (split.to_string(), images.to_string()))
            .collect();
        Self {
            info: DatasetInfo {
                name: NAME.to_string(),
                description: DESCRIPTION.to_string(),
                license: "NN".to_string(),
                url: URL.to_string(),
                splits,
            },
            categories: DatasetCategories::new(vec![
                CategoryName::Table,
                CategoryName::Logo,
                CategoryName::Figure,
                CategoryName::Signature,
            ]),
            location,
        }
    }

    /// Only keep annotations of these categories.
    pub fn with_categories_filter(mut self, keep: &[CategoryName]) -> Self {
        self.categories.filter_categories(keep);
        self
    }

    /// Directory layout of the dataset.
    pub fn location(&self) -> &DatasetLocation {
        &self.location
    }
}

impl Dataset for IiitAr13k {
    fn name(&self) -> &str {
        NAME
    }

    fn info(&self) -> &DatasetInfo {
        &self.info
    }

    fn categories(&self) -> &DatasetCategories {
        &self.categories
    }

    fn dataflow(&self, options: &BuildOptions) -> Result<DataFlow<Image>> {
        let mapping = mapping();
        voc_dataflow(
            VocSettings {
                location: &self.location,
                categories: &self.categories,
                mapping: &mapping,
                filter_empty_image: true,
                fake_score: true,
            },
            options,
        )
    }
}
