//! PubTables-1M, table detection part.

use super::{
    voc_dataflow, BuildOptions, Dataset, DatasetCategories, DatasetInfo, DatasetLocation,
    VocSettings,
};
use crate::dataflow::DataFlow;
use crate::datapoint::{CategoryName, Image};
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

const NAME: &str = "pubtables1m_det";

const DESCRIPTION: &str = "PubTables-1M: nearly one million tables from PubMed Central \
articles. The detection part annotates table regions on full page images.";

const LICENSE: &str = "Community Data License Agreement – Permissive, Version 1.0";

const URL: &str = "https://msropendata.com/datasets/505fcbe3-1383-42b1-913a-f651b8b712d3";

const ROTATED: &str = "TABLE_ROTATED";

/// PubTables-1M table detection (Pascal VOC annotations).
#[derive(Debug, Clone)]
pub struct PubTables1MDet {
    info: DatasetInfo,
    categories: DatasetCategories,
    location: DatasetLocation,
}

impl PubTables1MDet {
    /// Dataset below the given root directory.
    pub fn new(root: &Path) -> Self {
        let location = ["train", "val", "test"].iter().fold(
            DatasetLocation::new(root, "PubTables1M/PubTables1M-Detection-PASCAL-VOC"),
            |location, split| location.with_split(split, *split, "images"),
        );
        let splits: BTreeMap<String, String> = ["train", "val", "test"]
            .iter()
            .map(|split| (split.to_string(), split.to_string()))
            .collect();
        Self {
            info: DatasetInfo {
                name: NAME.to_string(),
                description: DESCRIPTION.to_string(),
                license: LICENSE.to_string(),
                url: URL.to_string(),
                splits,
            },
            categories: DatasetCategories::new(vec![
                CategoryName::Table,
                CategoryName::from(ROTATED),
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

impl Dataset for PubTables1MDet {
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
        let mapping = [
            ("table", CategoryName::Table),
            ("table rotated", CategoryName::from(ROTATED)),
        ];
        voc_dataflow(
            VocSettings {
                location: &self.location,
                categories: &self.categories,
                mapping: &mapping,
                filter_empty_image: false,
                fake_score: false,
            },
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_layout() {
        let dataset = PubTables1MDet::new(Path::new("/data"));
        let workdir = PathBuf::from("/data/PubTables1M/PubTables1M-Detection-PASCAL-VOC");
        assert_eq!(dataset.location().annotation_dir("val").unwrap(), workdir.join("val"));
        assert_eq!(dataset.location().image_dir("train").unwrap(), workdir.join("images"));
        assert_eq!(
            dataset.categories().id_of(&CategoryName::from(ROTATED), true),
            Some(2)
        );
    }
}
