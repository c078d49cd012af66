//! Parent/child matching by overlap.

use super::{MatchingConfig, MatchingRule, PipelineComponent};
use crate::datapoint::{BoundingBox, Image};
use crate::error::Result;

/// Links child annotations to the parents they overlap.
pub struct MatchingService {
    config: MatchingConfig,
}

impl MatchingService {
    /// Create a matching service.
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    fn overlap(&self, child: &BoundingBox, parent: &BoundingBox) -> f32 {
        match self.config.rule {
            MatchingRule::Iou => child.iou(parent),
            MatchingRule::Ioa => child.ioa(parent),
        }
    }
}

impl Default for MatchingService {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl PipelineComponent for MatchingService {
    fn name(&self) -> &str {
        "matching"
    }

    fn serve(&self, image: &mut Image) -> Result<()> {
        let parents: Vec<(String, BoundingBox)> = image
            .get_annotation(&self.config.parents)
            .into_iter()
            .map(|a| (a.annotation_id.clone(), a.bounding_box))
            .collect();
        let children: Vec<(String, BoundingBox)> = image
            .get_annotation(&self.config.children)
            .into_iter()
            .map(|a| (a.annotation_id.clone(), a.bounding_box))
            .collect();

        let mut links = Vec::new();
        for (parent_id, parent_box) in &parents {
            for (child_id, child_box) in &children {
                if parent_id != child_id
                    && self.overlap(child_box, parent_box) >= self.config.threshold
                {
                    links.push((parent_id.as_str(), child_id.as_str()));
                }
            }
        }

        log::debug!("matching: {} links on {}", links.len(), image.file_name);
        for (parent, child) in links {
            image.add_child(parent, child)?;
        }
        Ok(())
    }
}
