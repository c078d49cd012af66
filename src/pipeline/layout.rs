//! Layout detection services.

use super::PipelineComponent;
use crate::backend::{DetectionResult, ObjectDetector};
use crate::datapoint::{BoundingBox, CategoryName, Image, ImageAnnotation};
use crate::error::{Error, Result};
use image::DynamicImage;
use rayon::prelude::*;
use std::sync::Arc;

/// Runs an object detector on the full page.
pub struct ImageLayoutService {
    detector: Arc<dyn ObjectDetector>,
    name: String,
}

impl ImageLayoutService {
    /// Wrap a detector.
    pub fn new(detector: Arc<dyn ObjectDetector>) -> Self {
        let name = format!("image_layout_{}", detector.name());
        Self { detector, name }
    }
}

impl PipelineComponent for ImageLayoutService {
    fn name(&self) -> &str {
        &self.name
    }

    fn serve(&self, image: &mut Image) -> Result<()> {
        let decoded = image.decode()?;
        let categories = self.detector.categories();
        let detections = self
            .detector
            .predict(&decoded)
            .map_err(|e| Error::pipeline(&self.name, e))?;

        let mut dumped = 0usize;
        for detection in detections {
            if !categories.contains(&detection.category_name) {
                log::debug!(
                    "{}: dropping undeclared category {}",
                    self.name,
                    detection.category_name
                );
                continue;
            }
            let bounding_box = detection
                .bounding_box
                .clamp(image.width as f32, image.height as f32);
            if bounding_box.area() <= 0.0 {
                continue;
            }
            image.dump(to_annotation(&detection, bounding_box));
            dumped += 1;
        }
        log::debug!("{}: {} annotations on {}", self.name, dumped, image.file_name);
        Ok(())
    }
}

/// Runs an object detector on crops of parent annotations (e.g. cells in tables).
///
/// Results are shifted back to page coordinates and linked as children of
/// the parent they were found in.
pub struct SubImageLayoutService {
    detector: Arc<dyn ObjectDetector>,
    parents: Vec<CategoryName>,
    name: String,
}

impl SubImageLayoutService {
    /// Wrap a detector that runs inside each annotation of `parents`.
    pub fn new(detector: Arc<dyn ObjectDetector>, parents: Vec<CategoryName>) -> Self {
        let name = format!("sub_image_layout_{}", detector.name());
        Self {
            detector,
            parents,
            name,
        }
    }
}

impl PipelineComponent for SubImageLayoutService {
    fn name(&self) -> &str {
        &self.name
    }

    fn serve(&self, image: &mut Image) -> Result<()> {
        let parents: Vec<(String, BoundingBox)> = image
            .get_annotation(&self.parents)
            .into_iter()
            .map(|a| (a.annotation_id.clone(), a.bounding_box))
            .collect();
        if parents.is_empty() {
            return Ok(());
        }

        let decoded = image.decode()?;
        let categories = self.detector.categories();

        let results: Vec<Result<(String, BoundingBox, Vec<DetectionResult>)>> = parents
            .into_par_iter()
            .map(|(parent_id, parent_box)| {
                let (crop, origin) = crop(&decoded, &parent_box);
                let detections = self
                    .detector
                    .predict(&crop)
                    .map_err(|e| Error::pipeline(&self.name, e))?;
                Ok((parent_id, origin, detections))
            })
            .collect();

        for result in results {
            let (parent_id, origin, detections) = result?;
            for detection in detections {
                if !categories.contains(&detection.category_name) {
                    continue;
                }
                let bounding_box = detection
                    .bounding_box
                    .shift(origin.ulx, origin.uly)
                    .clamp(image.width as f32, image.height as f32);
                if bounding_box.area() <= 0.0 {
                    continue;
                }
                let child_id = image.dump(to_annotation(&detection, bounding_box));
                image.add_child(&parent_id, &child_id)?;
            }
        }
        Ok(())
    }
}

fn to_annotation(detection: &DetectionResult, bounding_box: BoundingBox) -> ImageAnnotation {
    let mut annotation = ImageAnnotation::new(detection.category_name.clone(), bounding_box)
        .with_score(detection.score);
    annotation.category_id = detection.category_id;
    annotation
}

/// Crop a region, returning the crop and the box it was cut from.
fn crop(image: &DynamicImage, region: &BoundingBox) -> (DynamicImage, BoundingBox) {
    let x = (region.ulx.max(0.0).floor() as u32).min(image.width().saturating_sub(1));
    let y = (region.uly.max(0.0).floor() as u32).min(image.height().saturating_sub(1));
    let width = ((region.lrx.ceil() as u32).min(image.width()).saturating_sub(x)).max(1);
    let height = ((region.lry.ceil() as u32).min(image.height()).saturating_sub(y)).max(1);
    let origin = BoundingBox {
        ulx: x as f32,
        uly: y as f32,
        lrx: (x + width) as f32,
        lry: (y + height) as f32,
    };
    (image.crop_imm(x, y, width, height), origin)
}
