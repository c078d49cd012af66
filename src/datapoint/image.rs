//! The page image datapoint.

use super::{get_uuid, CategoryAnnotation, CategoryName, ImageAnnotation, SubCategoryKey};
use crate::detect::detect_format_from_bytes;
use crate::error::{Error, Result};
use crate::render::JsonFormat;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// A page image together with its annotation graph.
///
/// Pixel data is optional: datapoints streamed from a dataset usually carry
/// only their location, while pipeline components that run a detector need
/// the encoded bytes loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Image {
    /// File name of the page image
    pub file_name: String,

    /// Path of the page image
    pub location: PathBuf,

    /// Deterministic id derived from the location
    pub image_id: String,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// 1-based position of the page in its stream (0 = unknown)
    #[serde(default)]
    pub page_number: u32,

    /// All annotations, in insertion order
    #[serde(default)]
    pub annotations: Vec<ImageAnnotation>,

    /// Page-level attributes
    #[serde(default)]
    pub summary: BTreeMap<SubCategoryKey, CategoryAnnotation>,

    /// Encoded image bytes (PNG, JPEG, ...)
    #[serde(rename = "_image", default, deserialize_with = "deserialize_base64")]
    image: Option<Vec<u8>>,
}

impl Image {
    /// Create a datapoint without pixel data.
    pub fn new(file_name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let location_key = location.to_string_lossy().to_string();
        let image_id = get_uuid(&[location_key.as_str()]);
        Self {
            file_name: file_name.into(),
            location,
            image_id,
            width: 0,
            height: 0,
            page_number: 0,
            annotations: Vec::new(),
            summary: BTreeMap::new(),
            image: None,
        }
    }

    /// Read a page image from disk, loading its bytes and dimensions.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut image = Image::new(file_name, path);
        image.load_image()?;
        Ok(image)
    }

    /// Load the pixel data from `location`.
    pub fn load_image(&mut self) -> Result<()> {
        let bytes = fs::read(&self.location)?;
        self.set_image_bytes(bytes)
    }

    /// Attach encoded image bytes and take the page size from them.
    pub fn set_image_bytes(&mut self, bytes: Vec<u8>) -> Result<()> {
        detect_format_from_bytes(&bytes)?;
        let (width, height) = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        self.width = width;
        self.height = height;
        self.image = Some(bytes);
        Ok(())
    }

    /// Encoded image bytes, if loaded.
    pub fn image_bytes(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    /// Check whether pixel data is loaded.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Drop the pixel data, keeping the annotations.
    pub fn clear_image(&mut self) {
        self.image = None;
    }

    /// Decode the pixel data.
    pub fn decode(&self) -> Result<DynamicImage> {
        let bytes = self
            .image
            .as_deref()
            .ok_or_else(|| Error::MissingImage(self.file_name.clone()))?;
        Ok(image::load_from_memory(bytes)?)
    }

    /// Add an annotation and return its id.
    ///
    /// Annotations without an id get a deterministic one derived from the
    /// image id, category, box and insertion position. The position is bumped
    /// until the id is unused.
    pub fn dump(&mut self, mut annotation: ImageAnnotation) -> String {
        if annotation.annotation_id.is_empty() || self.annotation(&annotation.annotation_id).is_some()
        {
            let b = annotation.bounding_box;
            let coords = format!("{:.3},{:.3},{:.3},{:.3}", b.ulx, b.uly, b.lrx, b.lry);
            let mut position = self.annotations.len();
            loop {
                let salt = position.to_string();
                let id = get_uuid(&[
                    self.image_id.as_str(),
                    annotation.category_name.as_str(),
                    coords.as_str(),
                    salt.as_str(),
                ]);
                // positions repeat after a removal
                if self.annotation(&id).is_none() {
                    annotation.annotation_id = id;
                    break;
                }
                position += 1;
            }
        }
        let id = annotation.annotation_id.clone();
        self.annotations.push(annotation);
        id
    }

    /// Get an annotation by id.
    pub fn annotation(&self, id: &str) -> Option<&ImageAnnotation> {
        self.annotations.iter().find(|a| a.annotation_id == id)
    }

    /// Get a mutable annotation by id.
    pub fn annotation_mut(&mut self, id: &str) -> Option<&mut ImageAnnotation> {
        self.annotations.iter_mut().find(|a| a.annotation_id == id)
    }

    /// Active annotations of the given categories (all categories when empty).
    pub fn get_annotation(&self, categories: &[CategoryName]) -> Vec<&ImageAnnotation> {
        self.annotations
            .iter()
            .filter(|a| a.active)
            .filter(|a| categories.is_empty() || categories.contains(&a.category_name))
            .collect()
    }

    /// Ids of active annotations of the given categories.
    pub fn get_annotation_ids(&self, categories: &[CategoryName]) -> Vec<String> {
        self.get_annotation(categories)
            .into_iter()
            .map(|a| a.annotation_id.clone())
            .collect()
    }

    /// Active annotations with the given ids, in the order of `ids`.
    pub fn annotations_by_ids(&self, ids: &[String]) -> Vec<&ImageAnnotation> {
        ids.iter()
            .filter_map(|id| self.annotation(id))
            .filter(|a| a.active)
            .collect()
    }

    /// Active children of an annotation.
    pub fn children_of(&self, id: &str) -> Vec<&ImageAnnotation> {
        match self.annotation(id) {
            Some(parent) => self.annotations_by_ids(&parent.children),
            None => Vec::new(),
        }
    }

    /// Active children of an annotation restricted to the given categories.
    pub fn children_of_category(&self, id: &str, categories: &[CategoryName]) -> Vec<&ImageAnnotation> {
        self.children_of(id)
            .into_iter()
            .filter(|a| categories.contains(&a.category_name))
            .collect()
    }

    /// Link `child` as a child of `parent`.
    pub fn add_child(&mut self, parent: &str, child: &str) -> Result<()> {
        if self.annotation(child).is_none() {
            return Err(Error::AnnotationNotFound(child.to_string()));
        }
        let parent_ann = self
            .annotation_mut(parent)
            .ok_or_else(|| Error::AnnotationNotFound(parent.to_string()))?;
        parent_ann.add_child(child);
        Ok(())
    }

    /// Remove an annotation and every reference to it.
    pub fn remove(&mut self, id: &str) -> Option<ImageAnnotation> {
        let pos = self.annotations.iter().position(|a| a.annotation_id == id)?;
        let removed = self.annotations.remove(pos);
        for ann in &mut self.annotations {
            ann.children.retain(|c| c != id);
        }
        Some(removed)
    }

    /// Set a page-level numeric attribute.
    pub fn set_summary_number(&mut self, key: SubCategoryKey, number: u32) {
        let category = CategoryAnnotation::number(&key, number);
        self.summary.insert(key, category);
    }

    /// Get a page-level numeric attribute.
    pub fn summary_number(&self, key: &SubCategoryKey) -> Option<u32> {
        self.summary.get(key).and_then(|c| c.category_id)
    }

    /// Serialize to JSON, optionally embedding the pixel data as base64.
    pub fn to_json(&self, with_image: bool, format: JsonFormat) -> Result<String> {
        let view = ImageRef::new(self, with_image);
        let json = match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(&view)?,
            JsonFormat::Compact => serde_json::to_string(&view)?,
        };
        Ok(json)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the datapoint to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P, with_image: bool) -> Result<()> {
        let json = self.to_json(with_image, JsonFormat::Pretty)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a datapoint from a JSON file written by [`Image::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Serialize for Image {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ImageRef::new(self, true).serialize(serializer)
    }
}

/// Borrowed serialization view that can leave out the pixel data.
#[derive(Serialize)]
struct ImageRef<'a> {
    file_name: &'a str,
    location: &'a Path,
    image_id: &'a str,
    width: u32,
    height: u32,
    page_number: u32,
    annotations: &'a [ImageAnnotation],
    #[serde(skip_serializing_if = "summary_is_empty")]
    summary: &'a BTreeMap<SubCategoryKey, CategoryAnnotation>,
    #[serde(
        rename = "_image",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_base64"
    )]
    image: Option<&'a [u8]>,
}

impl<'a> ImageRef<'a> {
    fn new(image: &'a Image, with_image: bool) -> Self {
        Self {
            file_name: &image.file_name,
            location: &image.location,
            image_id: &image.image_id,
            width: image.width,
            height: image.height,
            page_number: image.page_number,
            annotations: &image.annotations,
            summary: &image.summary,
            image: if with_image {
                image.image.as_deref()
            } else {
                None
            },
        }
    }
}

fn summary_is_empty(summary: &&BTreeMap<SubCategoryKey, CategoryAnnotation>) -> bool {
    summary.is_empty()
}

fn serialize_base64<S: Serializer>(
    bytes: &Option<&[u8]>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match bytes {
        Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

fn deserialize_base64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Vec<u8>>, D::Error> {
    let encoded: Option<String> = Option::deserialize(deserializer)?;
    encoded
        .map(|s| STANDARD.decode(s.as_bytes()))
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datapoint::BoundingBox;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn sample_image() -> Image {
        let mut img = Image::new("page.png", "/tmp/page.png");
        img.width = 100;
        img.height = 200;
        img
    }

    #[test]
    fn test_dump_assigns_deterministic_ids() {
        let mut a = sample_image();
        let mut b = sample_image();
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let id_a = a.dump(ImageAnnotation::new(CategoryName::Table, bbox));
        let id_b = b.dump(ImageAnnotation::new(CategoryName::Table, bbox));
        assert_eq!(id_a, id_b);

        let id_c = a.dump(ImageAnnotation::new(CategoryName::Table, bbox));
        assert_ne!(id_a, id_c);
    }

    #[test]
    fn test_get_annotation_filters_inactive() {
        let mut img = sample_image();
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let table = img.dump(ImageAnnotation::new(CategoryName::Table, bbox));
        img.dump(ImageAnnotation::new(CategoryName::Text, bbox));
        assert_eq!(img.get_annotation(&[CategoryName::Table]).len(), 1);
        assert_eq!(img.get_annotation(&[]).len(), 2);

        img.annotation_mut(&table).unwrap().deactivate();
        assert!(img.get_annotation(&[CategoryName::Table]).is_empty());
    }

    #[test]
    fn test_children_and_remove() {
        let mut img = sample_image();
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let table = img.dump(ImageAnnotation::new(CategoryName::Table, bbox));
        let cell = img.dump(ImageAnnotation::new(CategoryName::Cell, bbox));
        img.add_child(&table, &cell).unwrap();
        assert_eq!(img.children_of(&table).len(), 1);

        assert!(img.add_child(&table, "missing").is_err());

        img.remove(&cell).unwrap();
        assert!(img.annotation(&table).unwrap().children.is_empty());
    }

    #[test]
    fn test_dump_after_remove_keeps_ids_unique() {
        let mut img = sample_image();
        let text = img.dump(ImageAnnotation::new(
            CategoryName::Text,
            BoundingBox::new(0.0, 0.0, 50.0, 20.0).unwrap(),
        ));
        let word_box = BoundingBox::new(5.0, 5.0, 20.0, 15.0).unwrap();
        let first = img.dump(ImageAnnotation::new(CategoryName::Word, word_box));
        img.remove(&text).unwrap();

        let second = img.dump(ImageAnnotation::new(CategoryName::Word, word_box));
        assert_ne!(first, second);
        assert_eq!(img.annotations.len(), 2);
        assert!(img.annotation(&first).is_some());
        assert!(img.annotation(&second).is_some());

        img.remove(&first).unwrap();
        assert_eq!(img.annotation(&second).unwrap().annotation_id, second);
    }

    #[test]
    fn test_set_image_bytes_reads_dimensions() {
        let mut img = Image::new("page.png", "page.png");
        img.set_image_bytes(png_bytes(12, 7)).unwrap();
        assert_eq!((img.width, img.height), (12, 7));
        let decoded = img.decode().unwrap();
        assert_eq!(decoded.width(), 12);
    }

    #[test]
    fn test_set_image_bytes_rejects_garbage() {
        let mut img = Image::new("page.png", "page.png");
        assert!(img.set_image_bytes(b"not an image".to_vec()).is_err());
        assert!(matches!(img.decode(), Err(Error::MissingImage(_))));
    }

    #[test]
    fn test_json_with_and_without_image() {
        let mut img = Image::new("page.png", "page.png");
        img.set_image_bytes(png_bytes(4, 4)).unwrap();
        let bbox = BoundingBox::new(1.0, 1.0, 3.0, 3.0).unwrap();
        img.dump(ImageAnnotation::new(CategoryName::Word, bbox));

        let with = img.to_json(true, JsonFormat::Compact).unwrap();
        assert!(with.contains("\"_image\""));
        let back = Image::from_json(&with).unwrap();
        assert_eq!(back, img);

        let without = img.to_json(false, JsonFormat::Compact).unwrap();
        assert!(!without.contains("_image"));
        let back = Image::from_json(&without).unwrap();
        assert!(!back.has_image());
        assert_eq!(back.annotations, img.annotations);
    }
}
