//! Pascal VOC annotation files.

use crate::datapoint::{BoundingBox, CategoryName, Image, ImageAnnotation};
use crate::error::{Error, Result};
use md5::{Digest, Md5};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::PathBuf;

/// One `<object>` of a VOC file.
#[derive(Debug, Clone, PartialEq)]
pub struct VocObject {
    /// Label as written in the file
    pub name: String,
    /// Left edge
    pub xmin: f32,
    /// Top edge
    pub ymin: f32,
    /// Right edge
    pub xmax: f32,
    /// Bottom edge
    pub ymax: f32,
}

/// A parsed VOC annotation file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VocAnnotation {
    /// Image file name
    pub filename: String,
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Annotated objects
    pub objects: Vec<VocObject>,
}

#[derive(Default)]
struct PartialObject {
    name: String,
    xmin: Option<f32>,
    ymin: Option<f32>,
    xmax: Option<f32>,
    ymax: Option<f32>,
}

impl PartialObject {
    fn finish(self) -> Result<VocObject> {
        match (self.xmin, self.ymin, self.xmax, self.ymax) {
            (Some(xmin), Some(ymin), Some(xmax), Some(ymax)) => Ok(VocObject {
                name: self.name,
                xmin,
                ymin,
                xmax,
                ymax,
            }),
            _ => Err(Error::Xml(format!("object '{}' has an incomplete bndbox", self.name))),
        }
    }
}

impl VocAnnotation {
    /// Parse the XML text of a VOC file.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut annotation = VocAnnotation::default();
        let mut path: Vec<String> = Vec::new();
        let mut object: Option<PartialObject> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if name == "object" {
                        object = Some(PartialObject::default());
                    }
                    path.push(name);
                }
                Event::End(_) => {
                    if path.pop().as_deref() == Some("object") {
                        if let Some(done) = object.take() {
                            annotation.objects.push(done.finish()?);
                        }
                    }
                }
                Event::Text(e) => {
                    let text = e.unescape()?.trim().to_string();
                    let tag = path.last().map(String::as_str).unwrap_or_default();
                    let parent = path
                        .len()
                        .checked_sub(2)
                        .and_then(|i| path.get(i))
                        .map(String::as_str)
                        .unwrap_or_default();
                    match (parent, tag, object.as_mut()) {
                        ("annotation", "filename", _) => annotation.filename = text,
                        ("size", "width", _) => annotation.width = parse_size(&text)?,
                        ("size", "height", _) => annotation.height = parse_size(&text)?,
                        ("object", "name", Some(obj)) => obj.name = text,
                        ("bndbox", coord, Some(obj)) => {
                            let value = parse_coord(&text)?;
                            match coord {
                                "xmin" => obj.xmin = Some(value),
                                "ymin" => obj.ymin = Some(value),
                                "xmax" => obj.xmax = Some(value),
                                "ymax" => obj.ymax = Some(value),
                                _ => {}
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if annotation.filename.is_empty() {
            return Err(Error::Xml("missing <filename>".to_string()));
        }
        Ok(annotation)
    }
}

fn parse_coord(text: &str) -> Result<f32> {
    text.parse::<f32>()
        .map_err(|_| Error::Xml(format!("invalid coordinate '{}'", text)))
}

fn parse_size(text: &str) -> Result<u32> {
    let value = parse_coord(text)?;
    if value < 0.0 {
        return Err(Error::Xml(format!("invalid size '{}'", text)));
    }
    Ok(value.round() as u32)
}

/// Deterministic pseudo score in `[0, 1)` derived from an annotation id.
pub fn fake_score(annotation_id: &str) -> f32 {
    let digest = Md5::digest(annotation_id.as_bytes());
    let value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) >> 8;
    value as f32 / (1u32 << 24) as f32
}

/// Turns VOC annotations into datapoints.
#[derive(Debug, Clone)]
pub struct VocMapper {
    /// Dataset categories; ids are positions starting at 1
    pub categories: Vec<CategoryName>,
    /// Lower-case file labels mapped to categories
    pub category_name_mapping: HashMap<String, CategoryName>,
    /// Directory of the image files
    pub image_dir: PathBuf,
    /// Load pixel data
    pub load_image: bool,
    /// Drop datapoints without any annotation
    pub filter_empty_image: bool,
    /// Give annotations a deterministic pseudo score
    pub fake_score: bool,
}

impl VocMapper {
    /// Create a mapper with no name mapping and all flags off.
    pub fn new(categories: Vec<CategoryName>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            categories,
            category_name_mapping: HashMap::new(),
            image_dir: image_dir.into(),
            load_image: false,
            filter_empty_image: false,
            fake_score: false,
        }
    }

    /// Map file labels to categories (labels are compared lower-case).
    pub fn with_mapping<I, S>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (S, CategoryName)>,
        S: Into<String>,
    {
        self.category_name_mapping = mapping
            .into_iter()
            .map(|(label, category)| (label.into().to_lowercase(), category))
            .collect();
        self
    }

    /// Load pixel data for every datapoint.
    pub fn with_load_image(mut self, load: bool) -> Self {
        self.load_image = load;
        self
    }

    /// Drop datapoints that end up without annotations.
    pub fn with_filter_empty_image(mut self, filter: bool) -> Self {
        self.filter_empty_image = filter;
        self
    }

    /// Attach pseudo scores.
    pub fn with_fake_score(mut self, fake: bool) -> Self {
        self.fake_score = fake;
        self
    }

    fn category_of(&self, label: &str) -> CategoryName {
        self.category_name_mapping
            .get(&label.to_lowercase())
            .cloned()
            .unwrap_or_else(|| CategoryName::parse(label))
    }

    /// Convert one annotation file into a datapoint.
    ///
    /// Returns `None` when `filter_empty_image` is set and no object has a
    /// known category.
    pub fn map(&self, voc: &VocAnnotation) -> Result<Option<Image>> {
        let mut image = Image::new(voc.filename.clone(), self.image_dir.join(&voc.filename));
        image.width = voc.width;
        image.height = voc.height;
        if self.load_image {
            image.load_image()?;
        }

        for object in &voc.objects {
            let category = self.category_of(&object.name);
            let Some(position) = self.categories.iter().position(|c| c == &category) else {
                log::debug!("{}: skipping label '{}'", voc.filename, object.name);
                continue;
            };
            let bounding_box =
                match BoundingBox::new(object.xmin, object.ymin, object.xmax, object.ymax) {
                    Ok(b) => b,
                    Err(e) => {
                        log::warn!("{}: skipping object: {}", voc.filename, e);
                        continue;
                    }
                };
            let annotation =
                ImageAnnotation::new(category, bounding_box).with_category_id(position as u32 + 1);
            let id = image.dump(annotation);
            if self.fake_score {
                if let Some(annotation) = image.annotation_mut(&id) {
                    annotation.score = Some(fake_score(&id));
                }
            }
        }

        if self.filter_empty_image && image.annotations.is_empty() {
            log::debug!("{}: no annotations, dropped", voc.filename);
            return Ok(None);
        }
        Ok(Some(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotation>
  <folder>validation_images</folder>
  <filename>ar_2017_page_12.jpg</filename>
  <size><width>1654</width><height>2339</height><depth>3</depth></size>
  <object>
    <name>table</name>
    <difficult>0</difficult>
    <bndbox><xmin>120</xmin><ymin>300.5</ymin><xmax>1500</xmax><ymax>900</ymax></bndbox>
  </object>
  <object>
    <name>natural_image</name>
    <bndbox><xmin>100</xmin><ymin>1000</ymin><xmax>600</xmax><ymax>1400</ymax></bndbox>
  </object>
  <object>
    <name>stamp</name>
    <bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax><ymax>2</ymax></bndbox>
  </object>
</annotation>"#;

    fn mapper() -> VocMapper {
        VocMapper::new(
            vec![
                CategoryName::Table,
                CategoryName::Logo,
                CategoryName::Figure,
                CategoryName::Signature,
            ],
            "/data/iiitar13k/validation_images",
        )
        .with_mapping([
            ("natural_image", CategoryName::Figure),
            ("table", CategoryName::Table),
        ])
    }

    #[test]
    fn test_parse() {
        let voc = VocAnnotation::parse(SAMPLE).unwrap();
        assert_eq!(voc.filename, "ar_2017_page_12.jpg");
        assert_eq!((voc.width, voc.height), (1654, 2339));
        assert_eq!(voc.objects.len(), 3);
        assert_eq!(voc.objects[0].name, "table");
        assert_eq!(voc.objects[0].ymin, 300.5);
    }

    #[test]
    fn test_parse_malformed_number() {
        let xml = SAMPLE.replace("<xmin>120</xmin>", "<xmin>abc</xmin>");
        assert!(matches!(VocAnnotation::parse(&xml), Err(Error::Xml(_))));
    }

    #[test]
    fn test_map() {
        let voc = VocAnnotation::parse(SAMPLE).unwrap();
        let image = mapper().map(&voc).unwrap().unwrap();
        let anns = image.get_annotation(&[]);
        assert_eq!(anns.len(), 2);
        assert_eq!(anns[0].category_name, CategoryName::Table);
        assert_eq!(anns[0].category_id, Some(1));
        assert_eq!(anns[0].bounding_box.width(), 1380.0);
        assert_eq!(anns[1].category_name, CategoryName::Figure);
        assert_eq!(anns[1].category_id, Some(3));
        assert!(anns[0].score.is_none());
        assert_eq!(image.width, 1654);
        assert!(image.location.ends_with("ar_2017_page_12.jpg"));
    }

    #[test]
    fn test_fake_score_deterministic() {
        let voc = VocAnnotation::parse(SAMPLE).unwrap();
        let mapper = mapper().with_fake_score(true);
        let first = mapper.map(&voc).unwrap().unwrap();
        let second = mapper.map(&voc).unwrap().unwrap();
        for (a, b) in first.annotations.iter().zip(&second.annotations) {
            let score = a.score.unwrap();
            assert!((0.0..1.0).contains(&score));
            assert_eq!(a.score, b.score);
        }
    }

    #[test]
    fn test_filter_empty_image() {
        let voc = VocAnnotation {
            filename: "empty.jpg".to_string(),
            width: 10,
            height: 10,
            objects: vec![],
        };
        assert!(mapper().map(&voc).unwrap().is_some());
        assert!(mapper()
            .with_filter_empty_image(true)
            .map(&voc)
            .unwrap()
            .is_none());
    }
}
