//! JSON rendering for analyzed pages.

use crate::error::{Error, Result};
use crate::model::Page;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert the page view (layouts, tables, words) to JSON.
///
/// Use [`Page::save`] for the reloadable annotation graph.
pub fn to_json(page: &Page, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(page),
        JsonFormat::Compact => serde_json::to_string(page),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datapoint::{BoundingBox, CategoryName, Image, ImageAnnotation, SubCategoryKey};
    use crate::pipeline::PageParsingConfig;

    fn page() -> Page {
        let mut image = Image::new("p1.png", "/tmp/p1.png");
        image.width = 100;
        image.height = 100;
        let mut title = ImageAnnotation::new(
            CategoryName::Title,
            BoundingBox::new(10.0, 10.0, 90.0, 20.0).unwrap(),
        );
        title.set_number(SubCategoryKey::ReadingOrder, 1);
        image.dump(title);
        Page::from_image(image, &PageParsingConfig::default())
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&page(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"layouts\""));
        assert!(json.contains("p1.png"));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&page(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["layouts"][0]["reading_order"], 1);
    }
}
