//! Annotation graph for page images.
//!
//! A datapoint is an [`Image`] carrying a flat list of [`ImageAnnotation`]s.
//! Structure (table → cells → words, layout block → words) is expressed with
//! child links between annotation ids, and per-annotation attributes such as
//! row numbers or reading order live in typed sub-categories. The page view in
//! [`crate::model`] is derived from this graph.

mod annotation;
mod bbox;
mod category;
mod image;

pub use annotation::{CategoryAnnotation, ImageAnnotation};
pub use bbox::BoundingBox;
pub use category::{CategoryName, SubCategoryKey};
pub use image::Image;

use md5::{Digest, Md5};

/// Build a deterministic, UUID-shaped identifier from the given parts.
///
/// The same parts always produce the same id, so re-running a pipeline on the
/// same input yields identical annotation ids.
pub fn get_uuid(parts: &[&str]) -> String {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    let hex = format!("{:x}", hasher.finalize());
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_uuid_is_deterministic() {
        let a = get_uuid(&["page.png", "TABLE", "1"]);
        let b = get_uuid(&["page.png", "TABLE", "1"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 36);
        assert_eq!(a.matches('-').count(), 4);
    }

    #[test]
    fn test_get_uuid_separates_parts() {
        assert_ne!(get_uuid(&["ab", "c"]), get_uuid(&["a", "bc"]));
    }
}
