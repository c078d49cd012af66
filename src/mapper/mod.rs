//! Mappers from raw annotation formats to datapoints.

mod pascal_voc;

pub use pascal_voc::{fake_score, VocAnnotation, VocMapper, VocObject};
