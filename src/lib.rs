//! # docsift
//!
//! Document layout analysis pipeline for Rust.
//!
//! An [`Analyzer`] is built once from pluggable model backends (layout
//! detectors, OCR engines, token classifiers) and applied to directories of
//! page images. Each page comes back as a [`Page`] holding its layout
//! segments, tables with cells, and words in an inferred reading order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docsift::{render, Analyzer, AnalyzerConfig};
//!
//! fn main() -> docsift::Result<()> {
//!     let analyzer = Analyzer::builder()
//!         .with_config(AnalyzerConfig::new().lenient())
//!         .build();
//!
//!     for page in analyzer.analyze("scans/")? {
//!         let page = page?;
//!         let markdown = render::to_markdown(&page, &render::RenderOptions::default())?;
//!         println!("{}", markdown);
//!         page.save(format!("out/page_{}.json", page.page_number), true)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Annotation graph**: pages as datapoints with deterministic ids
//! - **Table segmentation**: rows, columns, cells and spans
//! - **Reading order**: column-aware ordering of blocks and words
//! - **Dataset dataflows**: lazy Pascal VOC datasets with a registry
//! - **Parallel processing**: rayon batches and ordered worker threads

pub mod analyzer;
pub mod backend;
pub mod dataflow;
pub mod datapoint;
pub mod datasets;
pub mod detect;
pub mod error;
pub mod mapper;
pub mod model;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerConfig, ErrorMode, PageStream};
pub use backend::{ObjectDetector, TextRecognizer, TokenClassifier};
pub use dataflow::{DataFlow, DataFlowExt};
pub use datapoint::{BoundingBox, CategoryName, Image, ImageAnnotation, SubCategoryKey};
pub use datasets::{BuildOptions, Dataset, DatasetRegistry};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_image_path, ImageFormat};
pub use error::{Error, Result};
pub use model::{Block, Cell, Layout, Page, Table, Word};
pub use pipeline::PipelineComponent;
pub use render::{JsonFormat, PageSelection, RenderOptions, TableFallback};

use std::path::Path;

/// Load a page saved with [`Page::save`].
///
/// # Example
///
/// ```no_run
/// use docsift::load_page;
///
/// let page = load_page("out/page_1.json").unwrap();
/// println!("{} tables", page.tables.len());
/// ```
pub fn load_page<P: AsRef<Path>>(path: P) -> Result<Page> {
    Page::from_file(path)
}

/// Render a saved page as plain text.
///
/// # Example
///
/// ```no_run
/// use docsift::{extract_text, RenderOptions};
///
/// let text = extract_text("out/page_1.json", &RenderOptions::default()).unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String> {
    let page = load_page(path)?;
    render::to_text(&page, options)
}

/// Render a saved page as Markdown.
///
/// # Example
///
/// ```no_run
/// use docsift::{to_markdown, RenderOptions};
///
/// let options = RenderOptions::new().with_frontmatter(true);
/// let markdown = to_markdown("out/page_1.json", &options).unwrap();
/// std::fs::write("page_1.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String> {
    let page = load_page(path)?;
    render::to_markdown(&page, options)
}

/// Render a saved page view as JSON.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let page = load_page(path)?;
    render::to_json(&page, format)
}
