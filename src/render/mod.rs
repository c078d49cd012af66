//! Rendering module for converting analyzed pages to output formats.

mod json;
mod markdown;
mod options;
mod text;

pub use json::{to_json, JsonFormat};
pub use markdown::{to_markdown, to_markdown_pages, MarkdownRenderer};
pub use options::{PageSelection, RenderOptions, TableFallback};
pub use text::{to_text, to_text_pages};
