//! Plain text rendering for analyzed pages.

use crate::error::{Error, Result};
use crate::model::Page;
use regex::Regex;

use super::RenderOptions;

/// Convert a page to plain text, one block per line.
///
/// Runs of spaces are collapsed and at most one blank line is kept between
/// blocks. Table cells stay tab-separated.
pub fn to_text(page: &Page, options: &RenderOptions) -> Result<String> {
    if !options.page_selection.includes(page.page_number) {
        return Ok(String::new());
    }
    collapse_whitespace(&page.text())
}

/// Render several pages, separated by a blank line.
pub fn to_text_pages(pages: &[Page], options: &RenderOptions) -> Result<String> {
    let mut parts = Vec::new();
    for page in pages {
        let text = to_text(page, options)?;
        if !text.is_empty() {
            parts.push(text);
        }
    }
    Ok(parts.join("\n\n"))
}

fn collapse_whitespace(text: &str) -> Result<String> {
    let spaces = Regex::new(r" {2,}").map_err(|e| Error::Render(e.to_string()))?;
    let blank_lines = Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").map_err(|e| Error::Render(e.to_string()))?;
    let collapsed = spaces.replace_all(text, " ");
    let collapsed = blank_lines.replace_all(&collapsed, "\n\n");
    Ok(collapsed.trim().to_string())
}
