//! Markdown rendering for analyzed pages.

use crate::datapoint::CategoryName;
use crate::error::Result;
use crate::model::{Block, Layout, Page, Table};

use super::{RenderOptions, TableFallback};

/// Convert a page to Markdown.
pub fn to_markdown(page: &Page, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render(page)
}

/// Render several pages, separated by a horizontal rule.
pub fn to_markdown_pages(pages: &[Page], options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    let mut parts = Vec::new();
    for page in pages {
        let markdown = renderer.render(page)?;
        if !markdown.is_empty() {
            parts.push(markdown);
        }
    }
    Ok(parts.join("\n\n---\n\n"))
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render one page. Pages outside the selection render as empty.
    pub fn render(&self, page: &Page) -> Result<String> {
        if !self.options.page_selection.includes(page.page_number) {
            return Ok(String::new());
        }

        let mut output = String::new();
        if self.options.include_frontmatter {
            output.push_str(&frontmatter(page));
        }
        for block in page.blocks() {
            match block {
                Block::Layout(layout) => self.render_layout(&mut output, layout),
                Block::Table(table) => self.render_table(&mut output, table),
            }
        }
        Ok(output.trim().to_string())
    }

    fn render_layout(&self, output: &mut String, layout: &Layout) {
        let text = layout.text();
        if text.is_empty() {
            return;
        }
        let text = escape_markdown(&text);
        match layout.layout_type {
            CategoryName::Title => {
                output.push_str("## ");
                output.push_str(&text);
                output.push_str("\n\n");
            }
            CategoryName::List => {
                output.push_str("- ");
                output.push_str(&text);
                output.push_str("\n\n");
            }
            _ => {
                output.push_str(&text);
                output.push_str("\n\n");
            }
        }
    }

    fn render_table(&self, output: &mut String, table: &Table) {
        if table.is_empty() || table.number_of_columns == 0 {
            return;
        }

        if table.has_merged_cells() || self.options.table_fallback == TableFallback::Html {
            output.push_str(&table.html());
            output.push_str("\n\n");
            return;
        }

        for (i, row) in table.grid().iter().enumerate() {
            output.push('|');
            for cell in row {
                let content = escape_markdown(cell).replace('\n', " ");
                output.push_str(&format!(" {} |", content.trim()));
            }
            output.push('\n');

            if i == 0 {
                output.push('|');
                output.push_str(&" --- |".repeat(row.len()));
                output.push('\n');
            }
        }
        output.push('\n');
    }
}

fn frontmatter(page: &Page) -> String {
    format!(
        "---\nfile_name: \"{}\"\npage_number: {}\nwidth: {}\nheight: {}\n---\n\n",
        page.file_name.replace('"', "\\\""),
        page.page_number,
        page.width,
        page.height
    )
}

/// Escape characters that could be read as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
