//! Page-level types.

use super::table::{Cell, Table};
use super::word::{join_words, reading_cmp, sort_words, Word};
use crate::datapoint::{BoundingBox, CategoryName, Image, ImageAnnotation, SubCategoryKey};
use crate::error::Result;
use crate::pipeline::PageParsingConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A layout segment (text block, title, list, figure, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    /// Id of the underlying annotation
    pub annotation_id: String,

    /// Category of the segment
    pub layout_type: CategoryName,

    /// Location on the page
    pub bounding_box: BoundingBox,

    /// Detection confidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// 1-based position among the page's blocks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_order: Option<u32>,

    /// Words in reading order
    pub words: Vec<Word>,
}

impl Layout {
    /// Text of the segment, words joined by single spaces.
    pub fn text(&self) -> String {
        join_words(&self.words)
    }

    /// Check if the segment holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// A block of a page in reading order.
#[derive(Debug, Clone, Copy)]
pub enum Block<'a> {
    /// Layout segment
    Layout(&'a Layout),
    /// Table
    Table(&'a Table),
}

impl Block<'_> {
    fn reading_order(&self) -> Option<u32> {
        match self {
            Block::Layout(l) => l.reading_order,
            Block::Table(t) => t.reading_order,
        }
    }

    fn bounding_box(&self) -> &BoundingBox {
        match self {
            Block::Layout(l) => &l.bounding_box,
            Block::Table(t) => &t.bounding_box,
        }
    }

    /// Plain text of the block.
    pub fn text(&self) -> String {
        match self {
            Block::Layout(l) => l.text(),
            Block::Table(t) => t.plain_text(),
        }
    }
}

/// Result object for one analyzed page.
///
/// The page is a read-only view over its datapoint: layouts, tables, cells
/// and words are built from the annotation graph when the page is created.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// File name of the page image
    pub file_name: String,

    /// Path of the page image
    pub location: PathBuf,

    /// 1-based position of the page in its stream
    pub page_number: u32,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Layout segments sorted by reading order
    pub layouts: Vec<Layout>,

    /// Tables sorted by reading order
    pub tables: Vec<Table>,

    #[serde(skip)]
    datapoint: Image,
}

impl Page {
    /// Build the page view of an analyzed datapoint.
    pub fn from_image(image: Image, config: &PageParsingConfig) -> Self {
        let word_categories = [config.word.clone()];
        let cell_categories = [config.cell.clone()];

        let words_of = |ann: &ImageAnnotation| {
            let mut words: Vec<Word> = image
                .children_of_category(&ann.annotation_id, &word_categories)
                .into_iter()
                .map(Word::from_annotation)
                .collect();
            sort_words(&mut words);
            words
        };

        let mut layouts: Vec<Layout> = image
            .get_annotation(&config.text_blocks)
            .into_iter()
            .map(|ann| Layout {
                annotation_id: ann.annotation_id.clone(),
                layout_type: ann.category_name.clone(),
                bounding_box: ann.bounding_box,
                score: ann.score,
                reading_order: ann.number(&SubCategoryKey::ReadingOrder),
                words: words_of(ann),
            })
            .collect();
        layouts.sort_by(|a, b| {
            reading_cmp(
                a.reading_order,
                &a.bounding_box,
                b.reading_order,
                &b.bounding_box,
            )
        });

        let mut tables: Vec<Table> = image
            .get_annotation(std::slice::from_ref(&config.table))
            .into_iter()
            .map(|ann| {
                let mut cells: Vec<Cell> = image
                    .children_of_category(&ann.annotation_id, &cell_categories)
                    .into_iter()
                    .map(|cell| Cell {
                        annotation_id: cell.annotation_id.clone(),
                        bounding_box: cell.bounding_box,
                        score: cell.score,
                        row_number: cell.number(&SubCategoryKey::RowNumber).unwrap_or(0),
                        column_number: cell.number(&SubCategoryKey::ColumnNumber).unwrap_or(0),
                        row_span: cell.number(&SubCategoryKey::RowSpan).unwrap_or(1),
                        column_span: cell.number(&SubCategoryKey::ColumnSpan).unwrap_or(1),
                        words: words_of(cell),
                    })
                    .collect();
                cells.sort_by_key(|c| (c.row_number, c.column_number));

                let number_of_rows = ann
                    .number(&SubCategoryKey::NumberOfRows)
                    .unwrap_or_else(|| extent(&cells, |c| (c.row_number, c.row_span)));
                let number_of_columns = ann
                    .number(&SubCategoryKey::NumberOfColumns)
                    .unwrap_or_else(|| extent(&cells, |c| (c.column_number, c.column_span)));

                Table {
                    annotation_id: ann.annotation_id.clone(),
                    bounding_box: ann.bounding_box,
                    score: ann.score,
                    reading_order: ann.number(&SubCategoryKey::ReadingOrder),
                    number_of_rows,
                    number_of_columns,
                    cells,
                }
            })
            .collect();
        tables.sort_by(|a, b| {
            reading_cmp(
                a.reading_order,
                &a.bounding_box,
                b.reading_order,
                &b.bounding_box,
            )
        });

        Self {
            file_name: image.file_name.clone(),
            location: image.location.clone(),
            page_number: image.page_number,
            width: image.width,
            height: image.height,
            layouts,
            tables,
            datapoint: image,
        }
    }

    /// Load a page written by [`Page::save`].
    ///
    /// The view is rebuilt with the default [`PageParsingConfig`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = Image::load(path)?;
        Ok(Self::from_image(image, &PageParsingConfig::default()))
    }

    /// Write the page's datapoint to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P, with_image: bool) -> Result<()> {
        log::debug!("saving page {} to {}", self.page_number, path.as_ref().display());
        self.datapoint.save(path, with_image)
    }

    /// The underlying datapoint.
    pub fn image(&self) -> &Image {
        &self.datapoint
    }

    /// Consume the page and return its datapoint.
    pub fn into_image(self) -> Image {
        self.datapoint
    }

    /// Layouts and tables interleaved in reading order.
    pub fn blocks(&self) -> Vec<Block<'_>> {
        let mut blocks: Vec<Block<'_>> = self
            .layouts
            .iter()
            .map(Block::Layout)
            .chain(self.tables.iter().map(Block::Table))
            .collect();
        blocks.sort_by(|a, b| {
            reading_cmp(
                a.reading_order(),
                a.bounding_box(),
                b.reading_order(),
                b.bounding_box(),
            )
        });
        blocks
    }

    /// Text of the page, one block per line.
    pub fn text(&self) -> String {
        self.blocks()
            .iter()
            .map(|b| b.text())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Every word on the page: layout words first, then table cell words.
    pub fn words(&self) -> Vec<&Word> {
        self.layouts
            .iter()
            .flat_map(|l| l.words.iter())
            .chain(
                self.tables
                    .iter()
                    .flat_map(|t| t.cells.iter())
                    .flat_map(|c| c.words.iter()),
            )
            .collect()
    }

    /// Layouts of one category.
    pub fn layouts_of(&self, category: &CategoryName) -> Vec<&Layout> {
        self.layouts
            .iter()
            .filter(|l| &l.layout_type == category)
            .collect()
    }

    /// Check if the page has no layouts and no tables.
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty() && self.tables.is_empty()
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        let images_match = match (self.datapoint.image_bytes(), other.datapoint.image_bytes()) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        self.file_name == other.file_name
            && self.location == other.location
            && self.page_number == other.page_number
            && self.width == other.width
            && self.height == other.height
            && self.layouts == other.layouts
            && self.tables == other.tables
            && images_match
    }
}

fn extent(cells: &[Cell], position: impl Fn(&Cell) -> (u32, u32)) -> u32 {
    cells
        .iter()
        .map(|c| {
            let (start, span) = position(c);
            start.saturating_add(span.max(1) - 1)
        })
        .max()
        .unwrap_or(0)
}
