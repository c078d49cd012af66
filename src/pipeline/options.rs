//! Pipeline component options.

use crate::datapoint::CategoryName;

/// Which categories become page layouts, tables, cells and words.
#[derive(Debug, Clone, PartialEq)]
pub struct PageParsingConfig {
    /// Categories exposed as [`crate::Layout`]s
    pub text_blocks: Vec<CategoryName>,

    /// Table category
    pub table: CategoryName,

    /// Cell category
    pub cell: CategoryName,

    /// Word category
    pub word: CategoryName,
}

impl PageParsingConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text block categories.
    pub fn with_text_blocks(mut self, categories: Vec<CategoryName>) -> Self {
        self.text_blocks = categories;
        self
    }

    /// Set the table category.
    pub fn with_table(mut self, category: CategoryName) -> Self {
        self.table = category;
        self
    }
}

impl Default for PageParsingConfig {
    fn default() -> Self {
        Self {
            text_blocks: vec![
                CategoryName::Text,
                CategoryName::Title,
                CategoryName::List,
                CategoryName::Figure,
                CategoryName::Logo,
                CategoryName::Signature,
                CategoryName::Line,
            ],
            table: CategoryName::Table,
            cell: CategoryName::Cell,
            word: CategoryName::Word,
        }
    }
}

/// Overlap measure used to match children to parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchingRule {
    /// Intersection over union
    Iou,
    /// Intersection over the child's area
    #[default]
    Ioa,
}

/// Options for [`super::MatchingService`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    /// Parent categories
    pub parents: Vec<CategoryName>,

    /// Child categories
    pub children: Vec<CategoryName>,

    /// Overlap measure
    pub rule: MatchingRule,

    /// Minimum overlap to link a child
    pub threshold: f32,
}

impl MatchingConfig {
    /// Match `children` into `parents` with the default rule.
    pub fn new(parents: Vec<CategoryName>, children: Vec<CategoryName>) -> Self {
        Self {
            parents,
            children,
            ..Self::default()
        }
    }

    /// Set the overlap measure.
    pub fn with_rule(mut self, rule: MatchingRule) -> Self {
        self.rule = rule;
        self
    }

    /// Set the threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            parents: vec![
                CategoryName::Text,
                CategoryName::Title,
                CategoryName::List,
                CategoryName::Figure,
                CategoryName::Logo,
                CategoryName::Signature,
                CategoryName::Cell,
            ],
            children: vec![CategoryName::Word],
            rule: MatchingRule::Ioa,
            threshold: 0.6,
        }
    }
}

/// Options for [`super::TableSegmentationService`].
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationConfig {
    /// Table category
    pub table: CategoryName,

    /// Row category
    pub row: CategoryName,

    /// Column category
    pub column: CategoryName,

    /// Cell category
    pub cell: CategoryName,

    /// Minimum ioa of a cell against a row to assign it
    pub row_threshold: f32,

    /// Minimum ioa of a cell against a column to assign it
    pub column_threshold: f32,

    /// IoU above which a lower-scored row/column is dropped
    pub remove_iou_threshold: f32,

    /// Stretch rows/columns over the table and close the gaps between them
    pub full_table_tiling: bool,
}

impl SegmentationConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both cell assignment thresholds.
    pub fn with_thresholds(mut self, row: f32, column: f32) -> Self {
        self.row_threshold = row;
        self.column_threshold = column;
        self
    }

    /// Set the duplicate removal threshold.
    pub fn with_remove_iou_threshold(mut self, threshold: f32) -> Self {
        self.remove_iou_threshold = threshold;
        self
    }

    /// Enable or disable tiling.
    pub fn with_full_table_tiling(mut self, tiling: bool) -> Self {
        self.full_table_tiling = tiling;
        self
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            table: CategoryName::Table,
            row: CategoryName::Row,
            column: CategoryName::Column,
            cell: CategoryName::Cell,
            row_threshold: 0.4,
            column_threshold: 0.4,
            remove_iou_threshold: 0.5,
            full_table_tiling: true,
        }
    }
}

/// Options for [`super::TextOrderService`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfig {
    /// Blocks whose words are ordered and which are ordered on the page
    pub text_blocks: Vec<CategoryName>,

    /// Blocks ordered on the page whose words live in cells
    pub floating_blocks: Vec<CategoryName>,

    /// Cell category
    pub cell: CategoryName,

    /// Word category
    pub word: CategoryName,

    /// Minimum vertical overlap, as a share of the smaller height, to join a line
    pub line_overlap: f32,

    /// Minimum horizontal overlap, as a share of the narrower block, to share a column
    pub column_overlap: f32,

    /// Turn words outside every block into synthetic line layouts
    pub include_residual_text: bool,
}

impl OrderConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable residual text lines.
    pub fn with_residual_text(mut self, include: bool) -> Self {
        self.include_residual_text = include;
        self
    }

    /// Set the line overlap share.
    pub fn with_line_overlap(mut self, overlap: f32) -> Self {
        self.line_overlap = overlap;
        self
    }

    /// Set the column overlap share.
    pub fn with_column_overlap(mut self, overlap: f32) -> Self {
        self.column_overlap = overlap;
        self
    }
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            text_blocks: vec![
                CategoryName::Text,
                CategoryName::Title,
                CategoryName::List,
                CategoryName::Figure,
                CategoryName::Logo,
                CategoryName::Signature,
            ],
            floating_blocks: vec![CategoryName::Table],
            cell: CategoryName::Cell,
            word: CategoryName::Word,
            line_overlap: 0.5,
            column_overlap: 0.5,
            include_residual_text: true,
        }
    }
}
