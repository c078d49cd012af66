//! Category and sub-category names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an image annotation.
///
/// Serialized as an upper-case string; unknown names are kept verbatim in
/// [`CategoryName::Other`], so datasets may introduce their own labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryName {
    /// Body text block
    Text,
    /// Heading
    Title,
    /// List block
    List,
    /// Table region
    Table,
    /// Figure or natural image
    Figure,
    /// Company logo
    Logo,
    /// Handwritten signature
    Signature,
    /// Table cell
    Cell,
    /// Table row
    Row,
    /// Table column
    Column,
    /// Single word token
    Word,
    /// Text line built from words outside any layout block
    Line,
    /// Any other label
    Other(String),
}

impl CategoryName {
    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        match self {
            CategoryName::Text => "TEXT",
            CategoryName::Title => "TITLE",
            CategoryName::List => "LIST",
            CategoryName::Table => "TABLE",
            CategoryName::Figure => "FIGURE",
            CategoryName::Logo => "LOGO",
            CategoryName::Signature => "SIGNATURE",
            CategoryName::Cell => "CELL",
            CategoryName::Row => "ROW",
            CategoryName::Column => "COLUMN",
            CategoryName::Word => "WORD",
            CategoryName::Line => "LINE",
            CategoryName::Other(name) => name,
        }
    }

    /// Parse a label, case-insensitively, accepting common short aliases.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_uppercase().as_str() {
            "TEXT" => CategoryName::Text,
            "TITLE" => CategoryName::Title,
            "LIST" => CategoryName::List,
            "TABLE" | "TAB" => CategoryName::Table,
            "FIGURE" | "FIG" => CategoryName::Figure,
            "LOGO" => CategoryName::Logo,
            "SIGNATURE" | "SIGN" => CategoryName::Signature,
            "CELL" => CategoryName::Cell,
            "ROW" => CategoryName::Row,
            "COLUMN" | "COL" => CategoryName::Column,
            "WORD" => CategoryName::Word,
            "LINE" => CategoryName::Line,
            _ => CategoryName::Other(name.trim().to_string()),
        }
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for CategoryName {
    fn from(name: String) -> Self {
        CategoryName::parse(&name)
    }
}

impl From<&str> for CategoryName {
    fn from(name: &str) -> Self {
        CategoryName::parse(name)
    }
}

impl From<CategoryName> for String {
    fn from(name: CategoryName) -> Self {
        name.as_str().to_string()
    }
}

/// Key of a sub-category attached to an annotation or to a datapoint summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubCategoryKey {
    /// 1-based row index of a cell or row
    RowNumber,
    /// 1-based column index of a cell or column
    ColumnNumber,
    /// Number of rows a cell spans
    RowSpan,
    /// Number of columns a cell spans
    ColumnSpan,
    /// 1-based reading position
    ReadingOrder,
    /// Text content of a word
    Characters,
    /// Semantic token class (e.g. `QUESTION`)
    TokenClass,
    /// BIO tag of a token class (`B`, `I`, `O`)
    TokenTag,
    /// Number of rows of a table
    NumberOfRows,
    /// Number of columns of a table
    NumberOfColumns,
    /// Any other key
    Other(String),
}

impl SubCategoryKey {
    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        match self {
            SubCategoryKey::RowNumber => "row_number",
            SubCategoryKey::ColumnNumber => "column_number",
            SubCategoryKey::RowSpan => "row_span",
            SubCategoryKey::ColumnSpan => "column_span",
            SubCategoryKey::ReadingOrder => "reading_order",
            SubCategoryKey::Characters => "characters",
            SubCategoryKey::TokenClass => "token_class",
            SubCategoryKey::TokenTag => "token_tag",
            SubCategoryKey::NumberOfRows => "number_of_rows",
            SubCategoryKey::NumberOfColumns => "number_of_columns",
            SubCategoryKey::Other(key) => key,
        }
    }
}

impl fmt::Display for SubCategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SubCategoryKey {
    fn from(key: String) -> Self {
        match key.as_str() {
            "row_number" => SubCategoryKey::RowNumber,
            "column_number" => SubCategoryKey::ColumnNumber,
            "row_span" => SubCategoryKey::RowSpan,
            "column_span" => SubCategoryKey::ColumnSpan,
            "reading_order" => SubCategoryKey::ReadingOrder,
            "characters" => SubCategoryKey::Characters,
            "token_class" => SubCategoryKey::TokenClass,
            "token_tag" => SubCategoryKey::TokenTag,
            "number_of_rows" => SubCategoryKey::NumberOfRows,
            "number_of_columns" => SubCategoryKey::NumberOfColumns,
            _ => SubCategoryKey::Other(key),
        }
    }
}

impl From<SubCategoryKey> for String {
    fn from(key: SubCategoryKey) -> Self {
        key.as_str().to_string()
    }
}
