//! Table structure segmentation.
//!
//! Turns detected rows, columns and cells of a table into a numbered grid:
//! duplicated rows/columns are dropped, the survivors are optionally
//! stretched to tile the table, and every cell gets row/column numbers and
//! spans from the rows and columns it overlaps.

use super::{PipelineComponent, SegmentationConfig};
use crate::datapoint::{BoundingBox, CategoryName, Image, ImageAnnotation, SubCategoryKey};
use crate::error::Result;
use std::collections::HashSet;

/// Minimum ioa for rows/columns/cells without a parent link to count as inside a table.
const INSIDE_TABLE_THRESHOLD: f32 = 0.5;

/// Assigns row/column numbers and spans to table cells.
pub struct TableSegmentationService {
    config: SegmentationConfig,
}

#[derive(Debug, Clone)]
struct Item {
    id: String,
    bounding_box: BoundingBox,
    score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Rows,
    Columns,
}

impl TableSegmentationService {
    /// Create a segmentation service.
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Children of `table` in `category`, or items lying inside it that no
    /// other table has claimed.
    fn collect(&self, image: &Image, table_id: &str, table_box: &BoundingBox, category: &CategoryName) -> Vec<Item> {
        let to_item = |a: &ImageAnnotation| Item {
            id: a.annotation_id.clone(),
            bounding_box: a.bounding_box,
            score: a.score.unwrap_or(0.0),
        };
        let children: Vec<Item> = image
            .children_of_category(table_id, std::slice::from_ref(category))
            .into_iter()
            .map(to_item)
            .collect();
        if !children.is_empty() {
            return children;
        }
        let claimed: HashSet<&str> = image
            .get_annotation(std::slice::from_ref(&self.config.table))
            .into_iter()
            .filter(|t| t.annotation_id != table_id)
            .flat_map(|t| t.children.iter().map(String::as_str))
            .collect();
        image
            .get_annotation(std::slice::from_ref(category))
            .into_iter()
            .filter(|a| !claimed.contains(a.annotation_id.as_str()))
            .filter(|a| a.bounding_box.ioa(table_box) >= INSIDE_TABLE_THRESHOLD)
            .map(to_item)
            .collect()
    }

    /// Keep the highest-scored of overlapping items; return kept and dropped ids.
    fn remove_duplicates(&self, mut items: Vec<Item>) -> (Vec<Item>, Vec<String>) {
        items.sort_by(|a, b| b.score.total_cmp(&a.score));
        let mut kept: Vec<Item> = Vec::with_capacity(items.len());
        let mut dropped = Vec::new();
        for item in items {
            let duplicate = kept.iter().any(|k| {
                k.bounding_box.iou(&item.bounding_box) > self.config.remove_iou_threshold
            });
            if duplicate {
                dropped.push(item.id);
            } else {
                kept.push(item);
            }
        }
        (kept, dropped)
    }

    fn segment_table(&self, image: &mut Image, table_id: &str) -> Result<()> {
        let table_box = match image.annotation(table_id) {
            Some(table) => table.bounding_box,
            None => return Ok(()),
        };

        let rows = self.collect(image, table_id, &table_box, &self.config.row);
        let columns = self.collect(image, table_id, &table_box, &self.config.column);
        let (mut rows, dropped_rows) = self.remove_duplicates(rows);
        let (mut columns, dropped_columns) = self.remove_duplicates(columns);
        for id in dropped_rows.iter().chain(dropped_columns.iter()) {
            if let Some(ann) = image.annotation_mut(id) {
                ann.deactivate();
            }
        }

        rows.sort_by(|a, b| a.bounding_box.uly.total_cmp(&b.bounding_box.uly));
        columns.sort_by(|a, b| a.bounding_box.ulx.total_cmp(&b.bounding_box.ulx));
        if self.config.full_table_tiling {
            tile(&mut rows, &table_box, Axis::Rows);
            tile(&mut columns, &table_box, Axis::Columns);
        }

        for (items, key) in [
            (&rows, SubCategoryKey::RowNumber),
            (&columns, SubCategoryKey::ColumnNumber),
        ] {
            for (idx, item) in items.iter().enumerate() {
                if let Some(ann) = image.annotation_mut(&item.id) {
                    ann.bounding_box = item.bounding_box;
                    ann.set_number(key.clone(), idx as u32 + 1);
                }
                image.add_child(table_id, &item.id)?;
            }
        }

        let mut cells = self.collect(image, table_id, &table_box, &self.config.cell);
        if cells.is_empty() && !rows.is_empty() && !columns.is_empty() {
            for row in &rows {
                for column in &columns {
                    let Some(bounding_box) = row.bounding_box.intersection(&column.bounding_box)
                    else {
                        continue;
                    };
                    let id = image.dump(ImageAnnotation::new(self.config.cell.clone(), bounding_box));
                    cells.push(Item {
                        id,
                        bounding_box,
                        score: 0.0,
                    });
                }
            }
            log::debug!("created {} cells from rows and columns", cells.len());
        }

        for cell in &cells {
            image.add_child(table_id, &cell.id)?;
            let matched_rows = matches(&cell.bounding_box, &rows, self.config.row_threshold);
            let matched_columns =
                matches(&cell.bounding_box, &columns, self.config.column_threshold);
            let Some(ann) = image.annotation_mut(&cell.id) else {
                continue;
            };
            match (span(&matched_rows), span(&matched_columns)) {
                (Some((row, row_span)), Some((column, column_span))) => {
                    ann.set_number(SubCategoryKey::RowNumber, row);
                    ann.set_number(SubCategoryKey::RowSpan, row_span);
                    ann.set_number(SubCategoryKey::ColumnNumber, column);
                    ann.set_number(SubCategoryKey::ColumnSpan, column_span);
                }
                _ => ann.deactivate(),
            }
        }

        if let Some(table) = image.annotation_mut(table_id) {
            table.set_number(SubCategoryKey::NumberOfRows, rows.len() as u32);
            table.set_number(SubCategoryKey::NumberOfColumns, columns.len() as u32);
        }
        log::debug!(
            "table {}: {} rows, {} columns, {} cells",
            table_id,
            rows.len(),
            columns.len(),
            cells.len()
        );
        Ok(())
    }
}

impl Default for TableSegmentationService {
    fn default() -> Self {
        Self::new(SegmentationConfig::default())
    }
}

impl PipelineComponent for TableSegmentationService {
    fn name(&self) -> &str {
        "table_segment"
    }

    fn serve(&self, image: &mut Image) -> Result<()> {
        let tables = image.get_annotation_ids(std::slice::from_ref(&self.config.table));
        for table_id in tables {
            self.segment_table(image, &table_id)?;
        }
        Ok(())
    }
}

/// Stretch sorted items across the table and close the gaps between neighbours.
fn tile(items: &mut [Item], table: &BoundingBox, axis: Axis) {
    let n = items.len();
    if n == 0 {
        return;
    }
    let (start, end) = match axis {
        Axis::Rows => (table.uly, table.lry),
        Axis::Columns => (table.ulx, table.lrx),
    };

    let mut bounds: Vec<(f32, f32)> = items
        .iter()
        .map(|i| match axis {
            Axis::Rows => (i.bounding_box.uly, i.bounding_box.lry),
            Axis::Columns => (i.bounding_box.ulx, i.bounding_box.lrx),
        })
        .collect();
    bounds[0].0 = start;
    bounds[n - 1].1 = end;
    for i in 0..n - 1 {
        let mid = (bounds[i].1 + bounds[i + 1].0) / 2.0;
        bounds[i].1 = mid;
        bounds[i + 1].0 = mid;
    }

    for (item, (lo, hi)) in items.iter_mut().zip(bounds) {
        let hi = hi.max(lo);
        item.bounding_box = match axis {
            Axis::Rows => BoundingBox {
                ulx: table.ulx,
                uly: lo,
                lrx: table.lrx,
                lry: hi,
            },
            Axis::Columns => BoundingBox {
                ulx: lo,
                uly: table.uly,
                lrx: hi,
                lry: table.lry,
            },
        };
    }
}

/// 1-based numbers of the items the cell overlaps enough.
fn matches(cell: &BoundingBox, items: &[Item], threshold: f32) -> Vec<u32> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| cell.ioa(&item.bounding_box) >= threshold)
        .map(|(idx, _)| idx as u32 + 1)
        .collect()
}

/// First matched number and match count.
fn span(numbers: &[u32]) -> Option<(u32, u32)> {
    let first = numbers.iter().min()?;
    Some((*first, numbers.len() as u32))
}
