//! Reading order inference.
//!
//! Words are ordered inside their block (line by line, left to right) and
//! blocks are ordered on the page column by column. Words that belong to
//! no block can be collected into synthetic line layouts first so that no
//! text is lost.

use super::{OrderConfig, PipelineComponent};
use crate::datapoint::{BoundingBox, CategoryName, Image, ImageAnnotation, SubCategoryKey};
use crate::error::Result;
use std::collections::{BTreeMap, HashSet};

type Located = (String, BoundingBox);

/// Assigns `ReadingOrder` to words and blocks.
pub struct TextOrderService {
    config: OrderConfig,
}

impl TextOrderService {
    /// Create a reading order service.
    pub fn new(config: OrderConfig) -> Self {
        Self { config }
    }

    fn block_categories(&self) -> Vec<CategoryName> {
        let mut categories = self.config.text_blocks.clone();
        if !categories.contains(&CategoryName::Line) {
            categories.push(CategoryName::Line);
        }
        categories
    }

    fn number_words(&self, image: &mut Image, words: Vec<Located>) {
        let ordered = group_lines(words, self.config.line_overlap)
            .into_iter()
            .flatten();
        for (idx, (id, _)) in ordered.enumerate() {
            if let Some(word) = image.annotation_mut(&id) {
                word.set_number(SubCategoryKey::ReadingOrder, idx as u32 + 1);
            }
        }
    }
}

impl Default for TextOrderService {
    fn default() -> Self {
        Self::new(OrderConfig::default())
    }
}

impl PipelineComponent for TextOrderService {
    fn name(&self) -> &str {
        "text_order"
    }

    fn serve(&self, image: &mut Image) -> Result<()> {
        let word_categories = [self.config.word.clone()];
        let mut blocks = located(image, &self.block_categories());
        let containers: Vec<String> = blocks
            .iter()
            .map(|(id, _)| id.clone())
            .chain(image.get_annotation_ids(std::slice::from_ref(&self.config.cell)))
            .collect();

        let mut claimed = HashSet::new();
        for container in containers {
            let words: Vec<Located> = image
                .children_of_category(&container, &word_categories)
                .into_iter()
                .map(|a| (a.annotation_id.clone(), a.bounding_box))
                .collect();
            claimed.extend(words.iter().map(|(id, _)| id.clone()));
            self.number_words(image, words);
        }

        let residual: Vec<Located> = located(image, &word_categories)
            .into_iter()
            .filter(|(id, _)| !claimed.contains(id))
            .collect();
        if self.config.include_residual_text && !residual.is_empty() {
            let lines = group_lines(residual, self.config.line_overlap);
            log::debug!("text_order: {} residual lines on {}", lines.len(), image.file_name);
            for line in lines {
                let Some(bounding_box) = line.iter().map(|(_, b)| *b).reduce(|a, b| a.union(&b))
                else {
                    continue;
                };
                let line_id = image.dump(ImageAnnotation::new(CategoryName::Line, bounding_box));
                for (idx, (word_id, _)) in line.iter().enumerate() {
                    image.add_child(&line_id, word_id)?;
                    if let Some(word) = image.annotation_mut(word_id) {
                        word.set_number(SubCategoryKey::ReadingOrder, idx as u32 + 1);
                    }
                }
                blocks.push((line_id, bounding_box));
            }
        }

        blocks.extend(located(image, &self.config.floating_blocks));
        let boxes: Vec<BoundingBox> = blocks.iter().map(|(_, b)| *b).collect();
        for (position, idx) in order_blocks(&boxes, self.config.column_overlap)
            .into_iter()
            .enumerate()
        {
            if let Some(block) = image.annotation_mut(&blocks[idx].0) {
                block.set_number(SubCategoryKey::ReadingOrder, position as u32 + 1);
            }
        }
        Ok(())
    }
}

fn located(image: &Image, categories: &[CategoryName]) -> Vec<Located> {
    image
        .get_annotation(categories)
        .into_iter()
        .map(|a| (a.annotation_id.clone(), a.bounding_box))
        .collect()
}

/// Group words into lines, top to bottom, each line left to right.
fn group_lines(mut words: Vec<Located>, overlap_share: f32) -> Vec<Vec<Located>> {
    words.sort_by(|a, b| a.1.center().1.total_cmp(&b.1.center().1));

    let mut lines: Vec<(BoundingBox, Vec<Located>)> = Vec::new();
    for word in words {
        if let Some((line_box, members)) = lines.last_mut() {
            let overlap = word.1.vertical_overlap(line_box);
            let smaller = word.1.height().min(line_box.height());
            if overlap > 0.0 && overlap >= overlap_share * smaller {
                *line_box = line_box.union(&word.1);
                members.push(word);
                continue;
            }
        }
        lines.push((word.1, vec![word]));
    }

    lines
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|a, b| a.1.ulx.total_cmp(&b.1.ulx));
            members
        })
        .collect()
}

/// Indices of `boxes` in reading order.
///
/// Blocks whose x-ranges overlap by at least `overlap_share` of the narrower
/// one share a column (transitively). Columns are read left to right and
/// blocks inside a column top to bottom.
fn order_blocks(boxes: &[BoundingBox], overlap_share: f32) -> Vec<usize> {
    let n = boxes.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let overlap = boxes[i].horizontal_overlap(&boxes[j]);
            let narrower = boxes[i].width().min(boxes[j].width());
            if overlap > 0.0 && overlap >= overlap_share * narrower {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[b] = a;
                }
            }
        }
    }

    let mut columns: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        columns.entry(root).or_default().push(i);
    }

    let mut columns: Vec<Vec<usize>> = columns.into_values().collect();
    for column in &mut columns {
        column.sort_by(|&a, &b| {
            boxes[a]
                .uly
                .total_cmp(&boxes[b].uly)
                .then(boxes[a].ulx.total_cmp(&boxes[b].ulx))
        });
    }
    let left = |column: &Vec<usize>| {
        column
            .iter()
            .map(|&i| boxes[i].ulx)
            .fold(f32::INFINITY, f32::min)
    };
    columns.sort_by(|a, b| left(a).total_cmp(&left(b)));
    columns.into_iter().flatten().collect()
}
