//! Axis-aligned bounding boxes in absolute page coordinates.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// An axis-aligned box given by its upper-left and lower-right corners.
///
/// Coordinates are absolute pixels with the origin at the top-left corner of
/// the page; `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Upper-left x
    pub ulx: f32,
    /// Upper-left y
    pub uly: f32,
    /// Lower-right x
    pub lrx: f32,
    /// Lower-right y
    pub lry: f32,
}

impl BoundingBox {
    /// Create a box from corner coordinates.
    pub fn new(ulx: f32, uly: f32, lrx: f32, lry: f32) -> Result<Self> {
        if ![ulx, uly, lrx, lry].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidBoundingBox(format!(
                "non-finite coordinates ({ulx}, {uly}, {lrx}, {lry})"
            )));
        }
        if lrx < ulx || lry < uly {
            return Err(Error::InvalidBoundingBox(format!(
                "lower-right ({lrx}, {lry}) lies before upper-left ({ulx}, {uly})"
            )));
        }
        Ok(Self { ulx, uly, lrx, lry })
    }

    /// Create a box from its upper-left corner and size.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Result<Self> {
        Self::new(x, y, x + width, y + height)
    }

    /// Box width.
    pub fn width(&self) -> f32 {
        self.lrx - self.ulx
    }

    /// Box height.
    pub fn height(&self) -> f32 {
        self.lry - self.uly
    }

    /// Box area.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Center point as `(x, y)`.
    pub fn center(&self) -> (f32, f32) {
        ((self.ulx + self.lrx) / 2.0, (self.uly + self.lry) / 2.0)
    }

    /// Corners as `[ulx, uly, lrx, lry]`.
    pub fn to_xyxy(&self) -> [f32; 4] {
        [self.ulx, self.uly, self.lrx, self.lry]
    }

    /// Upper-left corner and size as `[x, y, width, height]`.
    pub fn to_xywh(&self) -> [f32; 4] {
        [self.ulx, self.uly, self.width(), self.height()]
    }

    /// Overlapping region of two boxes, if they overlap with positive area.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let ulx = self.ulx.max(other.ulx);
        let uly = self.uly.max(other.uly);
        let lrx = self.lrx.min(other.lrx);
        let lry = self.lry.min(other.lry);
        if lrx <= ulx || lry <= uly {
            return None;
        }
        Some(BoundingBox { ulx, uly, lrx, lry })
    }

    /// Area of the overlapping region (0 when disjoint).
    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        self.intersection(other).map(|b| b.area()).unwrap_or(0.0)
    }

    /// Intersection over union.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }

    /// Intersection over the area of `self`.
    ///
    /// Measures how much of this box lies inside `other`; used to decide
    /// whether a word belongs to a layout block or a cell to a row.
    pub fn ioa(&self, other: &BoundingBox) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / area
    }

    /// Smallest box enclosing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            ulx: self.ulx.min(other.ulx),
            uly: self.uly.min(other.uly),
            lrx: self.lrx.max(other.lrx),
            lry: self.lry.max(other.lry),
        }
    }

    /// Translate the box.
    pub fn shift(&self, dx: f32, dy: f32) -> BoundingBox {
        BoundingBox {
            ulx: self.ulx + dx,
            uly: self.uly + dy,
            lrx: self.lrx + dx,
            lry: self.lry + dy,
        }
    }

    /// Clip the box to `[0, width] x [0, height]`.
    pub fn clamp(&self, width: f32, height: f32) -> BoundingBox {
        let ulx = self.ulx.clamp(0.0, width);
        let uly = self.uly.clamp(0.0, height);
        BoundingBox {
            ulx,
            uly,
            lrx: self.lrx.clamp(ulx, width),
            lry: self.lry.clamp(uly, height),
        }
    }

    /// Length of the overlap of the two boxes projected on the y axis.
    pub fn vertical_overlap(&self, other: &BoundingBox) -> f32 {
        (self.lry.min(other.lry) - self.uly.max(other.uly)).max(0.0)
    }

    /// Length of the overlap of the two boxes projected on the x axis.
    pub fn horizontal_overlap(&self, other: &BoundingBox) -> f32 {
        (self.lrx.min(other.lrx) - self.ulx.max(other.ulx)).max(0.0)
    }

    /// Corners scaled into `0..=scale` relative to the page size.
    ///
    /// LayoutLM style models expect boxes on a 0..1000 grid.
    pub fn normalized(&self, width: u32, height: u32, scale: u32) -> [u32; 4] {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        let s = scale as f32;
        let norm = |v: f32, d: f32| ((v / d) * s).round().clamp(0.0, s) as u32;
        [
            norm(self.ulx, w),
            norm(self.uly, h),
            norm(self.lrx, w),
            norm(self.lry, h),
        ]
    }
}
