//! Affine georeferencing for regular output grids.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// North-up affine transform from pixel space to geographic coordinates.
///
/// Follows the GDAL convention: `x = origin_x + col * pixel_width` and
/// `y = origin_y + row * pixel_height`, where `pixel_height` is negative
/// for north-up grids and `(col, row)` address pixel corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub origin_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build the transform that maps `bbox` onto a `width` x `height` grid.
    pub fn from_bounds(bbox: &BoundingBox, width: usize, height: usize) -> Self {
        Self {
            origin_x: bbox.min_x,
            pixel_width: bbox.width() / width as f64,
            origin_y: bbox.max_y,
            pixel_height: -bbox.height() / height as f64,
        }
    }

    /// Continuous pixel coordinates `(col, row)` of a geographic point.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Index `(row, col)` of the pixel containing a point, if it lies on the grid.
    pub fn pixel_index(&self, x: f64, y: f64, width: usize, height: usize) -> Option<(usize, usize)> {
        let (col, row) = self.world_to_pixel(x, y);
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }

        let (col, row) = (col.floor() as usize, row.floor() as usize);
        if col >= width || row >= height {
            return None;
        }
        Some((row, col))
    }

    /// Geographic coordinates of a pixel center.
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Geographic extent covered by a `width` x `height` grid.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let x1 = self.origin_x + width as f64 * self.pixel_width;
        let y1 = self.origin_y + height as f64 * self.pixel_height;
        BoundingBox::new(
            self.origin_x.min(x1),
            self.origin_y.min(y1),
            self.origin_x.max(x1),
            self.origin_y.max(y1),
        )
    }

    /// GDAL-ordered coefficients `[c, a, b, f, d, e]`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }
}
