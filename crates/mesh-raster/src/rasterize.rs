//! Burn point features and mask polygons onto a regular grid.
//!
//! Geometries are burned in iteration order; where two cover the same pixel
//! the later one wins. Uncovered pixels keep the nodata value.

use mesh_common::{BoundingBox, GeoTransform};
use tracing::debug;

use crate::config::ConversionConfig;
use crate::polygon::MaskPolygon;
use crate::types::RasterBand;

/// Fixed-shape target grid plus its georeferencing.
#[derive(Debug, Clone, Copy)]
pub struct Rasterizer {
    width: usize,
    height: usize,
    transform: GeoTransform,
    nodata: f64,
}

impl Rasterizer {
    pub fn new(width: usize, height: usize, transform: GeoTransform, nodata: f64) -> Self {
        Self {
            width,
            height,
            transform,
            nodata,
        }
    }

    /// Grid mapping `bounds` onto `width` x `height` pixels.
    pub fn from_bounds(bounds: &BoundingBox, width: usize, height: usize, nodata: f64) -> Self {
        Self::new(width, height, GeoTransform::from_bounds(bounds, width, height), nodata)
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::from_bounds(&config.bounds, config.width, config.height, config.nodata)
    }

    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    fn empty_band(&self, name: &str) -> RasterBand {
        RasterBand::filled(name, self.width, self.height, self.nodata)
    }

    /// Burn each point's value into the pixel containing it.
    ///
    /// Points off the grid and non-finite values are skipped.
    pub fn rasterize_points<I>(&self, name: &str, shapes: I) -> RasterBand
    where
        I: IntoIterator<Item = ((f64, f64), f64)>,
    {
        let mut band = self.empty_band(name);
        let mut burned = 0usize;

        for ((x, y), value) in shapes {
            if !value.is_finite() {
                continue;
            }
            if let Some((row, col)) = self.transform.pixel_index(x, y, self.width, self.height) {
                band.set(row, col, value);
                burned += 1;
            }
        }

        debug!(band = name, burned, "Rasterized points");
        band
    }

    /// Burn each polygon's value into every pixel whose center it contains.
    pub fn rasterize_polygons<'a, I>(&self, name: &str, shapes: I) -> RasterBand
    where
        I: IntoIterator<Item = (&'a MaskPolygon, f64)>,
    {
        let mut band = self.empty_band(name);
        let mut burned = 0usize;

        for (polygon, value) in shapes {
            let Some((rows, cols)) = self.pixel_window(polygon) else {
                continue;
            };
            for row in rows {
                for col in cols.clone() {
                    let (x, y) = self.transform.pixel_center(row, col);
                    if polygon.contains(x, y) {
                        band.set(row, col, value);
                        burned += 1;
                    }
                }
            }
        }

        debug!(band = name, burned, "Rasterized polygons");
        band
    }

    /// Burn every mask polygon with its face index.
    pub fn rasterize_mask(&self, name: &str, polygons: &[MaskPolygon]) -> RasterBand {
        self.rasterize_polygons(name, polygons.iter().map(|p| (p, p.face() as f64)))
    }

    /// Rows and columns whose pixel centers can fall inside the polygon's extent.
    fn pixel_window(
        &self,
        polygon: &MaskPolygon,
    ) -> Option<(std::ops::RangeInclusive<usize>, std::ops::RangeInclusive<usize>)> {
        let (min_x, min_y, max_x, max_y) = polygon.extent();
        let (c0, r0) = self.transform.world_to_pixel(min_x, max_y);
        let (c1, r1) = self.transform.world_to_pixel(max_x, min_y);

        let cols = center_range(c0.min(c1), c0.max(c1), self.width)?;
        let rows = center_range(r0.min(r1), r0.max(r1), self.height)?;
        Some((rows, cols))
    }
}

/// Indices `i` in `0..len` with `lo <= i + 0.5 <= hi`.
fn center_range(lo: f64, hi: f64, len: usize) -> Option<std::ops::RangeInclusive<usize>> {
    if !lo.is_finite() || !hi.is_finite() || len == 0 {
        return None;
    }
    let start = (lo - 0.5).ceil().max(0.0);
    let end = (hi - 0.5).floor().min((len - 1) as f64);
    if start > end {
        return None;
    }
    Some(start as usize..=end as usize)
}
