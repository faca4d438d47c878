//! Raster band and output raster types.

use std::collections::BTreeMap;

use mesh_common::{CrsCode, GeoTransform};

use crate::error::{RasterError, Result};

/// A named, dense 2-D grid of `f64` values stored row-major, row 0 north.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBand {
    name: String,
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl RasterBand {
    pub fn new(name: impl Into<String>, width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if data.len() != width * height {
            return Err(RasterError::shape_mismatch(format!(
                "band '{}' has {} values, expected {}x{}",
                name,
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            name,
            width,
            height,
            data,
        })
    }

    /// A band with every pixel set to `value`.
    pub fn filled(name: impl Into<String>, width: usize, height: usize, value: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.width + col] = value;
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Number of pixels holding a finite value other than `nodata`.
    pub fn count_valid(&self, nodata: f64) -> usize {
        self.data
            .iter()
            .filter(|v| v.is_finite() && **v != nodata)
            .count()
    }
}

/// Bands, georeferencing and provenance tags of one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRaster {
    bands: Vec<RasterBand>,
    pub transform: GeoTransform,
    pub crs: CrsCode,
    /// File-level tags, written verbatim.
    pub tags: BTreeMap<String, String>,
    pub nodata: Option<f64>,
}

impl OutputRaster {
    /// Assemble an output raster. All bands must share one shape.
    pub fn new(
        bands: Vec<RasterBand>,
        transform: GeoTransform,
        crs: CrsCode,
        tags: BTreeMap<String, String>,
        nodata: Option<f64>,
    ) -> Result<Self> {
        let first = bands
            .first()
            .ok_or_else(|| RasterError::shape_mismatch("raster has no bands"))?;
        let shape = first.shape();
        if shape.0 == 0 || shape.1 == 0 {
            return Err(RasterError::shape_mismatch("raster has zero width or height"));
        }
        if let Some(other) = bands.iter().find(|b| b.shape() != shape) {
            return Err(RasterError::shape_mismatch(format!(
                "band '{}' is {}x{} but band '{}' is {}x{}",
                other.name(),
                other.width(),
                other.height(),
                first.name(),
                shape.0,
                shape.1
            )));
        }

        Ok(Self {
            bands,
            transform,
            crs,
            tags,
            nodata,
        })
    }

    pub fn bands(&self) -> &[RasterBand] {
        &self.bands
    }

    pub fn band(&self, name: &str) -> Option<&RasterBand> {
        self.bands.iter().find(|b| b.name() == name)
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(RasterBand::name).collect()
    }

    pub fn width(&self) -> usize {
        self.bands[0].width()
    }

    pub fn height(&self) -> usize {
        self.bands[0].height()
    }
}
