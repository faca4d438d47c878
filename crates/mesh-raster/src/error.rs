//! Error types for mesh rasterization.

use thiserror::Error;
use ugrid_parser::UgridError;

/// Errors that can occur while converting a mesh to a raster.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Loading the mesh dataset failed (malformed mesh, missing variable, bad timestep).
    #[error(transparent)]
    Ugrid(#[from] UgridError),

    /// A face ring has fewer than three distinct vertices.
    #[error("face {face} is degenerate: {distinct} distinct vertices")]
    DegenerateGeometry { face: usize, distinct: usize },

    /// A face still touches the antimeridian after being shifted by +360.
    #[error("face {face} still crosses the antimeridian after shifting")]
    UnresolvedAntimeridian { face: usize },

    /// Bands or inputs disagree in shape.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Scattered-data interpolation could not be set up.
    #[error("interpolation error: {0}")]
    Interpolation(String),

    /// The output raster could not be created or finalized.
    #[error("failed to write raster: {0}")]
    RasterWrite(String),

    /// A raster file could not be decoded.
    #[error("failed to read raster: {0}")]
    RasterRead(String),

    /// Invalid conversion configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RasterError {
    pub fn raster_write(msg: impl Into<String>) -> Self {
        Self::RasterWrite(msg.into())
    }

    pub fn raster_read(msg: impl Into<String>) -> Self {
        Self::RasterRead(msg.into())
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }
}

/// Result type for mesh rasterization.
pub type Result<T> = std::result::Result<T, RasterError>;
