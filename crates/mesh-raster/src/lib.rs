//! Mesh-to-raster conversion for unstructured ocean-model output.
//!
//! A UGRID domain file is turned into a regular, georeferenced, multi-band
//! GeoTIFF in five stages:
//!
//! 1. [`build_features`]: one point per face, at its centroid, carrying the
//!    selected fields at one timestep.
//! 2. [`build_mask_polygons`]: one polygon per face, shifted east by 360
//!    degrees when it meets the antimeridian.
//! 3. [`Rasterizer`]: burns points and polygons onto the fixed output grid,
//!    leaving uncovered pixels at nodata.
//! 4. [`fill_gaps`]: linear interpolation over the Delaunay triangulation of
//!    the burned pixels; the mask band becomes a 0/1 indicator instead.
//! 5. [`write_geotiff`]: float64 GeoTIFF with band names and provenance tags.
//!
//! [`convert_domain`] runs the whole chain for one file.

pub mod config;
pub mod derived;
pub mod error;
pub mod features;
pub mod interpolation;
pub mod layer;
pub mod pipeline;
pub mod polygon;
pub mod rasterize;
pub mod types;
pub mod writer;

pub use config::{Compression, ConversionConfig, DomainPolicy, TimestepSelection};
pub use derived::astronomical_band;
pub use error::{RasterError, Result};
pub use features::{build_features, Feature, FeatureSet};
pub use interpolation::{boundary_indicator, fill_gaps};
pub use layer::{LayerType, ASTRONOMICAL_BAND_NAME, MASK_BAND_NAME};
pub use pipeline::{
    build_output_raster, convert_domain, convert_domains, is_domain_file, provenance_tags,
    resolve_layer, select_domains, ConversionOutput, ANALYSIS_TIME_TAG, TIME_START_TAG,
};
pub use polygon::{build_mask_polygons, intersects_antimeridian, MaskPolygon};
pub use rasterize::Rasterizer;
pub use types::{OutputRaster, RasterBand};
pub use writer::{decode_geotiff, encode_geotiff, read_geotiff, write_geotiff, GdalMetadata};
