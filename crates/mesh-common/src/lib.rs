//! Common types and utilities shared across the mesh-to-raster crates.

pub mod bbox;
pub mod crs;
pub mod grid;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use grid::GeoTransform;
pub use time::{format_file_time, format_tag_time, CfTimeUnits, TimeParseError, TimeUnit};
