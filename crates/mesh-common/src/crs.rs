//! Coordinate Reference System codes for output rasters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes an output raster can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// NAD83 Geographic
    Epsg4269,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Parse "EPSG:4326", "epsg:4326", "CRS:84" or a bare "4326".
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();
        let code = normalized.strip_prefix("EPSG:").unwrap_or(&normalized);

        match code {
            "4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "4269" => Ok(CrsCode::Epsg4269),
            "3857" | "900913" => Ok(CrsCode::Epsg3857),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Look up a CRS by its numeric EPSG code.
    pub fn from_epsg(code: u16) -> Result<Self, CrsParseError> {
        Self::parse(&code.to_string())
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u16 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg3857 => 3857,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }
}

impl Default for CrsCode {
    fn default() -> Self {
        CrsCode::Epsg4326
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
