//! Configuration for mesh-to-raster conversion.

use mesh_common::{BoundingBox, CrsCode};
use serde::{Deserialize, Serialize};
use ugrid_parser::UgridError;

use crate::error::{RasterError, Result};
use crate::layer::LayerType;

/// Sentinel stored in pixels no geometry covered.
pub const DEFAULT_NODATA: f64 = -9999.0;

/// Default output grid dimension (both axes).
pub const DEFAULT_GRID_SIZE: usize = 1000;

/// Default file-name suffix that identifies a domain file.
pub const DEFAULT_DOMAIN_SUFFIX: &str = "waterlevel_00_fc.nc";

/// Configuration for one conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Output grid columns.
    pub width: usize,

    /// Output grid rows.
    pub height: usize,

    /// Geographic extent of the output grid, independent of the mesh extent.
    pub bounds: BoundingBox,

    /// Value of uncovered pixels in the sparse bands and the GDAL nodata tag.
    pub nodata: f64,

    /// Coordinate reference system of the output.
    pub crs: CrsCode,

    /// Which step of the time axis to rasterize.
    pub timestep: TimestepSelection,

    /// Force a layer instead of detecting it from the file name.
    pub layer: Option<LayerType>,

    /// Compression of the output strips.
    pub compression: Compression,

    /// Add `water_level - water_level_surge` as an extra band for water level layers.
    pub derive_astronomical: bool,

    /// What to do when several domain files are found.
    pub domain_policy: DomainPolicy,

    /// File-name suffix used to discover domain files.
    pub domain_suffix: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_SIZE,
            height: DEFAULT_GRID_SIZE,
            bounds: BoundingBox::web_tiles(),
            nodata: DEFAULT_NODATA,
            crs: CrsCode::Epsg4326,
            timestep: TimestepSelection::Latest,
            layer: None,
            compression: Compression::Deflate,
            derive_astronomical: false,
            domain_policy: DomainPolicy::FirstOnly,
            domain_suffix: DEFAULT_DOMAIN_SUFFIX.to_string(),
        }
    }
}

impl ConversionConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply any `RASTER_*` environment variables on top of this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("RASTER_WIDTH") {
            if let Ok(width) = val.parse() {
                self.width = width;
            }
        }

        if let Ok(val) = std::env::var("RASTER_HEIGHT") {
            if let Ok(height) = val.parse() {
                self.height = height;
            }
        }

        if let Ok(val) = std::env::var("RASTER_BOUNDS") {
            if let Ok(bounds) = BoundingBox::from_csv(&val) {
                self.bounds = bounds;
            }
        }

        if let Ok(val) = std::env::var("RASTER_NODATA") {
            if let Ok(nodata) = val.parse() {
                self.nodata = nodata;
            }
        }

        if let Ok(val) = std::env::var("RASTER_TIMESTEP") {
            if let Some(timestep) = TimestepSelection::parse(&val) {
                self.timestep = timestep;
            }
        }

        if let Ok(val) = std::env::var("RASTER_LAYER") {
            self.layer = LayerType::parse(&val);
        }

        if let Ok(val) = std::env::var("RASTER_COMPRESSION") {
            self.compression = Compression::from_str(&val);
        }

        if let Ok(val) = std::env::var("RASTER_DERIVE_ASTRONOMICAL") {
            self.derive_astronomical = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::Config(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }

        if !self.bounds.is_valid() {
            return Err(RasterError::Config(format!(
                "bounds {:?} are empty or inverted",
                self.bounds
            )));
        }

        if !self.nodata.is_finite() {
            return Err(RasterError::Config("nodata must be a finite value".to_string()));
        }

        if self.domain_suffix.is_empty() {
            return Err(RasterError::Config("domain_suffix must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Selection of one step on a dataset's time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestepSelection {
    /// The first step of a forecast file, the one closest to its analysis.
    Latest,
    /// An explicit zero-based index.
    Index(usize),
}

impl Default for TimestepSelection {
    fn default() -> Self {
        Self::Latest
    }
}

impl TimestepSelection {
    /// Parse `latest` or a non-negative index.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("latest") {
            return Some(Self::Latest);
        }
        s.parse().ok().map(Self::Index)
    }

    /// Resolve against a time axis of `n_times` steps.
    pub fn resolve(&self, n_times: usize) -> Result<usize> {
        let index = match self {
            Self::Latest => 0,
            Self::Index(i) => *i,
        };
        if index >= n_times {
            return Err(UgridError::variable_not_found(format!(
                "timestep {} (time axis has {} steps)",
                index, n_times
            ))
            .into());
        }
        Ok(index)
    }
}

/// Strip compression for the output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Uncompressed strips.
    None,
    /// Adobe Deflate (zlib).
    Deflate,
}

impl Default for Compression {
    fn default() -> Self {
        Self::Deflate
    }
}

impl Compression {
    /// Parse from string (case-insensitive), defaulting to deflate.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            _ => Self::Deflate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Deflate => "deflate",
        }
    }

    /// TIFF `Compression` tag value.
    pub fn tiff_code(&self) -> u16 {
        match self {
            Self::None => 1,
            Self::Deflate => 8,
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a set of domain files is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainPolicy {
    /// Convert only the first domain file; the rest are skipped and logged.
    FirstOnly,
    /// Convert every domain file independently, one output each.
    Each,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self::FirstOnly
    }
}
