//! Layer types: which pair of model fields a domain file carries.

use chrono::{DateTime, Utc};
use mesh_common::format_file_time;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Band name of the boundary-mask indicator, always the last band.
pub const MASK_BAND_NAME: &str = "boundary_mask";

/// Band name of the derived astronomical tide.
pub const ASTRONOMICAL_BAND_NAME: &str = "water_level_astronomical";

/// A model output layer and its fixed two-variable convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Total water level and its surge component.
    Waterlevel,
    /// Eastward and northward depth-averaged currents.
    Currents,
}

impl LayerType {
    /// Field names in output band order.
    pub fn variables(&self) -> [&'static str; 2] {
        match self {
            Self::Waterlevel => ["water_level", "water_level_surge"],
            Self::Currents => ["currents_u", "currents_v"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waterlevel => "waterlevel",
            Self::Currents => "currents",
        }
    }

    /// Parse a layer name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "waterlevel" => Some(Self::Waterlevel),
            "currents" => Some(Self::Currents),
            _ => None,
        }
    }

    /// Detect the layer from a domain file name such as
    /// `glossis_waterlevel_00_fc.nc`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.contains("currents") {
            Some(Self::Currents)
        } else if name.contains("waterlevel") {
            Some(Self::Waterlevel)
        } else {
            None
        }
    }

    /// `<layer>_<YYYYMMDD_HHMMSS>_interpolated.tif`, with the domain name
    /// inserted before the suffix when several domains share a timestep.
    pub fn output_file_name(&self, timestep: &DateTime<Utc>, domain: Option<&str>) -> String {
        match domain {
            Some(domain) => format!(
                "{}_{}_{}_interpolated.tif",
                self.as_str(),
                format_file_time(timestep),
                domain
            ),
            None => format!("{}_{}_interpolated.tif", self.as_str(), format_file_time(timestep)),
        }
    }
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
