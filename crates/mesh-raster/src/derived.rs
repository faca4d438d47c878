//! Bands derived from other dense bands.

use crate::error::{RasterError, Result};
use crate::layer::ASTRONOMICAL_BAND_NAME;
use crate::types::RasterBand;

/// Astronomical tide: total water level minus surge, pixel by pixel.
///
/// NaN in either input gives NaN.
pub fn astronomical_band(water_level: &RasterBand, surge: &RasterBand) -> Result<RasterBand> {
    if water_level.shape() != surge.shape() {
        return Err(RasterError::shape_mismatch(format!(
            "'{}' is {:?} but '{}' is {:?}",
            water_level.name(),
            water_level.shape(),
            surge.name(),
            surge.shape()
        )));
    }

    let data = water_level
        .data()
        .iter()
        .zip(surge.data())
        .map(|(wl, s)| wl - s)
        .collect();

    RasterBand::new(
        ASTRONOMICAL_BAND_NAME,
        water_level.width(),
        water_level.height(),
        data,
    )
}
