//! GeoTIFF output: encoding, decoding and atomic file writes.

mod metadata;
mod tiff;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Compression;
use crate::error::{RasterError, Result};
use crate::types::OutputRaster;

pub use metadata::GdalMetadata;
pub use tiff::{decode_geotiff, encode_geotiff};

/// Sibling path a raster is written to before being renamed into place.
fn partial_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| RasterError::raster_write(format!("{} has no file name", path.display())))?;
    let mut partial = name.to_os_string();
    partial.push(".partial");
    Ok(path.with_file_name(partial))
}

/// Write `raster` to `path` as a GeoTIFF.
///
/// The file only appears at `path` once it has been fully written and
/// flushed. On failure nothing is left at `path` or at the temporary path.
pub fn write_geotiff(path: &Path, raster: &OutputRaster, compression: Compression) -> Result<()> {
    let bytes = encode_geotiff(raster, compression)?;
    let partial = partial_path(path)?;

    let written = fs::File::create(&partial).and_then(|mut file| {
        file.write_all(&bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        discard(&partial);
        return Err(RasterError::raster_write(format!("{}: {}", partial.display(), e)));
    }

    if let Err(e) = fs::rename(&partial, path) {
        discard(&partial);
        return Err(RasterError::raster_write(format!("{}: {}", path.display(), e)));
    }

    info!(
        path = %path.display(),
        bands = raster.bands().len(),
        width = raster.width(),
        height = raster.height(),
        bytes = bytes.len(),
        compression = %compression,
        "Wrote GeoTIFF"
    );
    Ok(())
}

fn discard(partial: &Path) {
    match fs::remove_file(partial) {
        Ok(()) => debug!(path = %partial.display(), "Removed partial raster"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %partial.display(), error = %e, "Failed to remove partial raster"),
    }
}

/// Read a GeoTIFF previously written by [`write_geotiff`].
pub fn read_geotiff(path: &Path) -> Result<OutputRaster> {
    let bytes = fs::read(path)
        .map_err(|e| RasterError::raster_read(format!("{}: {}", path.display(), e)))?;
    decode_geotiff(&bytes)
}
