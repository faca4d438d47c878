//! Common constants for mesh-to-raster tests.

/// Bounding boxes as `(min_x, min_y, max_x, max_y)`.
pub mod bbox {
    /// Web-map extent the converter rasterizes onto by default
    pub const WEB_TILES: (f64, f64, f64, f64) = (-180.0, -85.0, 180.0, 85.0);

    /// Window straddling the antimeridian in 0..360 longitudes
    pub const DATELINE_WINDOW: (f64, f64, f64, f64) = (160.0, -10.0, 200.0, 10.0);
}

/// NODATA sentinel written into sparse bands.
pub const NODATA: f64 = -9999.0;

/// Global attributes resembling a GLOSSIS forecast file.
pub fn sample_attributes() -> Vec<(&'static str, &'static str)> {
    vec![
        ("institution", "Deltares"),
        ("source", "Delft3D Flexible Mesh"),
        ("Conventions", "CF-1.6 UGRID-1.0"),
        ("title", "GLOSSIS water level forecast <domain 00>"),
    ]
}
