//! End-to-end conversion of UGRID domain files into GeoTIFF rasters.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use mesh_common::format_tag_time;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use ugrid_parser::{open_ugrid, AttrValue, UgridDataset, UgridError};

use crate::config::{ConversionConfig, DomainPolicy};
use crate::derived::astronomical_band;
use crate::error::Result;
use crate::features::build_features;
use crate::interpolation::{boundary_indicator, fill_gaps};
use crate::layer::{LayerType, MASK_BAND_NAME};
use crate::polygon::build_mask_polygons;
use crate::rasterize::Rasterizer;
use crate::types::OutputRaster;
use crate::writer::write_geotiff;

/// Tag holding the representative timestep.
pub const TIME_START_TAG: &str = "system:time_start";

/// Tag holding the analysis time.
pub const ANALYSIS_TIME_TAG: &str = "analysis_time";

/// Summary of one converted domain file.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    pub source: PathBuf,
    pub path: PathBuf,
    pub layer: LayerType,
    pub timestep: DateTime<Utc>,
    pub analysis_time: DateTime<Utc>,
    pub bands: Vec<String>,
    /// Pixels covered by at least one face polygon.
    pub covered_pixels: usize,
}

/// Source attributes plus the two time tags, which win on key collisions.
pub fn provenance_tags(
    attributes: &BTreeMap<String, AttrValue>,
    timestep: &DateTime<Utc>,
    analysis_time: &DateTime<Utc>,
) -> BTreeMap<String, String> {
    let mut tags: BTreeMap<String, String> = attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.to_string()))
        .collect();
    tags.insert(TIME_START_TAG.to_string(), format_tag_time(timestep));
    tags.insert(ANALYSIS_TIME_TAG.to_string(), format_tag_time(analysis_time));
    tags
}

/// Layer forced by the config, or detected from the file name.
pub fn resolve_layer(path: &Path, config: &ConversionConfig) -> Result<LayerType> {
    if let Some(layer) = config.layer {
        return Ok(layer);
    }
    LayerType::from_path(path).ok_or_else(|| {
        UgridError::variable_not_found(format!(
            "cannot tell the layer of {}; name must contain 'waterlevel' or 'currents'",
            path.display()
        ))
        .into()
    })
}

/// Run every stage on a loaded dataset and assemble the output bands:
/// the layer's variables in order, the optional astronomical band, then the
/// boundary mask.
pub fn build_output_raster(
    dataset: &UgridDataset,
    layer: LayerType,
    config: &ConversionConfig,
) -> Result<OutputRaster> {
    config.validate()?;

    let timestep = config.timestep.resolve(dataset.times.len())?;
    let variables = layer.variables();
    let fields = variables
        .iter()
        .map(|name| dataset.field(name))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let geometry = dataset.face_geometry();
    let features = build_features(&geometry, &fields, timestep)?;
    let polygons = build_mask_polygons(&geometry)?;

    let rasterizer = Rasterizer::from_config(config);
    let nodata = rasterizer.nodata();

    let mut bands = Vec::with_capacity(variables.len() + 2);
    for name in variables {
        let sparse = rasterizer.rasterize_points(name, features.shapes(name)?);
        bands.push(fill_gaps(&sparse, nodata)?);
    }

    if config.derive_astronomical && layer == LayerType::Waterlevel {
        let astronomical = astronomical_band(&bands[0], &bands[1])?;
        bands.push(astronomical);
    }

    let mask = rasterizer.rasterize_mask(MASK_BAND_NAME, &polygons);
    bands.push(boundary_indicator(&mask, nodata));

    let tags = provenance_tags(
        &dataset.attributes,
        &dataset.time_at(timestep)?,
        &dataset.analysis_time,
    );

    OutputRaster::new(bands, rasterizer.transform(), config.crs, tags, Some(nodata))
}

/// Convert one domain file and write the raster into `output_dir`.
///
/// Under [`DomainPolicy::Each`] the domain's file stem is part of the
/// output name so that domains sharing a timestep do not overwrite each other.
pub fn convert_domain(
    input: &Path,
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput> {
    let started = Instant::now();
    let layer = resolve_layer(input, config)?;
    let dataset = open_ugrid(input, &layer.variables())?;

    let raster = build_output_raster(&dataset, layer, config)?;
    let timestep = dataset.time_at(config.timestep.resolve(dataset.times.len())?)?;

    let label = match config.domain_policy {
        DomainPolicy::FirstOnly => None,
        DomainPolicy::Each => input.file_stem().and_then(|s| s.to_str()),
    };
    let path = output_dir.join(layer.output_file_name(&timestep, label));
    write_geotiff(&path, &raster, config.compression)?;

    let covered_pixels = raster
        .bands()
        .last()
        .map(|mask| mask.data().iter().filter(|&&v| v == 1.0).count())
        .unwrap_or(0);

    info!(
        source = %input.display(),
        output = %path.display(),
        layer = %layer,
        timestep = %timestep,
        faces = dataset.mesh.face_count(),
        covered_pixels,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Converted domain"
    );

    Ok(ConversionOutput {
        source: input.to_path_buf(),
        path,
        layer,
        timestep,
        analysis_time: dataset.analysis_time,
        bands: raster.band_names().into_iter().map(String::from).collect(),
        covered_pixels,
    })
}

/// Whether a file name marks a domain file.
pub fn is_domain_file(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(suffix))
        .unwrap_or(false)
}

/// The domain files a run will convert under `policy`.
///
/// [`DomainPolicy::FirstOnly`] keeps the first file and logs every skipped one.
pub fn select_domains(files: &[PathBuf], policy: DomainPolicy) -> &[PathBuf] {
    match policy {
        DomainPolicy::Each => files,
        DomainPolicy::FirstOnly => {
            let (selected, skipped) = files.split_at(files.len().min(1));
            for path in skipped {
                warn!(
                    path = %path.display(),
                    "Skipping domain file: only the first domain is converted"
                );
            }
            selected
        }
    }
}

/// Convert the domain files selected by the configured policy.
///
/// Domains are independent and are converted in parallel under
/// [`DomainPolicy::Each`]. The first failure aborts the run.
pub fn convert_domains(
    files: &[PathBuf],
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<Vec<ConversionOutput>> {
    let selected = select_domains(files, config.domain_policy);
    info!(
        found = files.len(),
        selected = selected.len(),
        policy = ?config.domain_policy,
        "Converting domain files"
    );

    selected
        .par_iter()
        .map(|path| convert_domain(path, output_dir, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_provenance_tags_time_wins() {
        let mut attrs = BTreeMap::new();
        attrs.insert("institution".to_string(), AttrValue::Text("Deltares".into()));
        attrs.insert("analysis_time".to_string(), AttrValue::Text("stale".into()));
        attrs.insert("version".to_string(), AttrValue::Float(1.0));

        let t = Utc.with_ymd_and_hms(2019, 1, 1, 3, 0, 0).unwrap();
        let a = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let tags = provenance_tags(&attrs, &t, &a);

        assert_eq!(tags.len(), 4);
        assert_eq!(tags["institution"], "Deltares");
        assert_eq!(tags["version"], "1.0");
        assert_eq!(tags["system:time_start"], "20190101 030000");
        assert_eq!(tags["analysis_time"], "20190101 000000");
    }

    #[test]
    fn test_resolve_layer() {
        let config = ConversionConfig::default();
        assert_eq!(
            resolve_layer(Path::new("x_currents_00_fc.nc"), &config).unwrap(),
            LayerType::Currents
        );
        assert!(resolve_layer(Path::new("x.nc"), &config).is_err());

        let forced = ConversionConfig {
            layer: Some(LayerType::Waterlevel),
            ..Default::default()
        };
        assert_eq!(
            resolve_layer(Path::new("x.nc"), &forced).unwrap(),
            LayerType::Waterlevel
        );
    }

    #[test]
    fn test_select_domains() {
        let files = vec![PathBuf::from("a.nc"), PathBuf::from("b.nc"), PathBuf::from("c.nc")];
        assert_eq!(select_domains(&files, DomainPolicy::FirstOnly), &files[..1]);
        assert_eq!(select_domains(&files, DomainPolicy::Each), &files[..]);
        assert!(select_domains(&[], DomainPolicy::FirstOnly).is_empty());
    }

    #[test]
    fn test_is_domain_file() {
        assert!(is_domain_file(
            Path::new("/d/glossis_waterlevel_00_fc.nc"),
            "waterlevel_00_fc.nc"
        ));
        assert!(!is_domain_file(Path::new("/d/glossis_waterlevel_00_fc.nc.tmp"), "waterlevel_00_fc.nc"));
    }
}
