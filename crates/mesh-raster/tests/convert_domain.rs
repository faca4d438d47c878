//! File-level conversion: UGRID netCDF in, GeoTIFF out.

use std::path::{Path, PathBuf};

use mesh_common::BoundingBox;
use mesh_raster::{
    convert_domain, convert_domains, read_geotiff, ConversionConfig, DomainPolicy, LayerType,
    RasterError, MASK_BAND_NAME,
};
use test_utils::{
    assert_approx_eq, dateline_mesh_east_positive, fixtures::bbox::DATELINE_WINDOW,
    require_test_file, write_ugrid_domain, SyntheticMesh,
};
use ugrid_parser::UgridError;

fn write_domain(path: &Path, mesh: SyntheticMesh, variables: [&str; 2], value: f64) {
    write_ugrid_domain(path, &mesh, &variables, value).unwrap();
}

fn window_config() -> ConversionConfig {
    let (min_x, min_y, max_x, max_y) = DATELINE_WINDOW;
    ConversionConfig {
        width: 10,
        height: 10,
        bounds: BoundingBox::new(min_x, min_y, max_x, max_y),
        ..Default::default()
    }
}

fn tif_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("tif"))
        .collect();
    files.sort();
    files
}

#[test]
fn test_convert_waterlevel_domain() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("glossis_waterlevel_00_fc.nc");
    write_domain(
        &input,
        dateline_mesh_east_positive(),
        LayerType::Waterlevel.variables(),
        0.75,
    );

    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();
    let output = convert_domain(&input, &out_dir, &window_config()).unwrap();

    assert_eq!(output.layer, LayerType::Waterlevel);
    assert_eq!(
        output.path,
        out_dir.join("waterlevel_20190101_060000_interpolated.tif")
    );
    assert_eq!(output.covered_pixels, 50);

    let raster = read_geotiff(&output.path).unwrap();
    assert_eq!(
        raster.band_names(),
        vec!["water_level", "water_level_surge", MASK_BAND_NAME]
    );
    assert_eq!(raster.tags["system:time_start"], "20190101 060000");
    assert_eq!(raster.tags["analysis_time"], "20190101 000000");
    assert_eq!(raster.tags["title"], "GLOSSIS water level forecast <domain 00>");
    assert_approx_eq!(raster.bands()[0].get(4, 4), 0.75, 1e-9);
}

#[test]
fn test_convert_currents_domain_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("glossis_currents_00_fc.nc");
    write_domain(
        &input,
        dateline_mesh_east_positive(),
        LayerType::Currents.variables(),
        -0.2,
    );

    let output = convert_domain(&input, dir.path(), &window_config()).unwrap();
    assert_eq!(output.layer, LayerType::Currents);
    assert_eq!(output.bands, vec!["currents_u", "currents_v", MASK_BAND_NAME]);
}

#[test]
fn test_undetectable_layer() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("domain.nc");
    write_domain(
        &input,
        dateline_mesh_east_positive(),
        LayerType::Waterlevel.variables(),
        1.0,
    );

    let err = convert_domain(&input, dir.path(), &window_config()).unwrap_err();
    assert!(matches!(err, RasterError::Ugrid(UgridError::VariableNotFound(_))));
    assert!(tif_files(dir.path()).is_empty());
}

#[test]
fn test_first_only_policy_converts_one_domain() {
    let dir = tempfile::tempdir().unwrap();
    let inputs: Vec<PathBuf> = (0..2)
        .map(|i| {
            let path = dir.path().join(format!("d{}_waterlevel_00_fc.nc", i));
            write_domain(
                &path,
                dateline_mesh_east_positive(),
                LayerType::Waterlevel.variables(),
                i as f64,
            );
            path
        })
        .collect();

    let outputs = convert_domains(&inputs, dir.path(), &window_config()).unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].source, inputs[0]);
    assert_eq!(tif_files(dir.path()).len(), 1);
}

#[test]
fn test_each_policy_converts_every_domain_separately() {
    let dir = tempfile::tempdir().unwrap();
    let inputs: Vec<PathBuf> = (0..2)
        .map(|i| {
            let path = dir.path().join(format!("d{}_waterlevel_00_fc.nc", i));
            write_domain(
                &path,
                dateline_mesh_east_positive(),
                LayerType::Waterlevel.variables(),
                i as f64 + 1.0,
            );
            path
        })
        .collect();

    let config = ConversionConfig {
        domain_policy: DomainPolicy::Each,
        ..window_config()
    };
    let outputs = convert_domains(&inputs, dir.path(), &config).unwrap();

    assert_eq!(outputs.len(), 2);
    assert_eq!(
        tif_files(dir.path()),
        vec![
            dir.path()
                .join("waterlevel_20190101_060000_d0_waterlevel_00_fc_interpolated.tif"),
            dir.path()
                .join("waterlevel_20190101_060000_d1_waterlevel_00_fc_interpolated.tif"),
        ]
    );
    for (i, output) in outputs.iter().enumerate() {
        let raster = read_geotiff(&output.path).unwrap();
        assert_approx_eq!(raster.bands()[0].get(4, 4), i as f64 + 1.0, 1e-9);
    }
}

#[test]
fn test_convert_real_glossis_domain() {
    let input = require_test_file!("glossis_waterlevel_00_fc.nc");
    let dir = tempfile::tempdir().unwrap();

    let output = convert_domain(&input, dir.path(), &ConversionConfig::default()).unwrap();
    let raster = read_geotiff(&output.path).unwrap();
    assert_eq!((raster.width(), raster.height()), (1000, 1000));
    assert_eq!(raster.bands().len(), 3);
    assert!(output.covered_pixels > 0);
}
