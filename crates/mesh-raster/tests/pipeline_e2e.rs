//! End-to-end conversion of synthetic meshes around the antimeridian.

use chrono::{TimeZone, Utc};
use mesh_common::BoundingBox;
use mesh_raster::{
    build_features, build_mask_polygons, build_output_raster, fill_gaps, read_geotiff,
    write_geotiff, Compression, ConversionConfig, LayerType, Rasterizer, MASK_BAND_NAME,
};
use test_utils::{
    assert_approx_eq, constant_field, dateline_mesh_east_positive, dateline_mesh_wrapped,
    fixtures::bbox::DATELINE_WINDOW, sample_attributes, SyntheticMesh, NODATA,
};
use ugrid_parser::{AttrValue, FaceNodes, FieldArray, Mesh, UgridDataset};

fn window_config() -> ConversionConfig {
    let (min_x, min_y, max_x, max_y) = DATELINE_WINDOW;
    ConversionConfig {
        width: 10,
        height: 10,
        bounds: BoundingBox::new(min_x, min_y, max_x, max_y),
        ..Default::default()
    }
}

fn dataset(mesh: SyntheticMesh, value: f64) -> UgridDataset {
    let (nodes, faces) = mesh;
    let mesh = Mesh::new(nodes, FaceNodes::from_rows(&faces).unwrap()).unwrap();
    let n_faces = mesh.face_count();
    let t0 = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();

    let mut ds = UgridDataset::new(mesh, vec![t0, t0 + chrono::Duration::hours(1)], t0);
    for (key, value) in sample_attributes() {
        ds.attributes.insert(key.to_string(), AttrValue::Text(value.to_string()));
    }
    for name in LayerType::Waterlevel.variables() {
        let field = FieldArray::new(name, 2, n_faces, constant_field(2, n_faces, value)).unwrap();
        ds.insert_field(field).unwrap();
    }
    ds
}

#[test]
fn test_sparse_band_holds_values_only_under_faces() {
    let ds = dataset(dateline_mesh_east_positive(), 2.5);
    let config = window_config();
    let geometry = ds.face_geometry();
    let field = ds.field("water_level").unwrap();

    let features = build_features(&geometry, &[field], 0).unwrap();
    let rasterizer = Rasterizer::from_config(&config);
    let sparse = rasterizer.rasterize_points("water_level", features.shapes("water_level").unwrap());

    // centroids at (173.3, -3.3), (176.7, 3.3), (183.3, -3.3), (186.7, 3.3)
    let expected = [(6, 3), (3, 4), (6, 5), (3, 6)];
    for row in 0..10 {
        for col in 0..10 {
            let value = sparse.get(row, col);
            if expected.contains(&(row, col)) {
                assert_eq!(value, 2.5, "pixel ({}, {})", row, col);
            } else {
                assert_eq!(value, NODATA, "pixel ({}, {})", row, col);
            }
        }
    }

    let dense = fill_gaps(&sparse, NODATA).unwrap();
    assert!(dense.data().iter().all(|&v| v != NODATA));
    assert_approx_eq!(dense.get(4, 4), 2.5, 1e-9);
    assert_approx_eq!(dense.get(4, 5), 2.5, 1e-9);
    assert!(dense.get(0, 0).is_nan());
}

#[test]
fn test_straddling_faces_are_shifted_east() {
    let ds = dataset(dateline_mesh_wrapped(), 2.5);
    let geometry = ds.face_geometry();
    let polygons = build_mask_polygons(&geometry).unwrap();

    assert_eq!(polygons.len(), 4);
    for polygon in &polygons[..2] {
        assert!(!polygon.is_shifted());
        assert_eq!(polygon.ring(), geometry.ring(polygon.face()));
    }
    for polygon in &polygons[2..] {
        assert!(polygon.is_shifted());
        assert!(polygon.ring().iter().all(|&(x, _)| x >= 180.0));
    }
}

#[test]
fn test_output_raster_layout() {
    let ds = dataset(dateline_mesh_east_positive(), 2.5);
    let raster = build_output_raster(&ds, LayerType::Waterlevel, &window_config()).unwrap();

    assert_eq!(
        raster.band_names(),
        vec!["water_level", "water_level_surge", MASK_BAND_NAME]
    );
    assert_eq!((raster.width(), raster.height()), (10, 10));
    assert_eq!(raster.tags["system:time_start"], "20190101 000000");
    assert_eq!(raster.tags["analysis_time"], "20190101 000000");
    assert_eq!(raster.tags["institution"], "Deltares");
    assert_eq!(raster.nodata, Some(NODATA));

    // pixel centers sit at x = 162, 166, ...; the one at 170 lies on the
    // western edge of the faces and is covered, the one at 190 is not
    let mask = raster.band(MASK_BAND_NAME).unwrap();
    for row in 0..10 {
        for col in 0..10 {
            let expected = if (2..=6).contains(&col) { 1.0 } else { 0.0 };
            assert_eq!(mask.get(row, col), expected, "pixel ({}, {})", row, col);
        }
    }
}

#[test]
fn test_wrapped_mesh_mask_matches_east_positive_mesh() {
    let config = window_config();
    let east = build_output_raster(
        &dataset(dateline_mesh_east_positive(), 1.0),
        LayerType::Waterlevel,
        &config,
    )
    .unwrap();
    let wrapped = build_output_raster(
        &dataset(dateline_mesh_wrapped(), 1.0),
        LayerType::Waterlevel,
        &config,
    )
    .unwrap();

    assert_eq!(
        east.band(MASK_BAND_NAME).unwrap(),
        wrapped.band(MASK_BAND_NAME).unwrap()
    );
}

#[test]
fn test_astronomical_band_before_mask() {
    let config = ConversionConfig {
        derive_astronomical: true,
        ..window_config()
    };
    let ds = dataset(dateline_mesh_east_positive(), 2.5);
    let raster = build_output_raster(&ds, LayerType::Waterlevel, &config).unwrap();

    assert_eq!(
        raster.band_names(),
        vec![
            "water_level",
            "water_level_surge",
            "water_level_astronomical",
            MASK_BAND_NAME
        ]
    );
    assert_approx_eq!(raster.bands()[2].get(4, 4), 0.0, 1e-9);
}

#[test]
fn test_timestep_out_of_range_aborts() {
    let config = ConversionConfig {
        timestep: mesh_raster::TimestepSelection::Index(2),
        ..window_config()
    };
    let ds = dataset(dateline_mesh_east_positive(), 2.5);
    assert!(build_output_raster(&ds, LayerType::Waterlevel, &config).is_err());
}

#[test]
fn test_missing_layer_field_aborts() {
    let ds = dataset(dateline_mesh_east_positive(), 2.5);
    assert!(build_output_raster(&ds, LayerType::Currents, &window_config()).is_err());
}

#[test]
fn test_write_then_read_preserves_everything() {
    let dir = tempfile::tempdir().unwrap();
    let ds = dataset(dateline_mesh_east_positive(), 2.5);
    let raster = build_output_raster(&ds, LayerType::Waterlevel, &window_config()).unwrap();

    for compression in [Compression::None, Compression::Deflate] {
        let path = dir.path().join(format!("out_{}.tif", compression));
        write_geotiff(&path, &raster, compression).unwrap();
        let back = read_geotiff(&path).unwrap();

        assert_eq!(back.bands().len(), raster.bands().len());
        assert_eq!((back.width(), back.height()), (10, 10));
        assert_eq!(back.transform, raster.transform);
        assert_eq!(back.crs, raster.crs);
        assert_eq!(back.tags, raster.tags);
        assert_eq!(back.band_names(), raster.band_names());
        for (a, b) in back.bands().iter().zip(raster.bands()) {
            for (x, y) in a.data().iter().zip(b.data()) {
                assert_eq!(x.to_bits(), y.to_bits());
            }
        }
    }
}
