//! Writes synthetic meshes as small UGRID netCDF domain files.

use std::path::Path;

use crate::fixtures::sample_attributes;
use crate::generators::SyntheticMesh;

/// Write `mesh` as a forecast domain file with two hourly steps starting at
/// 2019-01-01 06:00 UTC and an analysis time of 2019-01-01 00:00 UTC.
///
/// Every variable is shaped (time x face) and holds `value` everywhere.
/// Connectivity is one-based and padded with -999 to the widest face.
pub fn write_ugrid_domain(
    path: &Path,
    mesh: &SyntheticMesh,
    variables: &[&str],
    value: f64,
) -> Result<(), netcdf::Error> {
    let (nodes, faces) = mesh;
    let max_degree = faces.iter().map(Vec::len).max().unwrap_or(3);
    let mut file = netcdf::create(path)?;

    file.add_dimension("nNodes", nodes.len())?;
    file.add_dimension("nFaces", faces.len())?;
    file.add_dimension("nMax_face_nodes", max_degree)?;
    file.add_dimension("time", 2)?;
    file.add_dimension("analysis_time", 1)?;

    for (key, text) in sample_attributes() {
        file.add_attribute(key, text)?;
    }

    let mut topology = file.add_variable::<i32>("mesh2d", &[])?;
    topology.put_attribute("cf_role", "mesh_topology")?;
    topology.put_attribute("node_coordinates", "mesh2d_node_x mesh2d_node_y")?;
    topology.put_attribute("face_node_connectivity", "mesh2d_face_nodes")?;

    let xs: Vec<f64> = nodes.iter().map(|n| n.0).collect();
    let ys: Vec<f64> = nodes.iter().map(|n| n.1).collect();
    let mut x = file.add_variable::<f64>("mesh2d_node_x", &["nNodes"])?;
    x.put_values(&xs, ..)?;
    let mut y = file.add_variable::<f64>("mesh2d_node_y", &["nNodes"])?;
    y.put_values(&ys, ..)?;

    let mut conn = Vec::with_capacity(faces.len() * max_degree);
    for face in faces {
        conn.extend(face.iter().map(|&n| n as i32 + 1));
        conn.extend(std::iter::repeat(-999).take(max_degree - face.len()));
    }
    let mut c = file.add_variable::<i32>("mesh2d_face_nodes", &["nFaces", "nMax_face_nodes"])?;
    c.set_fill_value(-999i32)?;
    c.put_attribute("start_index", 1i32)?;
    c.put_values(&conn, ..)?;

    let mut time = file.add_variable::<f64>("time", &["time"])?;
    time.put_attribute("units", "hours since 2019-01-01 00:00:00")?;
    time.put_values(&[6.0, 7.0], ..)?;

    let mut analysis = file.add_variable::<f64>("analysis_time", &["analysis_time"])?;
    analysis.put_attribute("units", "seconds since 1970-01-01 00:00:00")?;
    analysis.put_values(&[1_546_300_800.0], ..)?;

    let values = vec![value; 2 * faces.len()];
    for name in variables {
        let mut v = file.add_variable::<f64>(name, &["time", "nFaces"])?;
        v.put_values(&values, ..)?;
    }

    Ok(())
}
