//! Native UGRID netCDF loading using the netcdf library.
//!
//! The mesh is located through the UGRID conventions: the topology variable
//! carries `cf_role = "mesh_topology"` and names its node coordinate and
//! face-node connectivity arrays in attributes.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Once;

use mesh_common::CfTimeUnits;
use netcdf::AttributeValue;
use tracing::{debug, info, warn};

use crate::dataset::{AttrValue, FieldArray, UgridDataset};
use crate::error::{UgridError, UgridResult};
use crate::mesh::{FaceNodes, Mesh};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when probing for optional
/// attributes that don't exist). Safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Load a UGRID domain file together with the requested per-face fields.
///
/// Every name in `field_names` must exist and be shaped (time x face).
pub fn open_ugrid<P: AsRef<Path>>(path: P, field_names: &[&str]) -> UgridResult<UgridDataset> {
    silence_hdf5_errors();

    let path = path.as_ref();
    let file = netcdf::open(path).map_err(|e| {
        UgridError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let topology = find_topology(&file)?;
    debug!(topology = %topology.name, "Found mesh topology");

    let mesh = read_mesh(&file, &topology)?;
    let face_centers = match &topology.face_coordinates {
        Some((x, y)) => read_coordinate_pair(&file, x, y)
            .ok()
            .map(|(xs, ys)| xs.into_iter().zip(ys).collect()),
        None => None,
    };

    let times = read_time_axis(&file, "time")?;
    let analysis_time = read_time_axis(&file, "analysis_time")?
        .into_iter()
        .next()
        .ok_or_else(|| UgridError::variable_not_found("analysis_time is empty"))?;

    let attributes: BTreeMap<String, AttrValue> = file
        .attributes()
        .filter_map(|attr| {
            let name = attr.name().to_string();
            match attr.value() {
                Ok(value) => Some((name, convert_attribute(value))),
                Err(e) => {
                    warn!(attribute = %name, error = %e, "Skipping unreadable global attribute");
                    None
                }
            }
        })
        .collect();

    let mut dataset = UgridDataset::new(mesh, times, analysis_time);
    dataset.face_centers = face_centers;
    dataset.attributes = attributes;

    for name in field_names {
        let field = read_face_field(&file, name, dataset.times.len(), dataset.mesh.face_count())?;
        dataset.insert_field(field)?;
    }

    info!(
        path = %path.display(),
        nodes = dataset.mesh.nodes().len(),
        faces = dataset.mesh.face_count(),
        max_degree = dataset.mesh.faces().max_degree(),
        timesteps = dataset.times.len(),
        fields = field_names.len(),
        "Loaded UGRID dataset"
    );

    Ok(dataset)
}

/// Names pulled from the mesh topology variable.
#[derive(Debug)]
struct Topology {
    name: String,
    node_x: String,
    node_y: String,
    face_nodes: String,
    face_coordinates: Option<(String, String)>,
}

fn find_topology(file: &netcdf::File) -> UgridResult<Topology> {
    let var = file
        .variables()
        .find(|v| get_str_attr(v, "cf_role").as_deref() == Some("mesh_topology"))
        .ok_or_else(|| UgridError::mesh_format("no variable with cf_role = mesh_topology"))?;

    let name = var.name();
    let nodes = get_str_attr(&var, "node_coordinates").ok_or_else(|| {
        UgridError::mesh_format(format!("{} has no node_coordinates attribute", name))
    })?;
    let (node_x, node_y) = split_pair(&nodes)
        .ok_or_else(|| UgridError::mesh_format(format!("bad node_coordinates '{}'", nodes)))?;

    let face_nodes = get_str_attr(&var, "face_node_connectivity").ok_or_else(|| {
        UgridError::mesh_format(format!("{} has no face_node_connectivity attribute", name))
    })?;

    let face_coordinates = get_str_attr(&var, "face_coordinates").and_then(|s| split_pair(&s));

    Ok(Topology {
        name,
        node_x,
        node_y,
        face_nodes,
        face_coordinates,
    })
}

fn split_pair(s: &str) -> Option<(String, String)> {
    let mut parts = s.split_whitespace();
    let first = parts.next()?.to_string();
    let second = parts.next()?.to_string();
    Some((first, second))
}

fn read_mesh(file: &netcdf::File, topology: &Topology) -> UgridResult<Mesh> {
    let (xs, ys) = read_coordinate_pair(file, &topology.node_x, &topology.node_y)?;

    let conn = file.variable(&topology.face_nodes).ok_or_else(|| {
        UgridError::mesh_format(format!("connectivity variable {} is missing", topology.face_nodes))
    })?;
    let dims = conn.dimensions();
    if dims.len() != 2 {
        return Err(UgridError::mesh_format(format!(
            "{} has {} dimensions, expected (face, max_face_nodes)",
            topology.face_nodes,
            dims.len()
        )));
    }
    let max_degree = dims[1].len();

    let raw: Vec<i64> = conn.get_values(..).map_err(|e| {
        UgridError::mesh_format(format!("Failed to read {}: {}", topology.face_nodes, e))
    })?;
    let fill = get_i64_attr(&conn, "_FillValue");
    let start_index = get_i64_attr(&conn, "start_index").unwrap_or(0);

    let faces = FaceNodes::from_padded(&raw, max_degree, fill, start_index)?;
    let nodes = xs.into_iter().zip(ys).collect();
    Mesh::new(nodes, faces)
}

fn read_coordinate_pair(
    file: &netcdf::File,
    x_name: &str,
    y_name: &str,
) -> UgridResult<(Vec<f64>, Vec<f64>)> {
    let xs = read_f64_variable(file, x_name)?;
    let ys = read_f64_variable(file, y_name)?;
    if xs.len() != ys.len() {
        return Err(UgridError::mesh_format(format!(
            "{} has {} values but {} has {}",
            x_name,
            xs.len(),
            y_name,
            ys.len()
        )));
    }
    Ok((xs, ys))
}

fn read_f64_variable(file: &netcdf::File, name: &str) -> UgridResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| UgridError::mesh_format(format!("coordinate variable {} is missing", name)))?;
    var.get_values(..)
        .map_err(|e| UgridError::mesh_format(format!("Failed to read {}: {}", name, e)))
}

fn read_time_axis(file: &netcdf::File, name: &str) -> UgridResult<Vec<chrono::DateTime<chrono::Utc>>> {
    let var = file
        .variable(name)
        .ok_or_else(|| UgridError::variable_not_found(name.to_string()))?;
    let units = get_str_attr(&var, "units")
        .ok_or_else(|| UgridError::InvalidFormat(format!("{} has no units attribute", name)))?;
    let units = CfTimeUnits::parse(&units)?;

    let values: Vec<f64> = var
        .get_values(..)
        .map_err(|e| UgridError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;
    Ok(units.decode_all(&values)?)
}

/// Read a (time x face) field, masking `_FillValue` and applying scale/offset.
fn read_face_field(
    file: &netcdf::File,
    name: &str,
    n_times: usize,
    n_faces: usize,
) -> UgridResult<FieldArray> {
    let var = file
        .variable(name)
        .ok_or_else(|| UgridError::variable_not_found(name.to_string()))?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if shape != [n_times, n_faces] {
        return Err(UgridError::mesh_format(format!(
            "{} has shape {:?}, expected [{}, {}]",
            name, shape, n_times, n_faces
        )));
    }

    let raw: Vec<f64> = var
        .get_values(..)
        .map_err(|e| UgridError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;

    let fill = get_f64_attr(&var, "_FillValue");
    let scale_factor = get_f64_attr(&var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f64_attr(&var, "add_offset").unwrap_or(0.0);

    let values = raw
        .into_iter()
        .map(|v| {
            if Some(v) == fill {
                f64::NAN
            } else {
                v * scale_factor + add_offset
            }
        })
        .collect();

    FieldArray::new(name, n_times, n_faces, values)
}

fn convert_attribute(value: AttributeValue) -> AttrValue {
    match value {
        AttributeValue::Str(s) => AttrValue::Text(trim_nul(&s)),
        AttributeValue::Strs(ss) => {
            AttrValue::Text(ss.iter().map(|s| trim_nul(s)).collect::<Vec<_>>().join(", "))
        }
        AttributeValue::Double(v) => AttrValue::Float(v),
        AttributeValue::Float(v) => AttrValue::Float(v as f64),
        AttributeValue::Int(v) => AttrValue::Int(v as i64),
        AttributeValue::Short(v) => AttrValue::Int(v as i64),
        AttributeValue::Longlong(v) => AttrValue::Int(v),
        AttributeValue::Doubles(vs) => AttrValue::Floats(vs),
        AttributeValue::Floats(vs) => AttrValue::Floats(vs.into_iter().map(f64::from).collect()),
        AttributeValue::Ints(vs) => AttrValue::Ints(vs.into_iter().map(i64::from).collect()),
        other => AttrValue::Text(format!("{:?}", other)),
    }
}

/// NC_CHAR attributes are often padded with trailing NULs.
fn trim_nul(s: &str) -> String {
    s.trim_end_matches('\0').to_string()
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_i64_attr(var: &netcdf::Variable, name: &str) -> Option<i64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    i64::try_from(attr_value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pair() {
        assert_eq!(
            split_pair("mesh2d_node_x mesh2d_node_y"),
            Some(("mesh2d_node_x".to_string(), "mesh2d_node_y".to_string()))
        );
        assert_eq!(split_pair("only_one"), None);
    }

    #[test]
    fn test_convert_attribute() {
        assert_eq!(
            convert_attribute(AttributeValue::Str("GLOSSIS".into())),
            AttrValue::Text("GLOSSIS".into())
        );
        assert_eq!(
            convert_attribute(AttributeValue::Str("GLOSSIS\0\0".into())),
            AttrValue::Text("GLOSSIS".into())
        );
        assert_eq!(convert_attribute(AttributeValue::Int(3)), AttrValue::Int(3));
        assert_eq!(convert_attribute(AttributeValue::Double(0.5)), AttrValue::Float(0.5));
    }
}
