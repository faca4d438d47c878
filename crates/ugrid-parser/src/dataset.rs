//! In-memory view of a loaded UGRID domain file.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{UgridError, UgridResult};
use crate::mesh::{FaceGeometry, Mesh};

/// A dataset-level attribute value, carried through to outputs untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Int(i64),
    Float(f64),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{:?}", v),
            AttrValue::Ints(vs) => {
                let parts: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(" "))
            }
            AttrValue::Floats(vs) => {
                let parts: Vec<String> = vs.iter().map(|v| format!("{:?}", v)).collect();
                write!(f, "[{}]", parts.join(" "))
            }
        }
    }
}

/// A per-face field shaped (time x face), stored row-major.
#[derive(Debug, Clone)]
pub struct FieldArray {
    name: String,
    n_times: usize,
    n_faces: usize,
    values: Vec<f64>,
}

impl FieldArray {
    pub fn new(name: impl Into<String>, n_times: usize, n_faces: usize, values: Vec<f64>) -> UgridResult<Self> {
        let name = name.into();
        if values.len() != n_times * n_faces {
            return Err(UgridError::mesh_format(format!(
                "field '{}' has {} values, expected {} x {}",
                name,
                values.len(),
                n_times,
                n_faces
            )));
        }
        Ok(Self {
            name,
            n_times,
            n_faces,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_times(&self) -> usize {
        self.n_times
    }

    pub fn n_faces(&self) -> usize {
        self.n_faces
    }

    /// Values of every face at one timestep.
    pub fn at(&self, timestep: usize) -> UgridResult<&[f64]> {
        if timestep >= self.n_times {
            return Err(UgridError::variable_not_found(format!(
                "timestep {} of '{}' (only {} steps)",
                timestep, self.name, self.n_times
            )));
        }
        let start = timestep * self.n_faces;
        Ok(&self.values[start..start + self.n_faces])
    }
}

/// A mesh together with its time axis, selected fields and provenance.
#[derive(Debug, Clone)]
pub struct UgridDataset {
    pub mesh: Mesh,
    /// Face centers shipped with the file. Informational only: these are
    /// circumcenters and are never used for geometry.
    pub face_centers: Option<Vec<(f64, f64)>>,
    /// Global attributes of the source file.
    pub attributes: BTreeMap<String, AttrValue>,
    /// Decoded `time` coordinate.
    pub times: Vec<DateTime<Utc>>,
    /// Decoded `analysis_time` scalar.
    pub analysis_time: DateTime<Utc>,
    fields: BTreeMap<String, FieldArray>,
}

impl UgridDataset {
    pub fn new(
        mesh: Mesh,
        times: Vec<DateTime<Utc>>,
        analysis_time: DateTime<Utc>,
    ) -> Self {
        Self {
            mesh,
            face_centers: None,
            attributes: BTreeMap::new(),
            times,
            analysis_time,
            fields: BTreeMap::new(),
        }
    }

    /// Attach a field, checking its shape against the mesh and time axis.
    pub fn insert_field(&mut self, field: FieldArray) -> UgridResult<()> {
        if field.n_faces() != self.mesh.face_count() {
            return Err(UgridError::mesh_format(format!(
                "field '{}' has {} faces but mesh has {}",
                field.name(),
                field.n_faces(),
                self.mesh.face_count()
            )));
        }
        if field.n_times() != self.times.len() {
            return Err(UgridError::mesh_format(format!(
                "field '{}' has {} timesteps but time axis has {}",
                field.name(),
                field.n_times(),
                self.times.len()
            )));
        }
        self.fields.insert(field.name().to_string(), field);
        Ok(())
    }

    pub fn field(&self, name: &str) -> UgridResult<&FieldArray> {
        self.fields
            .get(name)
            .ok_or_else(|| UgridError::variable_not_found(name.to_string()))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Timestamp of one step on the time axis.
    pub fn time_at(&self, timestep: usize) -> UgridResult<DateTime<Utc>> {
        self.times.get(timestep).copied().ok_or_else(|| {
            UgridError::variable_not_found(format!(
                "timestep {} (time axis has {} steps)",
                timestep,
                self.times.len()
            ))
        })
    }

    pub fn face_geometry(&self) -> FaceGeometry {
        self.mesh.face_geometry()
    }
}
