//! Point features: one per face, at its centroid, carrying field values.

use tracing::debug;
use ugrid_parser::{FaceGeometry, FieldArray, UgridError};

use crate::error::{RasterError, Result};

/// One face at one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub face: usize,
    /// Centroid of the face's real vertices.
    pub position: (f64, f64),
    /// Values in the order of [`FeatureSet::variables`].
    pub values: Vec<f64>,
}

/// Features of every face plus the variable names their values map to.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    variables: Vec<String>,
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn variable_index(&self, name: &str) -> Result<usize> {
        self.variables
            .iter()
            .position(|v| v == name)
            .ok_or_else(|| UgridError::variable_not_found(name.to_string()).into())
    }

    /// Value of `name` on one feature.
    pub fn value(&self, feature: usize, name: &str) -> Result<f64> {
        let index = self.variable_index(name)?;
        Ok(self.features[feature].values[index])
    }

    /// `(position, value)` pairs of one variable, in face order.
    pub fn shapes<'a>(
        &'a self,
        name: &str,
    ) -> Result<impl Iterator<Item = ((f64, f64), f64)> + 'a> {
        let index = self.variable_index(name)?;
        Ok(self.features.iter().map(move |f| (f.position, f.values[index])))
    }
}

/// Build one feature per face from the centroids and each field's slice at
/// `timestep`.
///
/// Every field must cover every face and have the requested step.
pub fn build_features(
    geometry: &FaceGeometry,
    fields: &[&FieldArray],
    timestep: usize,
) -> Result<FeatureSet> {
    let n_faces = geometry.len();

    let mut slices = Vec::with_capacity(fields.len());
    for field in fields {
        if field.n_faces() != n_faces {
            return Err(RasterError::shape_mismatch(format!(
                "field '{}' has {} faces but mesh has {}",
                field.name(),
                field.n_faces(),
                n_faces
            )));
        }
        slices.push(field.at(timestep)?);
    }

    let features = geometry
        .centroids()
        .iter()
        .enumerate()
        .map(|(face, &position)| Feature {
            face,
            position,
            values: slices.iter().map(|s| s[face]).collect(),
        })
        .collect();

    debug!(
        faces = n_faces,
        variables = fields.len(),
        timestep,
        "Built point features"
    );

    Ok(FeatureSet {
        variables: fields.iter().map(|f| f.name().to_string()).collect(),
        features,
    })
}
