//! Unstructured mesh topology and derived face geometry.
//!
//! Face-to-node connectivity is ragged: triangles and quads can live in the
//! same mesh. It is stored as a fixed-width arena of node indices (one row of
//! `max_degree` slots per face) plus a parallel per-face vertex count, so the
//! padding never leaks into geometry.

use crate::error::{UgridError, UgridResult};

/// Marker stored in unused connectivity slots.
pub const PAD: usize = usize::MAX;

/// Smallest number of vertices a face can have.
pub const MIN_FACE_DEGREE: usize = 3;

/// Ragged face-to-node connectivity.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceNodes {
    max_degree: usize,
    indices: Vec<usize>,
    counts: Vec<usize>,
}

impl FaceNodes {
    /// Build from a padded, row-major connectivity array as found in UGRID files.
    ///
    /// Entries equal to `fill`, or below `start_index`, are padding. Remaining
    /// entries are shifted by `start_index` to become zero-based.
    pub fn from_padded(
        raw: &[i64],
        max_degree: usize,
        fill: Option<i64>,
        start_index: i64,
    ) -> UgridResult<Self> {
        if max_degree < MIN_FACE_DEGREE {
            return Err(UgridError::mesh_format(format!(
                "face dimension has {} slots, need at least {}",
                max_degree, MIN_FACE_DEGREE
            )));
        }
        if raw.len() % max_degree != 0 {
            return Err(UgridError::mesh_format(format!(
                "connectivity length {} is not a multiple of {}",
                raw.len(),
                max_degree
            )));
        }

        let n_faces = raw.len() / max_degree;
        let mut indices = vec![PAD; raw.len()];
        let mut counts = Vec::with_capacity(n_faces);

        for (face, row) in raw.chunks_exact(max_degree).enumerate() {
            let slots = &mut indices[face * max_degree..(face + 1) * max_degree];
            let mut count = 0;
            for &value in row {
                if Some(value) == fill || value < start_index {
                    continue;
                }
                slots[count] = (value - start_index) as usize;
                count += 1;
            }
            counts.push(count);
        }

        let faces = Self {
            max_degree,
            indices,
            counts,
        };
        faces.check_degrees()?;
        Ok(faces)
    }

    /// Build from explicit per-face node lists (zero-based).
    pub fn from_rows<R: AsRef<[usize]>>(rows: &[R]) -> UgridResult<Self> {
        let max_degree = rows
            .iter()
            .map(|r| r.as_ref().len())
            .max()
            .unwrap_or(MIN_FACE_DEGREE)
            .max(MIN_FACE_DEGREE);

        let mut indices = vec![PAD; rows.len() * max_degree];
        let mut counts = Vec::with_capacity(rows.len());
        for (face, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            indices[face * max_degree..face * max_degree + row.len()].copy_from_slice(row);
            counts.push(row.len());
        }

        let faces = Self {
            max_degree,
            indices,
            counts,
        };
        faces.check_degrees()?;
        Ok(faces)
    }

    fn check_degrees(&self) -> UgridResult<()> {
        for (face, &count) in self.counts.iter().enumerate() {
            if count < MIN_FACE_DEGREE {
                return Err(UgridError::mesh_format(format!(
                    "face {} has {} vertices, need at least {}",
                    face, count, MIN_FACE_DEGREE
                )));
            }
        }
        Ok(())
    }

    /// Number of faces.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Width of each connectivity row.
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Real (unpadded) node indices of one face.
    pub fn face(&self, face: usize) -> &[usize] {
        let start = face * self.max_degree;
        &self.indices[start..start + self.counts[face]]
    }

    /// Number of real vertices per face.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Iterate over the real node indices of every face.
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        (0..self.len()).map(move |f| self.face(f))
    }
}

/// Node coordinates plus face connectivity.
#[derive(Debug, Clone)]
pub struct Mesh {
    nodes: Vec<(f64, f64)>,
    faces: FaceNodes,
}

impl Mesh {
    /// Assemble a mesh, checking that every face references existing nodes.
    pub fn new(nodes: Vec<(f64, f64)>, faces: FaceNodes) -> UgridResult<Self> {
        if nodes.is_empty() {
            return Err(UgridError::mesh_format("mesh has no nodes"));
        }
        if faces.is_empty() {
            return Err(UgridError::mesh_format("mesh has no faces"));
        }

        for (face, ring) in faces.iter().enumerate() {
            if let Some(&bad) = ring.iter().find(|&&n| n >= nodes.len()) {
                return Err(UgridError::mesh_format(format!(
                    "face {} references node {} but mesh has {} nodes",
                    face,
                    bad,
                    nodes.len()
                )));
            }
        }

        Ok(Self { nodes, faces })
    }

    /// Build from separate x/y coordinate arrays.
    pub fn from_xy(xs: &[f64], ys: &[f64], faces: FaceNodes) -> UgridResult<Self> {
        if xs.len() != ys.len() {
            return Err(UgridError::mesh_format(format!(
                "node x has {} values but node y has {}",
                xs.len(),
                ys.len()
            )));
        }
        Self::new(xs.iter().copied().zip(ys.iter().copied()).collect(), faces)
    }

    pub fn nodes(&self) -> &[(f64, f64)] {
        &self.nodes
    }

    pub fn faces(&self) -> &FaceNodes {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Derive vertex rings and centroids for every face.
    pub fn face_geometry(&self) -> FaceGeometry {
        let mut offsets = Vec::with_capacity(self.faces.len() + 1);
        let mut vertices = Vec::with_capacity(self.faces.counts().iter().sum());
        let mut centroids = Vec::with_capacity(self.faces.len());

        offsets.push(0);
        for ring in self.faces.iter() {
            let (mut sx, mut sy) = (0.0, 0.0);
            for &node in ring {
                let (x, y) = self.nodes[node];
                sx += x;
                sy += y;
                vertices.push((x, y));
            }
            let n = ring.len() as f64;
            centroids.push((sx / n, sy / n));
            offsets.push(vertices.len());
        }

        FaceGeometry {
            offsets,
            vertices,
            centroids,
        }
    }
}

/// Per-face vertex rings and centroids.
///
/// Centroids are the arithmetic mean of each face's real vertices. Any
/// face-center coordinates shipped with the dataset (typically circumcenters)
/// are kept separately by the loader and never used here.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceGeometry {
    offsets: Vec<usize>,
    vertices: Vec<(f64, f64)>,
    centroids: Vec<(f64, f64)>,
}

impl FaceGeometry {
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// Ordered real vertices of one face.
    pub fn ring(&self, face: usize) -> &[(f64, f64)] {
        &self.vertices[self.offsets[face]..self.offsets[face + 1]]
    }

    pub fn rings(&self) -> impl Iterator<Item = &[(f64, f64)]> + '_ {
        (0..self.len()).map(move |f| self.ring(f))
    }

    pub fn centroid(&self, face: usize) -> (f64, f64) {
        self.centroids[face]
    }

    pub fn centroids(&self) -> &[(f64, f64)] {
        &self.centroids
    }
}
