//! Synthetic mesh and field generators.
//!
//! Meshes are returned as plain node lists and zero-based face rows so the
//! helpers stay independent of the parser crate.

/// Node coordinates plus zero-based face-node rows.
pub type SyntheticMesh = (Vec<(f64, f64)>, Vec<Vec<usize>>);

/// A regular lattice of `cols` x `rows` cells, each split into two triangles.
///
/// Nodes are numbered row-major starting at `(min_x, min_y)`.
///
/// ```
/// use test_utils::triangle_strip_mesh;
///
/// let (nodes, faces) = triangle_strip_mesh(0.0, 0.0, 1.0, 1.0, 2, 1);
/// assert_eq!(nodes.len(), 6);
/// assert_eq!(faces.len(), 4);
/// ```
pub fn triangle_strip_mesh(
    min_x: f64,
    min_y: f64,
    dx: f64,
    dy: f64,
    cols: usize,
    rows: usize,
) -> SyntheticMesh {
    let stride = cols + 1;
    let mut nodes = Vec::with_capacity(stride * (rows + 1));
    for j in 0..=rows {
        for i in 0..=cols {
            nodes.push((min_x + i as f64 * dx, min_y + j as f64 * dy));
        }
    }

    let mut faces = Vec::with_capacity(cols * rows * 2);
    for j in 0..rows {
        for i in 0..cols {
            let sw = j * stride + i;
            let se = sw + 1;
            let nw = sw + stride;
            let ne = nw + 1;
            faces.push(vec![sw, se, nw]);
            faces.push(vec![se, ne, nw]);
        }
    }

    (nodes, faces)
}

/// Four triangles covering 170..190 E, -10..10 N, using 0..360 longitudes.
pub fn dateline_mesh_east_positive() -> SyntheticMesh {
    triangle_strip_mesh(170.0, -10.0, 10.0, 20.0, 2, 1)
}

/// Four triangles covering the same area, with the eastern half written in
/// -180..180 longitudes so its faces touch the -180 meridian.
pub fn dateline_mesh_wrapped() -> SyntheticMesh {
    let nodes = vec![
        (170.0, -10.0),
        (180.0, -10.0),
        (170.0, 10.0),
        (180.0, 10.0),
        (-180.0, -10.0),
        (-170.0, -10.0),
        (-180.0, 10.0),
        (-170.0, 10.0),
    ];
    let faces = vec![
        vec![0, 1, 2],
        vec![1, 3, 2],
        vec![4, 5, 6],
        vec![5, 7, 6],
    ];
    (nodes, faces)
}

/// A (time x face) field with the same value everywhere.
pub fn constant_field(n_times: usize, n_faces: usize, value: f64) -> Vec<f64> {
    vec![value; n_times * n_faces]
}

/// A (time x face) field where face `f` at step `t` holds `t * 1000 + f`.
///
/// Makes it easy to check that the right step and face were picked.
pub fn indexed_field(n_times: usize, n_faces: usize) -> Vec<f64> {
    let mut values = Vec::with_capacity(n_times * n_faces);
    for t in 0..n_times {
        for f in 0..n_faces {
            values.push((t * 1000 + f) as f64);
        }
    }
    values
}
