//! Gap filling of sparse bands by linear scattered-data interpolation.
//!
//! Every finite, non-nodata pixel is a control point at its `(col, row)`
//! pixel coordinate. The control points are triangulated once (Delaunay) and
//! every pixel is evaluated by barycentric interpolation on that
//! triangulation. Pixels outside the convex hull come out as NaN.

use rayon::prelude::*;
use spade::{DelaunayTriangulation, FloatTriangulation, HasPosition, Point2, Triangulation};
use tracing::debug;

use crate::error::{RasterError, Result};
use crate::types::RasterBand;

/// One control point of the triangulation.
#[derive(Debug, Clone, Copy)]
struct Sample {
    position: Point2<f64>,
    value: f64,
}

impl HasPosition for Sample {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

fn is_control(value: f64, nodata: f64) -> bool {
    value.is_finite() && value != nodata
}

/// Interpolate every pixel of `band` from its control points.
///
/// Control pixels keep their value exactly. A band with no control points,
/// or with control points that are all collinear, becomes NaN everywhere
/// except at the control points themselves.
pub fn fill_gaps(band: &RasterBand, nodata: f64) -> Result<RasterBand> {
    let (width, height) = band.shape();
    let source = band.data();

    let samples: Vec<Sample> = source
        .iter()
        .enumerate()
        .filter(|(_, &v)| is_control(v, nodata))
        .map(|(i, &value)| Sample {
            position: Point2::new((i % width) as f64, (i / width) as f64),
            value,
        })
        .collect();
    let controls = samples.len();

    let mut output = vec![f64::NAN; width * height];

    if controls == width * height {
        output.copy_from_slice(source);
    } else if controls > 0 {
        let triangulation = DelaunayTriangulation::<Sample>::bulk_load(samples)
            .map_err(|e| RasterError::Interpolation(format!("{:?}", e)))?;
        let has_faces = triangulation.num_inner_faces() > 0;

        output
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, out_row)| {
                let barycentric = triangulation.barycentric();
                let src_row = &source[row * width..(row + 1) * width];
                for (col, out) in out_row.iter_mut().enumerate() {
                    let value = src_row[col];
                    if is_control(value, nodata) {
                        *out = value;
                    } else if has_faces {
                        let query = Point2::new(col as f64, row as f64);
                        *out = barycentric
                            .interpolate(|v| v.data().value, query)
                            .unwrap_or(f64::NAN);
                    }
                }
            });
    }

    debug!(
        band = band.name(),
        controls,
        pixels = width * height,
        "Filled gaps"
    );

    RasterBand::new(band.name(), width, height, output)
}

/// Binary coverage grid: 1.0 where `band` holds a control point, 0.0 elsewhere.
pub fn boundary_indicator(band: &RasterBand, nodata: f64) -> RasterBand {
    let mut indicator = RasterBand::filled(band.name(), band.width(), band.height(), 0.0);
    for (out, &value) in indicator.data_mut().iter_mut().zip(band.data()) {
        if is_control(value, nodata) {
            *out = 1.0;
        }
    }
    indicator
}
