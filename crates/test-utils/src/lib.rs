//! Shared test utilities for the mesh-raster workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers and a skip macro for optional real datasets
//! - Synthetic mesh generators (triangle strips, dateline-crossing meshes)
//! - Approximate float comparison macros
//! - A writer for small UGRID netCDF domain files
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;
pub mod ugrid;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;
pub use ugrid::write_ugrid_domain;

/// Skip a test if the required data file is not found.
///
/// Real model output is large and not checked in; tests that need it return
/// early with a message when it is absent.
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_real_domain() {
///     let path = require_test_file!("glossis_waterlevel_00_fc.nc");
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Download test data or set TEST_DATA_DIR.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Approximate floating-point equality.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Approximate equality of `(x, y)` coordinate pairs.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}
