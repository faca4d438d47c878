//! UGRID mesh dataset parser.
//!
//! Reads unstructured-mesh ocean model output (node coordinates, ragged
//! face-node connectivity and per-face time series) from netCDF files that
//! follow the UGRID conventions, such as GLOSSIS domain forecasts.
//!
//! # Data Structure
//!
//! ```text
//! mesh2d                  topology variable, cf_role = "mesh_topology"
//! mesh2d_node_x/_y        node coordinates (degrees)
//! mesh2d_face_nodes       (face, max_face_nodes), padded with _FillValue
//! mesh2d_face_x/_y        model face centers (circumcenters, informational)
//! time                    "<unit> since <epoch>"
//! analysis_time           scalar provenance time
//! water_level, ...        (time, face) fields
//! ```

pub mod dataset;
pub mod error;
pub mod mesh;
pub mod native;

pub use dataset::{AttrValue, FieldArray, UgridDataset};
pub use error::{UgridError, UgridResult};
pub use mesh::{FaceGeometry, FaceNodes, Mesh};
pub use native::{open_ugrid, silence_hdf5_errors};
