//! Error types for UGRID dataset parsing.

use mesh_common::TimeParseError;
use thiserror::Error;

/// Result type for UGRID parser operations.
pub type UgridResult<T> = Result<T, UgridError>;

/// Error types for UGRID parsing.
#[derive(Error, Debug)]
pub enum UgridError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Node or face arrays are absent or inconsistent
    #[error("Malformed mesh: {0}")]
    MeshFormat(String),

    /// Requested field is absent, or a timestep index is out of range
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// File could not be opened or read as netCDF
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Time coordinate could not be decoded
    #[error("Invalid time coordinate: {0}")]
    Time(#[from] TimeParseError),
}

impl UgridError {
    pub fn mesh_format(msg: impl Into<String>) -> Self {
        Self::MeshFormat(msg.into())
    }

    pub fn variable_not_found(msg: impl Into<String>) -> Self {
        Self::VariableNotFound(msg.into())
    }
}
