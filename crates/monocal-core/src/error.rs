use thiserror::Error;

/// Errors raised while ingesting or converting geometric quantities.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("rotation of shape {rows}x{cols} is not supported (expected 1x3, 3x1 or 3x3)")]
    UnsupportedShape { rows: usize, cols: usize },
    #[error("a {rows}x{cols} input needs {} values, got {got}", .rows * .cols)]
    LengthMismatch { rows: usize, cols: usize, got: usize },
    #[error("matrix is not a rotation (orthonormality error {error:.3e}, determinant {det:.6})")]
    NotARotation { error: f64, det: f64 },
    #[error("last row of a 4x4 pose must be [0, 0, 0, 1]")]
    NotRigid,
    #[error("distortion vector must have 4, 5, 8, 12 or 14 coefficients, got {0}")]
    DistortionLength(usize),
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}
