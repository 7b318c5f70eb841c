use thiserror::Error;

/// Failures of the closed-form pose initialisation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PoseInitError {
    #[error("need at least {needed} control points, got {got}")]
    NotEnoughPoints { needed: usize, got: usize },
    #[error("mismatched number of world points ({world}) and image points ({image})")]
    CountMismatch { world: usize, image: usize },
    #[error("degenerate control point layout: {0}")]
    Degenerate(&'static str),
    #[error("singular value decomposition failed")]
    SvdFailed,
    #[error("no candidate pose places the control points in front of the camera")]
    NoValidPose,
}

/// Failures of the principal-axis line fit.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum LineFitError {
    #[error("need at least 2 points to fit a line, got {0}")]
    NotEnoughPoints(usize),
    #[error("points coincide; no direction can be fitted")]
    Degenerate,
}
