use monocal_core::CalibrationResult;
use monocal_linear::PoseInitError;
use thiserror::Error;

/// Failures of a single calibration solve.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("{object} object points but {image} image points")]
    CountMismatch { object: usize, image: usize },
    #[error("{residuals} residuals cannot determine {parameters} free parameters")]
    Underdetermined { residuals: usize, parameters: usize },
    #[error("initial pose estimation failed: {0}")]
    PoseInit(#[from] PoseInitError),
    /// The minimiser stopped on a numerical failure. `best_effort` holds the
    /// last parameter state it reached.
    #[error("minimiser diverged: {reason}")]
    Diverged {
        reason: String,
        best_effort: Box<CalibrationResult>,
    },
}
