use monocal_core::{CalibrationFlags, CalibrationResult, ColinearGroupError, GeometryError};
use monocal_optim::SolverError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure or warning belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Validation,
    Compaction,
    Bootstrap,
    ColinearExpansion,
    Refinement,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validation => "input validation",
            Stage::Compaction => "control point compaction",
            Stage::Bootstrap => "bootstrap calibration",
            Stage::ColinearExpansion => "colinear expansion",
            Stage::Refinement => "refinement calibration",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationError {
    /// Malformed input; `index` is 1-based.
    #[error("{stage}: colinear group {index} {reason}")]
    InputShape {
        stage: Stage,
        index: usize,
        reason: ColinearGroupError,
    },
    #[error("{stage}: the initial calibration guess is unusable: {source}")]
    InvalidGuess {
        stage: Stage,
        #[source]
        source: GeometryError,
    },
    #[error("{stage}: not enough usable data: {reason}")]
    InsufficientData { stage: Stage, reason: String },
    #[error("{stage}: the solver failed with flags {flags}: {source}")]
    SolverDivergence {
        stage: Stage,
        flags: CalibrationFlags,
        #[source]
        source: SolverError,
    },
}

impl CalibrationError {
    pub fn stage(&self) -> Stage {
        match self {
            CalibrationError::InputShape { stage, .. }
            | CalibrationError::InvalidGuess { stage, .. }
            | CalibrationError::InsufficientData { stage, .. }
            | CalibrationError::SolverDivergence { stage, .. } => *stage,
        }
    }

    /// Last state the solver reached before failing, if it got that far.
    pub fn best_effort(&self) -> Option<&CalibrationResult> {
        match self {
            CalibrationError::SolverDivergence {
                source: SolverError::Diverged { best_effort, .. },
                ..
            } => Some(&**best_effort),
            _ => None,
        }
    }

    /// Sort a solver error into data shortage or numerical failure.
    pub(crate) fn from_solver(stage: Stage, flags: CalibrationFlags, err: SolverError) -> Self {
        use monocal_linear::PoseInitError;
        match err {
            SolverError::Underdetermined { .. }
            | SolverError::CountMismatch { .. }
            | SolverError::PoseInit(
                PoseInitError::NotEnoughPoints { .. }
                | PoseInitError::CountMismatch { .. }
                | PoseInitError::Degenerate(_),
            ) => CalibrationError::InsufficientData {
                stage,
                reason: err.to_string(),
            },
            source => CalibrationError::SolverDivergence {
                stage,
                flags,
                source,
            },
        }
    }
}

/// Non-fatal condition recorded in the report and logged at warn level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CalibrationWarning {
    /// No calibration flags were set, so every default distortion term is free.
    ZeroFlags,
    /// The bootstrap solve stopped at the iteration cap before meeting its tolerances.
    BootstrapNotConverged { max_iters: usize, flags: CalibrationFlags },
    /// The refinement pass failed; the bootstrap result was kept.
    RefinementFailed { reason: String },
}

impl fmt::Display for CalibrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationWarning::ZeroFlags => f.write_str(
                "no calibration flags set; the distortion model may be underdetermined by a single photo",
            ),
            CalibrationWarning::BootstrapNotConverged { max_iters, flags } => write!(
                f,
                "bootstrap calibration did not converge within {max_iters} iterations (flags {flags})"
            ),
            CalibrationWarning::RefinementFailed { reason } => write!(
                f,
                "refinement with colinear groups failed, keeping the bootstrap calibration: {reason}"
            ),
        }
    }
}
