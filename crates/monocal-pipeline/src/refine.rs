use crate::{CalibrationError, CalibrationWarning, ExpandedCorrespondences, Stage};
use log::{info, warn};
use monocal_core::{CalibrationFlags, CalibrationResult, UndistortOptions};
use monocal_optim::{CameraCalibrationSolver, SolveRequest, TermCriteria};

/// Result of the second pass. On failure `result` is the bootstrap calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementOutcome {
    pub result: CalibrationResult,
    pub refined: bool,
    pub warning: Option<CalibrationWarning>,
}

/// Second pass: calibrate again on the expanded correspondence set,
/// starting from the bootstrap intrinsics and pose. Only a converged solve
/// replaces the bootstrap result.
pub struct RefinementCalibrator<'s, S: ?Sized> {
    solver: &'s S,
    pub criteria: TermCriteria,
    pub undistort: UndistortOptions,
}

impl<'s, S: CameraCalibrationSolver + ?Sized> RefinementCalibrator<'s, S> {
    pub fn new(solver: &'s S, criteria: TermCriteria, undistort: UndistortOptions) -> Self {
        Self {
            solver,
            criteria,
            undistort,
        }
    }

    pub fn refine(
        &self,
        expanded: &ExpandedCorrespondences,
        bootstrap: &CalibrationResult,
        flags: CalibrationFlags,
    ) -> RefinementOutcome {
        let request = SolveRequest {
            object_points: &expanded.object_points,
            image_points: &expanded.image_points,
            image_size: bootstrap.image_size,
            initial: bootstrap.intrinsics,
            initial_pose: Some(bootstrap.pose),
            flags,
            criteria: self.criteria,
            undistort: self.undistort,
        };
        match self.solver.solve(&request) {
            Ok(result) if !result.converged => fallback_to_bootstrap(
                bootstrap,
                format!(
                    "iteration cap of {} reached before convergence (rms {:.4} px, flags {flags})",
                    self.criteria.max_iters, result.rms
                ),
            ),
            Ok(result) => {
                info!(
                    "refinement: rms {:.4} px over {} correspondences ({} synthetic)",
                    result.rms,
                    expanded.len(),
                    expanded.synthetic_count()
                );
                RefinementOutcome {
                    result,
                    refined: true,
                    warning: None,
                }
            }
            Err(err) => {
                let err = CalibrationError::from_solver(Stage::Refinement, flags, err);
                fallback_to_bootstrap(bootstrap, err.to_string())
            }
        }
    }
}

/// Keep the bootstrap result and record why.
pub(crate) fn fallback_to_bootstrap(bootstrap: &CalibrationResult, reason: String) -> RefinementOutcome {
    let warning = CalibrationWarning::RefinementFailed { reason };
    warn!("{warning}");
    RefinementOutcome {
        result: bootstrap.clone(),
        refined: false,
        warning: Some(warning),
    }
}
