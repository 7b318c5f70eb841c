use crate::{CalibrationError, CalibrationWarning, Stage};
use log::{info, warn};
use monocal_core::{
    CalibrationFlags, CalibrationResult, CompactedPoints, ImageSize, IntrinsicModel,
    UndistortOptions,
};
use monocal_optim::{CameraCalibrationSolver, SolveRequest, TermCriteria};

/// Bootstrap result together with the flags it was actually solved with.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseOutcome {
    pub result: CalibrationResult,
    /// Caller flags, plus `USE_INTRINSIC_GUESS` when the default guess was synthesised.
    pub flags: CalibrationFlags,
    pub warnings: Vec<CalibrationWarning>,
}

/// First pass: calibrate from the valid control points alone.
pub struct BaseCalibrator<'s, S: ?Sized> {
    solver: &'s S,
    pub criteria: TermCriteria,
    pub undistort: UndistortOptions,
}

impl<'s, S: CameraCalibrationSolver + ?Sized> BaseCalibrator<'s, S> {
    pub fn new(solver: &'s S, criteria: TermCriteria, undistort: UndistortOptions) -> Self {
        Self {
            solver,
            criteria,
            undistort,
        }
    }

    /// Without an `initial` guess, start from `fx = fy = width` at the image
    /// centre with zero distortion and force `USE_INTRINSIC_GUESS`.
    pub fn calibrate(
        &self,
        points: &CompactedPoints,
        image_size: ImageSize,
        initial: Option<IntrinsicModel>,
        flags: CalibrationFlags,
    ) -> Result<BaseOutcome, CalibrationError> {
        if points.is_empty() {
            return Err(CalibrationError::InsufficientData {
                stage: Stage::Compaction,
                reason: format!(
                    "none of the {} control points has all five coordinates",
                    points.map.total_count()
                ),
            });
        }

        let mut warnings = Vec::new();
        if flags.is_empty() {
            let w = CalibrationWarning::ZeroFlags;
            warn!("{w}");
            warnings.push(w);
        }

        let (initial, flags) = match initial {
            Some(guess) => (guess, flags),
            None => (
                IntrinsicModel::default_guess(image_size),
                flags | CalibrationFlags::USE_INTRINSIC_GUESS,
            ),
        };

        info!(
            "bootstrap: {} of {} control points usable, flags {}",
            points.len(),
            points.map.total_count(),
            flags
        );
        let request = SolveRequest {
            object_points: &points.object_points,
            image_points: &points.image_points,
            image_size,
            initial,
            initial_pose: None,
            flags,
            criteria: self.criteria,
            undistort: self.undistort,
        };
        let result = self.solver.solve(&request).map_err(|err| {
            warn!("bootstrap solve failed (flags {flags}): {err}");
            CalibrationError::from_solver(Stage::Bootstrap, flags, err)
        })?;
        info!("bootstrap: rms {:.4} px", result.rms);
        if !result.converged {
            let w = CalibrationWarning::BootstrapNotConverged {
                max_iters: self.criteria.max_iters,
                flags,
            };
            warn!("{w}");
            warnings.push(w);
        }

        Ok(BaseOutcome {
            result,
            flags,
            warnings,
        })
    }
}
