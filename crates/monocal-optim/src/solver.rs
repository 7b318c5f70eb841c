use crate::backend_lm::{minimize, LmOutcome, ReprojectionProblem};
use crate::covariance::parameter_std_devs;
use crate::params::{pack, unpack, ParamLayout, PARAM_COUNT, P1, P2, RVEC};
use crate::residual::{per_point_errors, rms, Observations};
use crate::{SolverError, TermCriteria};
use log::{debug, info};
use monocal_core::{
    CalibrationFlags, CalibrationResult, ExtrinsicPose, ImageSize, IntrinsicModel, Pt2, Pt3, Real,
    UndistortOptions, INTRINSIC_PARAMS,
};
use monocal_linear::estimate_initial_pose;
use nalgebra::DVector;

/// Everything one calibration solve needs.
#[derive(Debug, Clone)]
pub struct SolveRequest<'a> {
    pub object_points: &'a [Pt3],
    pub image_points: &'a [Pt2],
    pub image_size: ImageSize,
    /// Starting intrinsics; also the model the initial pose is estimated under.
    pub initial: IntrinsicModel,
    /// Starting pose. Estimated in closed form when absent.
    pub initial_pose: Option<ExtrinsicPose>,
    /// Selects the free parameters. `USE_INTRINSIC_GUESS` is advisory for
    /// [`LmCalibrationSolver`], which always starts from `initial`.
    pub flags: CalibrationFlags,
    pub criteria: TermCriteria,
    /// Iterative undistortion used for the closed-form pose.
    pub undistort: UndistortOptions,
}

/// Solves intrinsics, distortion and pose from 3D ↔ 2D correspondences of
/// a single photo.
pub trait CameraCalibrationSolver {
    fn solve(&self, request: &SolveRequest<'_>) -> Result<CalibrationResult, SolverError>;
}

/// Levenberg-Marquardt over the flag-selected free parameters with an exact
/// forward-mode Jacobian.
#[derive(Debug, Default, Clone, Copy)]
pub struct LmCalibrationSolver;

impl LmCalibrationSolver {
    fn initial_pose(&self, request: &SolveRequest<'_>) -> Result<ExtrinsicPose, SolverError> {
        if let Some(pose) = request.initial_pose {
            return Ok(pose);
        }
        let normalized = request
            .initial
            .undistort_points_normalized(request.image_points, request.undistort);
        let iso = estimate_initial_pose(request.object_points, &normalized)?;
        let pose = ExtrinsicPose::from_iso(&iso);
        debug!(
            "closed-form pose: rvec = [{:.4}, {:.4}, {:.4}], tvec = [{:.4}, {:.4}, {:.4}]",
            pose.rvec.x, pose.rvec.y, pose.rvec.z, pose.tvec.x, pose.tvec.y, pose.tvec.z
        );
        Ok(pose)
    }
}

fn assemble_result(
    request: &SolveRequest<'_>,
    full: &[Real; PARAM_COUNT],
    dist_len: usize,
    r: &DVector<Real>,
    std_devs: [Real; PARAM_COUNT],
    converged: bool,
) -> CalibrationResult {
    let (intrinsics, pose) = unpack(full, dist_len);
    let mut std_dev_intrinsics = [0.0; INTRINSIC_PARAMS];
    std_dev_intrinsics.copy_from_slice(&std_devs[..INTRINSIC_PARAMS]);
    let mut std_dev_extrinsics = [0.0; 6];
    std_dev_extrinsics.copy_from_slice(&std_devs[RVEC..]);
    CalibrationResult {
        image_size: request.image_size,
        intrinsics,
        pose,
        std_dev_intrinsics,
        std_dev_extrinsics,
        rms: rms(r),
        per_point_errors: per_point_errors(r),
        converged,
    }
}

impl CameraCalibrationSolver for LmCalibrationSolver {
    fn solve(&self, request: &SolveRequest<'_>) -> Result<CalibrationResult, SolverError> {
        let n_points = request.object_points.len();
        if n_points != request.image_points.len() {
            return Err(SolverError::CountMismatch {
                object: n_points,
                image: request.image_points.len(),
            });
        }

        let flags = request.flags;
        let mut initial = request.initial;
        if flags.contains(CalibrationFlags::ZERO_TANGENT_DIST) {
            let mut coeffs = *initial.distortion.full();
            coeffs[P1 - 4] = 0.0;
            coeffs[P2 - 4] = 0.0;
            initial.distortion =
                monocal_core::DistortionVector::from_full(coeffs, initial.distortion.len());
        }
        let dist_len = flags.distortion_len().max(initial.distortion.len());

        let pose0 = ExtrinsicPose::default();
        let layout = ParamLayout::from_flags(flags, &pack(&initial, &pose0));
        let residual_count = 2 * n_points;
        if residual_count < layout.num_free() {
            return Err(SolverError::Underdetermined {
                residuals: residual_count,
                parameters: layout.num_free(),
            });
        }

        let pose0 = self.initial_pose(&SolveRequest {
            initial,
            ..request.clone()
        })?;
        let base = pack(&initial, &pose0);
        debug!(
            "solving {} points, {} free parameters, flags {}",
            n_points,
            layout.num_free(),
            flags
        );

        let problem = ReprojectionProblem {
            layout: &layout,
            base,
            obs: Observations {
                world: request.object_points,
                pixels: request.image_points,
            },
        };
        debug_assert_eq!(problem.obs.num_residuals(), residual_count);
        debug_assert_eq!(problem.obs.len(), n_points);

        let (x, report) = minimize(&problem, layout.free_values(&base), &request.criteria);
        let full = problem.full(&x);
        debug!(
            "LM stopped after {} evaluations: {:?}, cost {:.3e}",
            report.evaluations, report.outcome, report.final_cost
        );

        let final_state = problem
            .residuals(&x)
            .and_then(|r| problem.jacobian(&x).map(|j| (r, j)));

        match (report.outcome, final_state) {
            (LmOutcome::Failed(reason), state) => {
                let r = state
                    .map(|(r, _)| r)
                    .unwrap_or_else(|| DVector::from_element(residual_count, Real::NAN));
                Err(SolverError::Diverged {
                    reason,
                    best_effort: Box::new(assemble_result(
                        request,
                        &full,
                        dist_len,
                        &r,
                        [0.0; PARAM_COUNT],
                        false,
                    )),
                })
            }
            (_, None) => Err(SolverError::Diverged {
                reason: "non-finite residuals at the final state".to_string(),
                best_effort: Box::new(assemble_result(
                    request,
                    &full,
                    dist_len,
                    &DVector::from_element(residual_count, Real::NAN),
                    [0.0; PARAM_COUNT],
                    false,
                )),
            }),
            (outcome, Some((r, j))) => {
                let converged = outcome == LmOutcome::Converged;
                let std_devs = parameter_std_devs(&layout, &r, &j);
                let result = assemble_result(request, &full, dist_len, &r, std_devs, converged);
                info!(
                    "calibration solve: rms {:.4} px over {} points (converged: {})",
                    result.rms, n_points, converged
                );
                Ok(result)
            }
        }
    }
}
