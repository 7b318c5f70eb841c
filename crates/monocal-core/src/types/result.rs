use super::{ExtrinsicPose, ImageSize, IntrinsicModel};
use crate::{Pt2, Pt3, Real, UndistortOptions, INTRINSIC_PARAMS};
use serde::{Deserialize, Serialize};

/// Output of one calibration solve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub image_size: ImageSize,
    pub intrinsics: IntrinsicModel,
    pub pose: ExtrinsicPose,
    /// Standard deviations in packed order `fx, fy, cx, cy, k1, ..., tauy`.
    /// Parameters held fixed report zero.
    pub std_dev_intrinsics: [Real; INTRINSIC_PARAMS],
    /// Standard deviations of `rvec` then `tvec`.
    pub std_dev_extrinsics: [Real; 6],
    /// Root-mean-square reprojection error in pixels.
    pub rms: Real,
    /// Reprojection error of each correspondence, in solve order.
    pub per_point_errors: Vec<Real>,
    /// The minimiser met its tolerances (as opposed to hitting the iteration cap).
    pub converged: bool,
}

impl CalibrationResult {
    /// Project world points through this calibration; points behind the
    /// camera map to `None`.
    pub fn project_points(&self, world: &[Pt3], undistort: UndistortOptions) -> Vec<Option<Pt2>> {
        let cam = self.intrinsics.camera(undistort);
        world
            .iter()
            .map(|pw| {
                cam.project_point(&self.pose.transform_point(pw))
                    .map(Pt2::from)
            })
            .collect()
    }
}
