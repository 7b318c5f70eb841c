//! Synthetic 3D correspondences from groups of image points known to lie on
//! one straight world line.
//!
//! Each group is undistorted with the current model, snapped onto its
//! best-fit line in normalized coordinates, lifted to a common depth and
//! carried into the world frame with the current pose. The original
//! distorted pixels stay as the observations, so a second solve is pulled
//! towards a distortion model under which the group is straight.

use crate::{CalibrationError, ColinearDepth, Stage};
use log::debug;
use monocal_core::{
    CalibrationResult, ColinearGroup, ColinearGroupError, CompactedPoints, Coord, IntrinsicModel,
    Pt2, Pt3, Real, UndistortOptions, Vec3,
};
use monocal_linear::{fit_line_principal_axis, LineFitError};
use serde::Serialize;

/// Straightness diagnostics for one colinear group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColinearGroupReport {
    /// 1-based position in the caller's list.
    pub index: usize,
    pub points: usize,
    /// RMS distance to the fitted line in normalized units, under the
    /// bootstrap model and before correction.
    pub straightness_before: Real,
    /// Same measure under the final model.
    pub straightness_after: Option<Real>,
    /// Camera-frame depth the group was lifted to.
    pub depth: Real,
}

/// Control points followed by the synthetic colinear correspondences.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedCorrespondences {
    pub object_points: Vec<Pt3>,
    pub image_points: Vec<Pt2>,
    /// Number of leading entries that are real control points.
    pub base_count: usize,
    pub groups: Vec<ColinearGroupReport>,
}

impl ExpandedCorrespondences {
    pub fn len(&self) -> usize {
        self.object_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_points.is_empty()
    }

    pub fn synthetic_count(&self) -> usize {
        self.len() - self.base_count
    }
}

/// Validate every raw group before any computation runs.
///
/// The first failing group rejects the whole request; its 1-based index is
/// part of the error.
pub fn validate_colinear_groups(raw: &[Vec<Coord>]) -> Result<Vec<ColinearGroup>, CalibrationError> {
    raw.iter()
        .enumerate()
        .map(|(i, coords)| {
            let reject = |reason| CalibrationError::InputShape {
                stage: Stage::Validation,
                index: i + 1,
                reason,
            };
            let group = ColinearGroup::from_flat(coords).map_err(reject)?;
            match fit_line_principal_axis(group.points()) {
                Err(LineFitError::Degenerate) => Err(reject(ColinearGroupError::Degenerate)),
                _ => Ok(group),
            }
        })
        .collect()
}

/// RMS perpendicular distance of a group to its best-fit line after
/// undistortion through `intrinsics`, in normalized units.
pub fn group_straightness(
    group: &ColinearGroup,
    intrinsics: &IntrinsicModel,
    undistort: UndistortOptions,
) -> Result<Real, LineFitError> {
    let normalized = intrinsics.undistort_points_normalized(group.points(), undistort);
    let line = fit_line_principal_axis(&normalized)?;
    Ok(line.rms_distance(&normalized))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ColinearConstraintExpander {
    pub depth: ColinearDepth,
    pub undistort: UndistortOptions,
}

impl ColinearConstraintExpander {
    pub fn new(depth: ColinearDepth, undistort: UndistortOptions) -> Self {
        Self { depth, undistort }
    }

    fn resolve_depth(
        &self,
        base: &CompactedPoints,
        bootstrap: &CalibrationResult,
    ) -> Result<Real, CalibrationError> {
        let depth = match self.depth {
            ColinearDepth::Fixed { depth } => depth,
            ColinearDepth::MeanControlPointDepth => {
                let n = base.object_points.len().max(1) as Real;
                base.object_points
                    .iter()
                    .map(|p| bootstrap.pose.transform_point(p).z)
                    .sum::<Real>()
                    / n
            }
        };
        if !depth.is_finite() || depth <= 0.0 {
            return Err(CalibrationError::InsufficientData {
                stage: Stage::ColinearExpansion,
                reason: format!(
                    "colinear points would be placed at depth {depth}, which is not in front of the camera"
                ),
            });
        }
        Ok(depth)
    }

    /// Append one synthetic correspondence per colinear point to the control points.
    pub fn expand(
        &self,
        base: &CompactedPoints,
        groups: &[ColinearGroup],
        bootstrap: &CalibrationResult,
    ) -> Result<ExpandedCorrespondences, CalibrationError> {
        let depth = self.resolve_depth(base, bootstrap)?;
        let synthetic: usize = groups.iter().map(ColinearGroup::len).sum();
        let mut out = ExpandedCorrespondences {
            object_points: Vec::with_capacity(base.len() + synthetic),
            image_points: Vec::with_capacity(base.len() + synthetic),
            base_count: base.len(),
            groups: Vec::with_capacity(groups.len()),
        };
        out.object_points.extend_from_slice(&base.object_points);
        out.image_points.extend_from_slice(&base.image_points);

        for (i, group) in groups.iter().enumerate() {
            let normalized = bootstrap
                .intrinsics
                .undistort_points_normalized(group.points(), self.undistort);
            let line = fit_line_principal_axis(&normalized).map_err(|_| {
                CalibrationError::InputShape {
                    stage: Stage::ColinearExpansion,
                    index: i + 1,
                    reason: ColinearGroupError::Degenerate,
                }
            })?;
            let straightness_before = line.rms_distance(&normalized);

            for (u, px) in normalized.iter().zip(group.points()) {
                let on_line = line.project(u);
                let cam = Vec3::new(on_line.x * depth, on_line.y * depth, depth);
                out.object_points.push(bootstrap.pose.inverse_transform_point(&cam));
                out.image_points.push(*px);
            }
            debug!(
                "colinear group {}: {} points, straightness {:.3e} at depth {:.3}",
                i + 1,
                group.len(),
                straightness_before,
                depth
            );
            out.groups.push(ColinearGroupReport {
                index: i + 1,
                points: group.len(),
                straightness_before,
                straightness_after: None,
                depth,
            });
        }
        Ok(out)
    }
}
