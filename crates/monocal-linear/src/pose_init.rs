//! Closed-form initial pose from control points in normalized image coordinates.

use crate::{
    decompose_camera_matrix, dlt_camera_matrix, dlt_homography, p3p, pose_from_homography,
    PoseInitError,
};
use log::debug;
use monocal_core::{centroid_3d, Iso3, Mat3, Pt2, Pt3, Real, Vec3};
use nalgebra::{Rotation3, Translation3, UnitQuaternion};

/// Planarity threshold on `sqrt(λmin / λmax)` of the world scatter matrix.
pub const COPLANAR_RATIO: Real = 1e-3;

/// Layout of a control point cloud, judged from its principal axes.
#[derive(Debug, Clone, PartialEq)]
pub enum PointLayout {
    /// All points lie (numerically) on one line or coincide.
    Colinear,
    /// Points span a plane. `frame` columns are the in-plane axes and the
    /// normal, forming a right-handed basis.
    Coplanar { centroid: Pt3, frame: Mat3 },
    General,
}

/// Classify the world point cloud by the spread along its principal axes.
pub fn classify_layout(world: &[Pt3]) -> PointLayout {
    let Some(centroid) = centroid_3d(world) else {
        return PointLayout::Colinear;
    };
    let scatter = world.iter().fold(Mat3::zeros(), |acc, p| {
        let d = p - centroid;
        acc + d * d.transpose()
    });
    let eig = scatter.symmetric_eigen();
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));
    let lambda = order.map(|i| eig.eigenvalues[i].max(0.0));

    if lambda[0] <= Real::EPSILON || (lambda[1] / lambda[0]).sqrt() < COPLANAR_RATIO {
        return PointLayout::Colinear;
    }
    if (lambda[2] / lambda[0]).sqrt() < COPLANAR_RATIO {
        let e1: Vec3 = eig.eigenvectors.column(order[0]).into_owned();
        let e2: Vec3 = eig.eigenvectors.column(order[1]).into_owned();
        let frame = Mat3::from_columns(&[e1, e2, e1.cross(&e2)]);
        return PointLayout::Coplanar { centroid, frame };
    }
    PointLayout::General
}

/// Mean squared reprojection error of `pose` in normalized coordinates, or
/// `None` when any point ends up behind the camera.
pub fn normalized_reprojection_error(pose: &Iso3, world: &[Pt3], normalized: &[Pt2]) -> Option<Real> {
    let mut sum = 0.0;
    for (pw, pn) in world.iter().zip(normalized) {
        let pc = pose.transform_point(pw);
        if pc.z <= Real::EPSILON {
            return None;
        }
        sum += (pc.x / pc.z - pn.x).powi(2) + (pc.y / pc.z - pn.y).powi(2);
    }
    Some(sum / world.len().max(1) as Real)
}

fn best_candidate(
    candidates: impl IntoIterator<Item = Iso3>,
    world: &[Pt3],
    normalized: &[Pt2],
) -> Option<(Iso3, Real)> {
    candidates
        .into_iter()
        .filter_map(|pose| {
            normalized_reprojection_error(&pose, world, normalized).map(|err| (pose, err))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

fn iso_from_rt(r: &Mat3, t: &Vec3) -> Iso3 {
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(*r));
    Iso3::from_parts(Translation3::from(*t), rot)
}

fn planar_pose(
    world: &[Pt3],
    normalized: &[Pt2],
    centroid: &Pt3,
    frame: &Mat3,
) -> Result<Iso3, PoseInitError> {
    let plane: Vec<Pt2> = world
        .iter()
        .map(|p| {
            let local = frame.transpose() * (p - centroid);
            Pt2::new(local.x, local.y)
        })
        .collect();
    let h = dlt_homography(&plane, normalized)?;
    let plane_pose = pose_from_homography(&h)?;
    let r_p = *plane_pose.rotation.to_rotation_matrix().matrix();
    let r = r_p * frame.transpose();
    let t = plane_pose.translation.vector - r * centroid.coords;
    Ok(iso_from_rt(&r, &t))
}

fn general_pose(world: &[Pt3], normalized: &[Pt2]) -> Result<Iso3, PoseInitError> {
    let dlt = dlt_camera_matrix(world, normalized)
        .and_then(|p| decompose_camera_matrix(&p))
        .map(|dec| iso_from_rt(&dec.r, &dec.t));
    match dlt {
        Ok(pose) if normalized_reprojection_error(&pose, world, normalized).is_some() => Ok(pose),
        Ok(_) => {
            debug!("DLT pose places points behind the camera; trying P3P");
            p3p_all_triples(world, normalized)
        }
        Err(err) => {
            debug!("DLT pose failed ({err}); trying P3P");
            p3p_all_triples(world, normalized)
        }
    }
}

fn p3p_all_triples(world: &[Pt3], normalized: &[Pt2]) -> Result<Iso3, PoseInitError> {
    let n = world.len();
    let mut candidates = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let w = [world[i], world[j], world[k]];
                let m = [normalized[i], normalized[j], normalized[k]];
                if let Ok(sols) = p3p(&w, &m) {
                    candidates.extend(sols);
                }
            }
        }
    }
    best_candidate(candidates, world, normalized)
        .map(|(pose, _)| pose)
        .ok_or(PoseInitError::NoValidPose)
}

/// Estimate the world → camera pose from at least four control points whose
/// image positions are already undistorted and normalized.
///
/// Coplanar clouds go through a plane homography, general clouds with six or
/// more points through DLT, and smaller general clouds through P3P on every
/// triple, keeping the candidate with the lowest reprojection error overall.
pub fn estimate_initial_pose(world: &[Pt3], normalized: &[Pt2]) -> Result<Iso3, PoseInitError> {
    if world.len() != normalized.len() {
        return Err(PoseInitError::CountMismatch {
            world: world.len(),
            image: normalized.len(),
        });
    }
    if world.len() < 4 {
        return Err(PoseInitError::NotEnoughPoints {
            needed: 4,
            got: world.len(),
        });
    }

    let pose = match classify_layout(world) {
        PointLayout::Colinear => {
            return Err(PoseInitError::Degenerate("control points are colinear"))
        }
        PointLayout::Coplanar { centroid, frame } => {
            debug!("initial pose: coplanar layout, {} points", world.len());
            planar_pose(world, normalized, &centroid, &frame)?
        }
        PointLayout::General if world.len() >= 6 => {
            debug!("initial pose: DLT on {} points", world.len());
            general_pose(world, normalized)?
        }
        PointLayout::General => {
            debug!("initial pose: P3P over triples of {} points", world.len());
            p3p_all_triples(world, normalized)?
        }
    };

    if normalized_reprojection_error(&pose, world, normalized).is_none() {
        return Err(PoseInitError::NoValidPose);
    }
    Ok(pose)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gt_pose() -> Iso3 {
        Iso3::from_parts(
            Translation3::new(-50.0, -40.0, 420.0),
            Rotation3::from_scaled_axis(Vec3::new(0.1, -0.2, 0.05)).into(),
        )
    }

    fn project_all(pose: &Iso3, world: &[Pt3]) -> Vec<Pt2> {
        world
            .iter()
            .map(|p| {
                let c = pose.transform_point(p);
                Pt2::new(c.x / c.z, c.y / c.z)
            })
            .collect()
    }

    fn assert_close(est: &Iso3, gt: &Iso3, tol_t: Real) {
        let dt = (est.translation.vector - gt.translation.vector).norm();
        let dr = est.rotation.angle_to(&gt.rotation);
        assert!(dt < tol_t, "translation off by {dt}");
        assert!(dr < 1e-6, "rotation off by {dr}");
    }

    #[test]
    fn general_layout_uses_dlt() {
        let world = vec![
            Pt3::new(0.0, 0.0, 0.0),
            Pt3::new(100.0, 0.0, 0.0),
            Pt3::new(100.0, 100.0, 0.0),
            Pt3::new(0.0, 100.0, 0.0),
            Pt3::new(50.0, 50.0, 50.0),
            Pt3::new(0.0, 0.0, 100.0),
        ];
        let gt = gt_pose();
        let image = project_all(&gt, &world);
        let est = estimate_initial_pose(&world, &image).unwrap();
        assert_close(&est, &gt, 1e-4);
    }

    #[test]
    fn planar_layout_uses_homography() {
        let mut world = Vec::new();
        for i in 0..3 {
            for j in 0..3 {
                world.push(Pt3::new(40.0 * i as Real, 40.0 * j as Real, 10.0));
            }
        }
        assert!(matches!(classify_layout(&world), PointLayout::Coplanar { .. }));
        let gt = gt_pose();
        let image = project_all(&gt, &world);
        let est = estimate_initial_pose(&world, &image).unwrap();
        assert_close(&est, &gt, 1e-4);
    }

    #[test]
    fn four_general_points_use_p3p() {
        let world = vec![
            Pt3::new(0.0, 0.0, 0.0),
            Pt3::new(100.0, 0.0, 0.0),
            Pt3::new(0.0, 100.0, 20.0),
            Pt3::new(30.0, 40.0, 80.0),
        ];
        assert_eq!(classify_layout(&world), PointLayout::General);
        let gt = gt_pose();
        let image = project_all(&gt, &world);
        let est = estimate_initial_pose(&world, &image).unwrap();
        assert_close(&est, &gt, 1e-4);
    }

    #[test]
    fn colinear_points_are_rejected() {
        let world: Vec<Pt3> = (0..5).map(|i| Pt3::new(i as Real, 2.0 * i as Real, 0.0)).collect();
        let image = vec![Pt2::new(0.0, 0.0); 5];
        assert!(matches!(
            estimate_initial_pose(&world, &image),
            Err(PoseInitError::Degenerate(_))
        ));
    }

    #[test]
    fn three_points_are_not_enough() {
        let world = vec![Pt3::origin(); 3];
        let image = vec![Pt2::origin(); 3];
        assert_eq!(
            estimate_initial_pose(&world, &image),
            Err(PoseInitError::NotEnoughPoints { needed: 4, got: 3 })
        );
    }
}
