use crate::{ExtrinsicPose, IntrinsicModel, Pt2, Pt3, Real, UndistortOptions};
use anyhow::{bail, Result};

/// Project world points through a known camera; fails if any point is
/// behind it.
pub fn project_world_points(
    intrinsics: &IntrinsicModel,
    pose: &ExtrinsicPose,
    world: &[Pt3],
) -> Result<Vec<Pt2>> {
    let cam = intrinsics.camera(UndistortOptions::default());
    world
        .iter()
        .enumerate()
        .map(|(i, pw)| match cam.project_point(&pose.transform_point(pw)) {
            Some(px) => Ok(Pt2::from(px)),
            None => bail!("synthetic point {i} ({pw}) is behind the camera"),
        })
        .collect()
}

/// Points at the given fractions along the segment `a → b`.
pub fn segment_points(a: &Pt3, b: &Pt3, fractions: &[Real]) -> Vec<Pt3> {
    fractions.iter().map(|&s| a + (b - a) * s).collect()
}

/// Layered grid: `nx × ny` points per layer at `spacing`, layers
/// `layer_gap` apart along Z.
pub fn grid_points_3d(nx: usize, ny: usize, layers: usize, spacing: Real, layer_gap: Real) -> Vec<Pt3> {
    let mut pts = Vec::with_capacity(nx * ny * layers);
    for l in 0..layers {
        for j in 0..ny {
            for i in 0..nx {
                pts.push(Pt3::new(
                    i as Real * spacing,
                    j as Real * spacing,
                    l as Real * layer_gap,
                ));
            }
        }
    }
    pts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImageSize, Vec3};

    #[test]
    fn grid_has_requested_size() {
        let g = grid_points_3d(4, 3, 2, 10.0, 5.0);
        assert_eq!(g.len(), 24);
        assert_eq!(g[23], Pt3::new(30.0, 20.0, 5.0));
    }

    #[test]
    fn behind_camera_is_an_error() {
        let intr = IntrinsicModel::default_guess(ImageSize::new(640, 480));
        let pose = ExtrinsicPose::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -10.0));
        assert!(project_world_points(&intr, &pose, &[Pt3::origin()]).is_err());
    }
}
