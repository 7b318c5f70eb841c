use crate::PoseInitError;
use monocal_core::{Iso3, Mat3, Real, Vec3};
use nalgebra::{Rotation3, Translation3, UnitQuaternion};

/// Pose of the plane `Z = 0` from a homography `H ~ [r1 r2 t]` that maps plane
/// coordinates to normalized image coordinates.
///
/// The scale sign is chosen so the plane lies in front of the camera.
pub fn pose_from_homography(h: &Mat3) -> Result<Iso3, PoseInitError> {
    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    let norm = 0.5 * (h1.norm() + h2.norm());
    if norm <= Real::EPSILON {
        return Err(PoseInitError::Degenerate("homography has no rotation part"));
    }
    let mut lambda = 1.0 / norm;
    if h3.z < 0.0 {
        lambda = -lambda;
    }

    let r1 = h1 * lambda;
    let r2 = h2 * lambda;
    let r3 = r1.cross(&r2);
    let approx = Mat3::from_columns(&[r1, r2, r3]);

    // Nearest rotation (polar decomposition).
    let svd = approx.svd(true, true);
    let u = svd.u.ok_or(PoseInitError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(PoseInitError::SvdFailed)?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_flip = u;
        u_flip.column_mut(2).neg_mut();
        r = u_flip * v_t;
    }

    let t: Vec3 = h3 * lambda;
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
    Ok(Iso3::from_parts(Translation3::from(t), rot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_synthetic_homography() {
        let rot = Rotation3::from_euler_angles(0.1, -0.05, 0.2);
        let t = Vec3::new(0.1, -0.05, 1.0);
        let r = rot.matrix();
        // Overall negative scale must not matter.
        let h = Mat3::from_columns(&[r.column(0).into_owned(), r.column(1).into_owned(), t]) * -3.0;

        let iso = pose_from_homography(&h).unwrap();
        assert!((iso.translation.vector - t).norm() < 1e-9);
        let r_est = iso.rotation.to_rotation_matrix();
        assert!((r_est.matrix() - r).norm() < 1e-9);
    }
}
