use crate::{
    camera_position_in_world, camera_to_world, from_homogeneous_4x4, matrix_to_rodrigues,
    rodrigues_to_matrix, to_homogeneous_4x4, GeometryError, Iso3, Mat3, Mat4, Pt3,
    RotationInput, Vec3,
};
use nalgebra::{Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

/// World → camera rigid transform as a Rodrigues vector and a translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtrinsicPose {
    pub rvec: Vec3,
    pub tvec: Vec3,
}

impl ExtrinsicPose {
    pub fn new(rvec: Vec3, tvec: Vec3) -> Self {
        Self { rvec, tvec }
    }

    /// Build from any accepted rotation representation.
    pub fn from_rotation(rotation: RotationInput, tvec: Vec3) -> Result<Self, GeometryError> {
        Ok(Self {
            rvec: rotation.to_rodrigues()?,
            tvec,
        })
    }

    pub fn from_homogeneous(m: &Mat4) -> Result<Self, GeometryError> {
        let (r, t) = from_homogeneous_4x4(m)?;
        Ok(Self {
            rvec: matrix_to_rodrigues(&r)?,
            tvec: t,
        })
    }

    pub fn from_iso(iso: &Iso3) -> Self {
        Self {
            rvec: iso.rotation.scaled_axis(),
            tvec: iso.translation.vector,
        }
    }

    pub fn to_iso(&self) -> Iso3 {
        Iso3::from_parts(
            Translation3::from(self.tvec),
            UnitQuaternion::from_scaled_axis(self.rvec),
        )
    }

    pub fn rotation_matrix(&self) -> Mat3 {
        rodrigues_to_matrix(&self.rvec)
    }

    /// 4x4 world → camera matrix.
    pub fn to_homogeneous(&self) -> Mat4 {
        to_homogeneous_4x4(&self.rotation_matrix(), &self.tvec)
    }

    /// Camera centre in world coordinates.
    pub fn camera_position(&self) -> Vec3 {
        camera_position_in_world(&self.rotation_matrix(), &self.tvec)
    }

    /// World point expressed in the camera frame.
    pub fn transform_point(&self, p_w: &Pt3) -> Vec3 {
        self.rotation_matrix() * p_w.coords + self.tvec
    }

    /// Camera-frame point expressed in the world frame.
    pub fn inverse_transform_point(&self, p_c: &Vec3) -> Pt3 {
        camera_to_world(&self.rotation_matrix(), &self.tvec, p_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_and_inverse_agree() {
        let pose = ExtrinsicPose::new(Vec3::new(0.1, -0.3, 0.2), Vec3::new(-5.0, 3.0, 400.0));
        let pw = Pt3::new(12.0, -7.0, 30.0);
        let pc = pose.transform_point(&pw);
        assert!((pose.inverse_transform_point(&pc) - pw).norm() < 1e-9);

        let iso = pose.to_iso();
        assert!((iso.transform_point(&pw).coords - pc).norm() < 1e-9);
        let back = ExtrinsicPose::from_iso(&iso);
        assert!((back.rvec - pose.rvec).norm() < 1e-12);

        let from_h = ExtrinsicPose::from_homogeneous(&pose.to_homogeneous()).unwrap();
        assert!((from_h.rvec - pose.rvec).norm() < 1e-9);
        assert!((from_h.tvec - pose.tvec).norm() < 1e-9);
    }
}
