use nalgebra::{Matrix3, RealField, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Sensor model mapping between normalized and sensor-plane coordinates.
pub trait SensorModel<S: RealField + Copy> {
    /// Map (distorted) normalized coordinates to the sensor plane.
    fn normalized_to_sensor(&self, n: &Vector2<S>) -> Vector2<S>;
    /// Map sensor-plane coordinates back to normalized coordinates.
    fn sensor_to_normalized(&self, s: &Vector2<S>) -> Vector2<S>;
}

/// Tilted (Scheimpflug) sensor, OpenCV `taux`/`tauy` convention.
///
/// Both angles zero gives the identity mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TiltSensor<S: RealField + Copy> {
    /// Rotation about the X axis, radians.
    pub tau_x: S,
    /// Rotation about the Y axis, radians.
    pub tau_y: S,
}

impl<S: RealField + Copy> TiltSensor<S> {
    pub fn new(tau_x: S, tau_y: S) -> Self {
        Self { tau_x, tau_y }
    }

    /// Normalized → sensor homography (OpenCV `computeTiltProjectionMatrix`).
    pub fn matrix(&self) -> Matrix3<S> {
        let (rot_xy, proj_z) = self.factors();
        proj_z * rot_xy
    }

    /// Closed-form inverse of [`Self::matrix`]. Defined while
    /// `cos(tau_x)·cos(tau_y) != 0`.
    pub fn inverse_matrix(&self) -> Matrix3<S> {
        let (rot_xy, _) = self.factors();
        let z = S::zero();
        let one = S::one();
        let a = rot_xy[(2, 2)];
        let proj_z_inv = Matrix3::new(
            one / a,
            z,
            rot_xy[(0, 2)] / a,
            z,
            one / a,
            rot_xy[(1, 2)] / a,
            z,
            z,
            one,
        );
        rot_xy.transpose() * proj_z_inv
    }

    fn factors(&self) -> (Matrix3<S>, Matrix3<S>) {
        let (s_tx, c_tx) = self.tau_x.sin_cos();
        let (s_ty, c_ty) = self.tau_y.sin_cos();
        let z = S::zero();
        let one = S::one();

        let rot_x = Matrix3::new(one, z, z, z, c_tx, s_tx, z, -s_tx, c_tx);
        let rot_y = Matrix3::new(c_ty, z, -s_ty, z, one, z, s_ty, z, c_ty);
        let rot_xy = rot_y * rot_x;

        let proj_z = Matrix3::new(
            rot_xy[(2, 2)],
            z,
            -rot_xy[(0, 2)],
            z,
            rot_xy[(2, 2)],
            -rot_xy[(1, 2)],
            z,
            z,
            one,
        );
        (rot_xy, proj_z)
    }
}

impl<S: RealField + Copy> SensorModel<S> for TiltSensor<S> {
    fn normalized_to_sensor(&self, n: &Vector2<S>) -> Vector2<S> {
        dehomogenize(&(self.matrix() * homogenize(n)))
    }

    fn sensor_to_normalized(&self, s: &Vector2<S>) -> Vector2<S> {
        dehomogenize(&(self.inverse_matrix() * homogenize(s)))
    }
}

fn homogenize<S: RealField + Copy>(p: &Vector2<S>) -> Vector3<S> {
    Vector3::new(p.x, p.y, S::one())
}

fn dehomogenize<S: RealField + Copy>(p: &Vector3<S>) -> Vector2<S> {
    Vector2::new(p.x / p.z, p.y / p.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_tilt_is_identity() {
        let t = TiltSensor::new(0.0_f64, 0.0);
        assert!((t.matrix() - Matrix3::identity()).norm() < 1e-15);
    }

    #[test]
    fn closed_form_inverse_matches_numeric() {
        let t = TiltSensor::new(0.03_f64, -0.02);
        let numeric = t.matrix().try_inverse().unwrap();
        let closed = t.inverse_matrix();
        // Homographies are defined up to scale.
        let scale = numeric[(2, 2)] / closed[(2, 2)];
        assert!((closed * scale - numeric).norm() < 1e-12);

        let n = Vector2::new(0.21, -0.13);
        let back = t.sensor_to_normalized(&t.normalized_to_sensor(&n));
        assert!((back - n).norm() < 1e-12);
    }
}
