use nalgebra::{Matrix3, RealField, Vector2};
use serde::{Deserialize, Serialize};

/// Maps sensor-plane coordinates to pixels and back.
pub trait IntrinsicsModel<S: RealField + Copy> {
    fn sensor_to_pixel(&self, sensor: &Vector2<S>) -> Vector2<S>;
    fn pixel_to_sensor(&self, pixel: &Vector2<S>) -> Vector2<S>;
}

/// Camera matrix without skew: `u = fx·x + cx`, `v = fy·y + cy`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinholeIntrinsics<S: RealField + Copy> {
    /// Focal length along X, pixels.
    pub fx: S,
    /// Focal length along Y, pixels.
    pub fy: S,
    /// Principal point X, pixels.
    pub cx: S,
    /// Principal point Y, pixels.
    pub cy: S,
}

impl<S: RealField + Copy> PinholeIntrinsics<S> {
    /// The 3x3 camera matrix `K`.
    pub fn k_matrix(&self) -> Matrix3<S> {
        let z = S::zero();
        Matrix3::new(self.fx, z, self.cx, z, self.fy, self.cy, z, z, S::one())
    }
}

impl<S: RealField + Copy> IntrinsicsModel<S> for PinholeIntrinsics<S> {
    fn sensor_to_pixel(&self, sensor: &Vector2<S>) -> Vector2<S> {
        Vector2::new(
            self.fx * sensor.x + self.cx,
            self.fy * sensor.y + self.cy,
        )
    }

    fn pixel_to_sensor(&self, pixel: &Vector2<S>) -> Vector2<S> {
        Vector2::new(
            (pixel.x - self.cx) / self.fx,
            (pixel.y - self.cy) / self.fy,
        )
    }
}
