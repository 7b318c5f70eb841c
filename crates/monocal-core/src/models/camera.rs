use nalgebra::{RealField, Vector2, Vector3};

use super::{perspective, ray_through, DistortionModel, IntrinsicsModel, SensorModel};

/// Pinhole camera assembled from its stages:
/// `pixel = K ∘ sensor ∘ distortion ∘ perspective`.
#[derive(Clone, Debug)]
pub struct Camera<S, D, Sm, K>
where
    S: RealField + Copy,
    D: DistortionModel<S>,
    Sm: SensorModel<S>,
    K: IntrinsicsModel<S>,
{
    pub dist: D,
    pub sensor: Sm,
    pub k: K,
    _scalar: std::marker::PhantomData<S>,
}

impl<S, D, Sm, K> Camera<S, D, Sm, K>
where
    S: RealField + Copy,
    D: DistortionModel<S>,
    Sm: SensorModel<S>,
    K: IntrinsicsModel<S>,
{
    pub fn new(dist: D, sensor: Sm, k: K) -> Self {
        Self {
            dist,
            sensor,
            k,
            _scalar: std::marker::PhantomData,
        }
    }

    /// Pixel of a camera-frame point; `None` when it is behind the camera.
    pub fn project_point(&self, p_c: &Vector3<S>) -> Option<Vector2<S>> {
        perspective(p_c).map(|n| self.project_normalized(&n))
    }

    /// Pixel of an undistorted normalized coordinate.
    pub fn project_normalized(&self, n_u: &Vector2<S>) -> Vector2<S> {
        let n_d = self.dist.distort(n_u);
        self.k.sensor_to_pixel(&self.sensor.normalized_to_sensor(&n_d))
    }

    /// Undistorted normalized coordinate of a pixel.
    pub fn pixel_to_normalized(&self, px: &Vector2<S>) -> Vector2<S> {
        let n_d = self.sensor.sensor_to_normalized(&self.k.pixel_to_sensor(px));
        self.dist.undistort(&n_d)
    }

    /// Unit viewing ray through a pixel.
    pub fn backproject_pixel(&self, px: &Vector2<S>) -> Vector3<S> {
        ray_through(&self.pixel_to_normalized(px)).normalize()
    }
}
