//! Perspective division between the camera frame and the `z = 1` plane.

use nalgebra::{RealField, Vector2, Vector3};

/// Normalized coordinate of a camera-frame point; `None` unless `z > 0`.
pub fn perspective<S: RealField + Copy>(p_c: &Vector3<S>) -> Option<Vector2<S>> {
    (p_c.z > S::zero()).then(|| Vector2::new(p_c.x / p_c.z, p_c.y / p_c.z))
}

/// Perspective division with `z` clamped to at least `min_depth`.
///
/// Used inside the minimiser, where a trial step may push a point behind the
/// camera and the residual must stay finite.
pub fn perspective_clamped<S: RealField + Copy>(p_c: &Vector3<S>, min_depth: S) -> Vector2<S> {
    let z = if p_c.z > min_depth { p_c.z } else { min_depth };
    Vector2::new(p_c.x / z, p_c.y / z)
}

/// Unnormalised viewing direction through a normalized image point.
pub fn ray_through<S: RealField + Copy>(n: &Vector2<S>) -> Vector3<S> {
    Vector3::new(n.x, n.y, S::one())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_division_stays_finite_behind_the_camera() {
        let behind = Vector3::new(0.5, -0.25, -2.0);
        assert!(perspective(&behind).is_none());
        let n = perspective_clamped(&behind, 1e-3);
        assert!((n - Vector2::new(500.0, -250.0)).norm() < 1e-9);

        let front = Vector3::new(1.0, 2.0, 4.0);
        assert_eq!(perspective(&front), Some(perspective_clamped(&front, 1e-3)));
        assert_eq!(ray_through(&Vector2::new(0.25, 0.5)) * 4.0, front);
    }
}
