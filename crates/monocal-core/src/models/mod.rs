//! Camera model building blocks.
//!
//! After the perspective division ([`perspective`]) a pixel is produced by
//! three stages, each behind a trait so that the same code runs on `f64` and
//! on dual numbers:
//!
//! 1. [`DistortionModel`]: lens distortion in normalized space.
//! 2. [`SensorModel`]: sensor-plane homography (tilt).
//! 3. [`IntrinsicsModel`]: sensor plane → pixels.
//!
//! [`StandardCamera`] is the full OpenCV-compatible 14-coefficient model.

mod camera;
mod distortion;
mod intrinsics;
mod projection;
mod sensor;

pub use camera::*;
pub use distortion::*;
pub use intrinsics::*;
pub use projection::*;
pub use sensor::*;

use nalgebra::RealField;

/// Pinhole camera with rational/tangential/thin-prism distortion and tilt.
pub type StandardCamera<S> = Camera<S, LensDistortion<S>, TiltSensor<S>, PinholeIntrinsics<S>>;

/// Number of scalars in a packed intrinsic vector:
/// `fx, fy, cx, cy` followed by the 14 canonical distortion terms.
pub const INTRINSIC_PARAMS: usize = 18;

/// Build a [`StandardCamera`] from a packed intrinsic vector
/// `[fx, fy, cx, cy, k1, k2, p1, p2, k3, k4, k5, k6, s1, s2, s3, s4, taux, tauy]`.
pub fn standard_camera<S: RealField + Copy>(
    p: &[S; INTRINSIC_PARAMS],
    undistort: UndistortOptions,
) -> StandardCamera<S> {
    let k = PinholeIntrinsics {
        fx: p[0],
        fy: p[1],
        cx: p[2],
        cy: p[3],
    };
    let mut coeffs = [S::zero(); 12];
    coeffs.copy_from_slice(&p[4..16]);
    let dist = LensDistortion::from_coeffs(&coeffs, undistort);
    Camera::new(dist, TiltSensor::new(p[16], p[17]), k)
}
