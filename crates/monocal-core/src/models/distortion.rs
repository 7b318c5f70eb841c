use crate::Real;
use nalgebra::{RealField, Vector2};
use serde::{Deserialize, Serialize};

/// Lens distortion acting on normalized image coordinates.
pub trait DistortionModel<S: RealField + Copy> {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S>;
    fn undistort(&self, n_dist: &Vector2<S>) -> Vector2<S>;
}

/// Stopping rule for the iterative distortion inverse.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndistortOptions {
    /// Upper bound on fixed-point iterations.
    pub max_iters: usize,
    /// Stop once re-distorting the estimate lands this close (normalized units).
    pub tolerance: Real,
}

impl Default for UndistortOptions {
    fn default() -> Self {
        Self {
            max_iters: 50,
            tolerance: 1e-14,
        }
    }
}

/// Rational radial, tangential and thin-prism distortion.
///
/// Coefficient naming and ordering follow OpenCV; the sensor tilt terms live
/// in [`TiltSensor`](crate::TiltSensor).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LensDistortion<S: RealField + Copy> {
    pub k1: S,
    pub k2: S,
    pub p1: S,
    pub p2: S,
    pub k3: S,
    pub k4: S,
    pub k5: S,
    pub k6: S,
    pub s1: S,
    pub s2: S,
    pub s3: S,
    pub s4: S,
    #[serde(default)]
    pub undistort: UndistortOptions,
}

impl<S: RealField + Copy> LensDistortion<S> {
    /// Build from the first twelve canonical coefficients
    /// `k1, k2, p1, p2, k3, k4, k5, k6, s1, s2, s3, s4`.
    pub fn from_coeffs(c: &[S; 12], undistort: UndistortOptions) -> Self {
        Self {
            k1: c[0],
            k2: c[1],
            p1: c[2],
            p2: c[3],
            k3: c[4],
            k4: c[5],
            k5: c[6],
            k6: c[7],
            s1: c[8],
            s2: c[9],
            s3: c[10],
            s4: c[11],
            undistort,
        }
    }

    /// Radial gain `(1 + k1 r² + k2 r⁴ + k3 r⁶) / (1 + k4 r² + k5 r⁴ + k6 r⁶)`.
    fn radial(&self, r2: S) -> S {
        let one = S::one();
        let num = one + ((self.k3 * r2 + self.k2) * r2 + self.k1) * r2;
        let den = one + ((self.k6 * r2 + self.k5) * r2 + self.k4) * r2;
        num / den
    }

    /// Tangential plus thin-prism offset.
    fn offset(&self, x: S, y: S, r2: S) -> (S, S) {
        let two = S::one() + S::one();
        let r4 = r2 * r2;
        let dx = two * self.p1 * x * y + self.p2 * (r2 + two * x * x) + self.s1 * r2 + self.s2 * r4;
        let dy = self.p1 * (r2 + two * y * y) + two * self.p2 * x * y + self.s3 * r2 + self.s4 * r4;
        (dx, dy)
    }
}

impl<S: RealField + Copy> DistortionModel<S> for LensDistortion<S> {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S> {
        let (x, y) = (n_undist.x, n_undist.y);
        let r2 = x * x + y * y;
        let g = self.radial(r2);
        let (dx, dy) = self.offset(x, y, r2);
        Vector2::new(x * g + dx, y * g + dy)
    }

    /// Fixed-point inverse `x ← (x_d - δ(x)) / g(x)`.
    ///
    /// Returns the input unchanged when the radial gain turns non-positive,
    /// which only happens far outside the valid field of view.
    fn undistort(&self, n_dist: &Vector2<S>) -> Vector2<S> {
        let tol: S = nalgebra::convert(self.undistort.tolerance);
        let mut n = *n_dist;
        for _ in 0..self.undistort.max_iters {
            let r2 = n.x * n.x + n.y * n.y;
            let g = self.radial(r2);
            if g <= S::zero() || !g.is_finite() {
                return *n_dist;
            }
            let (dx, dy) = self.offset(n.x, n.y, r2);
            n = Vector2::new((n_dist.x - dx) / g, (n_dist.y - dy) / g);

            let err = self.distort(&n) - n_dist;
            if err.x.abs() < tol && err.y.abs() < tol {
                break;
            }
        }
        n
    }
}
