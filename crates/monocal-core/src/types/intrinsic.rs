use crate::{
    standard_camera, GeometryError, Mat3, PinholeIntrinsics, Pt2, Real, StandardCamera,
    UndistortOptions, INTRINSIC_PARAMS,
};
use serde::{Deserialize, Serialize};

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Distortion coefficients in canonical order
/// `k1, k2, p1, p2, k3, k4, k5, k6, s1, s2, s3, s4, taux, tauy`.
///
/// Keeps its reported length (4, 5, 8, 12 or 14); unreported slots are zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Real>", into = "Vec<Real>")]
pub struct DistortionVector {
    coeffs: [Real; DistortionVector::MAX_LEN],
    len: usize,
}

impl DistortionVector {
    pub const MAX_LEN: usize = 14;
    const ALLOWED_LEN: [usize; 5] = [4, 5, 8, 12, 14];

    pub fn new(values: &[Real]) -> Result<Self, GeometryError> {
        if !Self::ALLOWED_LEN.contains(&values.len()) {
            return Err(GeometryError::DistortionLength(values.len()));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("distortion vector"));
        }
        let mut coeffs = [0.0; Self::MAX_LEN];
        coeffs[..values.len()].copy_from_slice(values);
        Ok(Self {
            coeffs,
            len: values.len(),
        })
    }

    /// All-zero vector of the given reported length (clamped to a valid one).
    pub fn zeros(len: usize) -> Self {
        Self {
            coeffs: [0.0; Self::MAX_LEN],
            len: Self::valid_len(len),
        }
    }

    /// Build from all fourteen slots, reporting `len` of them.
    pub fn from_full(coeffs: [Real; Self::MAX_LEN], len: usize) -> Self {
        Self {
            coeffs,
            len: Self::valid_len(len),
        }
    }

    fn valid_len(len: usize) -> usize {
        Self::ALLOWED_LEN
            .iter()
            .copied()
            .find(|&l| l >= len)
            .unwrap_or(Self::MAX_LEN)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The reported coefficients.
    pub fn as_slice(&self) -> &[Real] {
        &self.coeffs[..self.len]
    }

    /// All fourteen slots.
    pub fn full(&self) -> &[Real; Self::MAX_LEN] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|c| *c == 0.0)
    }
}

impl TryFrom<Vec<Real>> for DistortionVector {
    type Error = GeometryError;

    fn try_from(v: Vec<Real>) -> Result<Self, Self::Error> {
        Self::new(&v)
    }
}

impl From<DistortionVector> for Vec<Real> {
    fn from(d: DistortionVector) -> Self {
        d.as_slice().to_vec()
    }
}

/// Camera matrix plus lens distortion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicModel {
    pub k: PinholeIntrinsics<Real>,
    pub distortion: DistortionVector,
}

impl IntrinsicModel {
    /// Starting point used when the caller has no estimate: focal length equal
    /// to the image width, principal point at the image centre, no distortion.
    pub fn default_guess(size: ImageSize) -> Self {
        let w = Real::from(size.width);
        let h = Real::from(size.height);
        Self {
            k: PinholeIntrinsics {
                fx: w,
                fy: w,
                cx: (w - 1.0) / 2.0,
                cy: (h - 1.0) / 2.0,
            },
            distortion: DistortionVector::zeros(5),
        }
    }

    /// Read `fx`, `fy`, `cx`, `cy` from a 3x3 camera matrix; skew is ignored.
    pub fn from_camera_matrix(cmat: &Mat3, distortion: DistortionVector) -> Self {
        Self {
            k: PinholeIntrinsics {
                fx: cmat[(0, 0)],
                fy: cmat[(1, 1)],
                cx: cmat[(0, 2)],
                cy: cmat[(1, 2)],
            },
            distortion,
        }
    }

    pub fn camera_matrix(&self) -> Mat3 {
        self.k.k_matrix()
    }

    /// `[fx, fy, cx, cy, k1, ..., tauy]`.
    pub fn packed(&self) -> [Real; INTRINSIC_PARAMS] {
        let mut p = [0.0; INTRINSIC_PARAMS];
        p[..4].copy_from_slice(&[self.k.fx, self.k.fy, self.k.cx, self.k.cy]);
        p[4..].copy_from_slice(self.distortion.full());
        p
    }

    /// Inverse of [`Self::packed`]; `dist_len` sets the reported distortion length.
    pub fn from_packed(p: &[Real; INTRINSIC_PARAMS], dist_len: usize) -> Self {
        let mut coeffs = [0.0; DistortionVector::MAX_LEN];
        coeffs.copy_from_slice(&p[4..]);
        Self {
            k: PinholeIntrinsics {
                fx: p[0],
                fy: p[1],
                cx: p[2],
                cy: p[3],
            },
            distortion: DistortionVector::from_full(coeffs, dist_len),
        }
    }

    pub fn camera(&self, undistort: UndistortOptions) -> StandardCamera<Real> {
        standard_camera(&self.packed(), undistort)
    }

    /// Undistorted normalized coordinates of pixel observations.
    pub fn undistort_points_normalized(&self, pixels: &[Pt2], opts: UndistortOptions) -> Vec<Pt2> {
        let cam = self.camera(opts);
        pixels
            .iter()
            .map(|px| Pt2::from(cam.pixel_to_normalized(&px.coords)))
            .collect()
    }

    /// Undistorted pixels: normalized coordinates mapped back through `K` only.
    pub fn undistort_points_pixel(&self, pixels: &[Pt2], opts: UndistortOptions) -> Vec<Pt2> {
        let k = self.camera_matrix();
        self.undistort_points_normalized(pixels, opts)
            .into_iter()
            .map(|n| Pt2::new(k[(0, 0)] * n.x + k[(0, 2)], k[(1, 1)] * n.y + k[(1, 2)]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_guess_centres_principal_point() {
        let m = IntrinsicModel::default_guess(ImageSize::new(1280, 720));
        assert_eq!(m.k.fx, 1280.0);
        assert_eq!(m.k.fy, 1280.0);
        assert_eq!(m.k.cx, 639.5);
        assert_eq!(m.k.cy, 359.5);
        assert!(m.distortion.is_zero());
        assert_eq!(m.distortion.len(), 5);
    }

    #[test]
    fn undistortion_inverts_projection() {
        let mut m = IntrinsicModel::default_guess(ImageSize::new(1280, 720));
        m.k.fx = 800.0;
        m.k.fy = 800.0;
        m.distortion = DistortionVector::new(&[-0.2, 0.05, 0.001, -0.0005, 0.0]).unwrap();
        let opts = UndistortOptions::default();
        let cam = m.camera(opts);
        let normalized = [Pt2::new(0.1, -0.2), Pt2::new(-0.3, 0.25), Pt2::new(0.0, 0.0)];
        let pixels: Vec<Pt2> = normalized
            .iter()
            .map(|n| Pt2::from(cam.project_normalized(&n.coords)))
            .collect();
        let back = m.undistort_points_normalized(&pixels, opts);
        for (a, b) in normalized.iter().zip(&back) {
            assert!((a - b).norm() < 1e-9, "{a} vs {b}");
        }
        let ideal = m.undistort_points_pixel(&pixels, opts);
        assert!((ideal[1].x - (800.0 * -0.3 + 639.5)).abs() < 1e-6);
    }

    #[test]
    fn distortion_lengths() {
        assert!(DistortionVector::new(&[0.1, 0.0, 0.0, 0.0]).is_ok());
        assert_eq!(
            DistortionVector::new(&[0.1, 0.0, 0.0]),
            Err(GeometryError::DistortionLength(3))
        );
        assert_eq!(DistortionVector::zeros(6).len(), 8);
        let parsed: DistortionVector = serde_json::from_str("[0.1, 0.2, 0, 0, 0.3]").unwrap();
        assert_eq!(parsed.full()[4], 0.3);
        assert!(serde_json::from_str::<DistortionVector>("[1, 2]").is_err());
    }

    #[test]
    fn packed_roundtrip() {
        let d = DistortionVector::new(&[0.1, -0.05, 1e-3, 2e-3, 0.01, 0.0, 0.0, 0.02]).unwrap();
        let m = IntrinsicModel::from_camera_matrix(
            &Mat3::new(800.0, 0.0, 640.0, 0.0, 790.0, 360.0, 0.0, 0.0, 1.0),
            d,
        );
        let back = IntrinsicModel::from_packed(&m.packed(), m.distortion.len());
        assert_eq!(back, m);
    }
}
