//! Projection-matrix DLT and its decomposition.
//!
//! For six or more non-coplanar control points the full 3x4 matrix
//! `P ~ K' [R | t]` is estimated linearly; the RQ split then yields a pose that
//! does not depend on how good the intrinsic guess `K'` was.

use crate::math::{mat34_from_row, normalize_points_2d, normalize_points_3d};
use crate::PoseInitError;
use monocal_core::{Mat3, Pt2, Pt3, Real, Vec3};
use nalgebra::{DMatrix, Matrix3x4};

pub type Mat34 = Matrix3x4<Real>;

/// `P = K [R | t]` with `K` upper-triangular and positive on the diagonal.
#[derive(Debug, Clone)]
pub struct CameraMatrixDecomposition {
    pub k: Mat3,
    pub r: Mat3,
    pub t: Vec3,
}

/// Normalised DLT estimate of `P` (up to scale) from `x ~ P X`.
pub fn dlt_camera_matrix(world: &[Pt3], image: &[Pt2]) -> Result<Mat34, PoseInitError> {
    let n = world.len();
    if n != image.len() {
        return Err(PoseInitError::CountMismatch {
            world: n,
            image: image.len(),
        });
    }
    if n < 6 {
        return Err(PoseInitError::NotEnoughPoints { needed: 6, got: n });
    }

    let (world_n, t_w) =
        normalize_points_3d(world).ok_or(PoseInitError::Degenerate("world points coincide"))?;
    let (image_n, t_i) =
        normalize_points_2d(image).ok_or(PoseInitError::Degenerate("image points coincide"))?;

    let mut a = DMatrix::<Real>::zeros(2 * n, 12);
    for (i, (pw, pi)) in world_n.iter().zip(image_n.iter()).enumerate() {
        let xh = [pw.x, pw.y, pw.z, 1.0];
        for (c, v) in xh.iter().enumerate() {
            a[(2 * i, c)] = *v;
            a[(2 * i, 8 + c)] = -pi.x * v;
            a[(2 * i + 1, 4 + c)] = *v;
            a[(2 * i + 1, 8 + c)] = -pi.y * v;
        }
    }

    // With exactly six points A is 12x12 and its SVD is square; take the
    // null-space from AᵀA to cover both cases uniformly.
    let ata = a.transpose() * &a;
    let svd = ata.svd(false, true);
    let v_t = svd.v_t.ok_or(PoseInitError::SvdFailed)?;
    let (min_row, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(y.1))
        .ok_or(PoseInitError::SvdFailed)?;
    let p_norm = mat34_from_row(&v_t, min_row);

    let t_i_inv = t_i.try_inverse().ok_or(PoseInitError::SvdFailed)?;
    Ok(t_i_inv * p_norm * t_w)
}

/// RQ decomposition `M = K R` with positive diagonal on `K`.
pub fn rq_decompose(m: &Mat3) -> (Mat3, Mat3) {
    let j = Mat3::new(0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0);
    let qr = (j * m.transpose() * j).qr();
    let mut k = j * qr.r().transpose() * j;
    let mut r = j * qr.q().transpose() * j;

    let mut d = Mat3::identity();
    for i in 0..3 {
        if k[(i, i)] < 0.0 {
            d[(i, i)] = -1.0;
        }
    }
    k *= d;
    r = d * r;
    (k, r)
}

/// Split `P` into `K`, `R`, `t`; `R` is a proper rotation.
pub fn decompose_camera_matrix(p: &Mat34) -> Result<CameraMatrixDecomposition, PoseInitError> {
    let m = p.fixed_view::<3, 3>(0, 0).into_owned();
    let (k, mut r) = rq_decompose(&m);
    let k_inv = k
        .try_inverse()
        .ok_or(PoseInitError::Degenerate("projection matrix is singular"))?;
    let mut t: Vec3 = k_inv * p.column(3);
    if r.determinant() < 0.0 {
        r = -r;
        t = -t;
    }
    // K is only defined up to scale; report it with K[2,2] = 1.
    let k = k / k[(2, 2)];
    Ok(CameraMatrixDecomposition { k, r, t })
}
