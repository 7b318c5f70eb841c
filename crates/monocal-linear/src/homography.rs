use crate::math::normalize_points_2d;
use crate::PoseInitError;
use monocal_core::{Mat3, Pt2, Real};
use nalgebra::DMatrix;

/// Normalised DLT estimate of `H` with `image ~ H · plane`, scaled so `H[2,2] = 1`
/// when possible.
pub fn dlt_homography(plane: &[Pt2], image: &[Pt2]) -> Result<Mat3, PoseInitError> {
    let n = plane.len();
    if n != image.len() {
        return Err(PoseInitError::CountMismatch {
            world: n,
            image: image.len(),
        });
    }
    if n < 4 {
        return Err(PoseInitError::NotEnoughPoints { needed: 4, got: n });
    }
    let (plane_n, t_p) =
        normalize_points_2d(plane).ok_or(PoseInitError::Degenerate("plane points coincide"))?;
    let (image_n, t_i) =
        normalize_points_2d(image).ok_or(PoseInitError::Degenerate("image points coincide"))?;

    let mut a = DMatrix::<Real>::zeros(2 * n, 9);
    for (i, (pw, pi)) in plane_n.iter().zip(image_n.iter()).enumerate() {
        let (x, y, u, v) = (pw.x, pw.y, pi.x, pi.y);
        let r0 = 2 * i;
        let r1 = r0 + 1;
        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;
        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    let ata = a.transpose() * &a;
    let svd = ata.svd(false, true);
    let v_t = svd.v_t.ok_or(PoseInitError::SvdFailed)?;
    let (min_row, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(y.1))
        .ok_or(PoseInitError::SvdFailed)?;
    let h_norm = Mat3::from_fn(|r, c| v_t[(min_row, 3 * r + c)]);

    let t_i_inv = t_i.try_inverse().ok_or(PoseInitError::SvdFailed)?;
    let mut h = t_i_inv * h_norm * t_p;
    let scale = h[(2, 2)];
    if scale.abs() > Real::EPSILON {
        h /= scale;
    }
    Ok(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use monocal_core::{from_homogeneous, to_homogeneous};

    #[test]
    fn recovers_projective_map() {
        let h_gt = Mat3::new(1.2, 0.1, 30.0, -0.05, 0.9, -12.0, 1e-3, -2e-3, 1.0);
        let plane = vec![
            Pt2::new(0.0, 0.0),
            Pt2::new(100.0, 0.0),
            Pt2::new(100.0, 80.0),
            Pt2::new(0.0, 80.0),
            Pt2::new(40.0, 30.0),
        ];
        let image: Vec<Pt2> = plane
            .iter()
            .map(|p| from_homogeneous(&(h_gt * to_homogeneous(p))))
            .collect();
        let h = dlt_homography(&plane, &image).unwrap();
        assert!((h - h_gt).norm() < 1e-6, "H = {h}");
    }
}
