//! Three-point absolute pose (Grunert/Kneip style) and rigid alignment.
//!
//! Used when only four or five non-coplanar control points are available:
//! every triple yields up to four candidates, and the caller keeps the one
//! with the smallest reprojection error over all points.

use crate::math::solve_quartic_real;
use crate::PoseInitError;
use monocal_core::{Iso3, Mat3, Pt2, Pt3, Real, Vec3};
use nalgebra::{Rotation3, Translation3, UnitQuaternion};

/// Product of two polynomials given by ascending coefficients, truncated to degree 4.
fn poly_mul(a: &[Real; 5], b: &[Real; 5]) -> [Real; 5] {
    let mut out = [0.0; 5];
    for (i, ai) in a.iter().enumerate() {
        for (j, bj) in b.iter().enumerate().take(5 - i) {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Candidate world → camera poses from exactly three correspondences given
/// in normalized image coordinates.
pub fn p3p(world: &[Pt3; 3], normalized: &[Pt2; 3]) -> Result<Vec<Iso3>, PoseInitError> {
    let f: Vec<Vec3> = normalized
        .iter()
        .map(|p| Vec3::new(p.x, p.y, 1.0).normalize())
        .collect();

    let a = (world[1] - world[2]).norm();
    let b = (world[0] - world[2]).norm();
    let c = (world[0] - world[1]).norm();
    if a <= Real::EPSILON || b <= Real::EPSILON || c <= Real::EPSILON {
        return Err(PoseInitError::Degenerate("repeated control point"));
    }
    let area = (world[1] - world[0]).cross(&(world[2] - world[0])).norm();
    if area <= 1e-9 * a.max(b).max(c).powi(2) {
        return Err(PoseInitError::Degenerate("three control points on one line"));
    }

    let cos_alpha = f[1].dot(&f[2]);
    let cos_beta = f[0].dot(&f[2]);
    let cos_gamma = f[0].dot(&f[1]);

    let (a2, b2, c2) = (a * a, b * b, c * c);
    let d = (b2 - a2) / c2;
    let e = b2 / c2;

    // With y = u·x and z = v·x, v = n(u) / den(u) and
    // n² − 2 cosβ · n · den + (1 − e·K(u)) · den² = 0.
    let n_poly = [1.0 - d, 2.0 * d * cos_gamma, -(1.0 + d), 0.0, 0.0];
    let den_poly = [2.0 * cos_beta, -2.0 * cos_alpha, 0.0, 0.0, 0.0];
    let e_poly = [1.0 - e, 2.0 * e * cos_gamma, -e, 0.0, 0.0];

    let nn = poly_mul(&n_poly, &n_poly);
    let nd = poly_mul(&n_poly, &den_poly);
    let edd = poly_mul(&e_poly, &poly_mul(&den_poly, &den_poly));
    let coeffs: [Real; 5] = std::array::from_fn(|i| nn[i] - 2.0 * cos_beta * nd[i] + edd[i]);

    let mut solutions = Vec::new();
    for u in solve_quartic_real(coeffs[4], coeffs[3], coeffs[2], coeffs[1], coeffs[0]) {
        let den = 2.0 * (cos_beta - u * cos_alpha);
        let k_val = 1.0 + u * u - 2.0 * u * cos_gamma;
        if den.abs() < 1e-12 || k_val <= 1e-12 {
            continue;
        }
        let v = (n_poly[0] + n_poly[1] * u + n_poly[2] * u * u) / den;
        let x = (c2 / k_val).sqrt();
        let (y, z) = (u * x, v * x);
        if y <= 0.0 || z <= 0.0 {
            continue;
        }
        let cam = [f[0] * x, f[1] * y, f[2] * z];
        if let Ok(pose) = pose_from_points(world, &cam) {
            solutions.push(pose);
        }
    }

    if solutions.is_empty() {
        return Err(PoseInitError::NoValidPose);
    }
    Ok(solutions)
}

/// Rigid transform taking `world` onto `camera` in the least-squares sense (Kabsch).
pub fn pose_from_points(world: &[Pt3], camera: &[Vec3]) -> Result<Iso3, PoseInitError> {
    if world.len() != camera.len() {
        return Err(PoseInitError::CountMismatch {
            world: world.len(),
            image: camera.len(),
        });
    }
    if world.len() < 3 {
        return Err(PoseInitError::NotEnoughPoints {
            needed: 3,
            got: world.len(),
        });
    }

    let n = world.len() as Real;
    let c_w = world.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / n;
    let c_c = camera.iter().fold(Vec3::zeros(), |acc, p| acc + p) / n;

    let h = world
        .iter()
        .zip(camera.iter())
        .fold(Mat3::zeros(), |acc, (pw, pc)| {
            acc + (pc - c_c) * (pw.coords - c_w).transpose()
        });

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(PoseInitError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(PoseInitError::SvdFailed)?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_fix = u;
        u_fix.column_mut(2).neg_mut();
        r = u_fix * v_t;
    }

    let t = c_c - r * c_w;
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
    Ok(Iso3::from_parts(Translation3::from(t), rot))
}
