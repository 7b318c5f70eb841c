//! Numerical helpers shared by the linear solvers.
//!
//! - Hartley normalisation of 2D and 3D point sets (conditioning for DLT).
//! - Real roots of low-degree polynomials (used by P3P).

use monocal_core::{Mat3, Mat4, Pt2, Pt3, Real};
use nalgebra::{DMatrix, Matrix3x4, Schur};

const ROOT_DEDUP: Real = 1e-8;

/// Centre 2D points on the origin with mean distance `√2`.
///
/// Returns the normalised points and `T` with `p_norm = T · p_h`, or `None`
/// for an empty or single-location set.
pub fn normalize_points_2d(points: &[Pt2]) -> Option<(Vec<Pt2>, Mat3)> {
    let c = monocal_core::centroid_2d(points)?;
    let mean_dist = points.iter().map(|p| (p - c).norm()).sum::<Real>() / points.len() as Real;
    if mean_dist <= Real::EPSILON {
        return None;
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = Mat3::new(s, 0.0, -s * c.x, 0.0, s, -s * c.y, 0.0, 0.0, 1.0);
    let norm = points.iter().map(|p| Pt2::from((p - c) * s)).collect();
    Some((norm, t))
}

/// 3D analogue of [`normalize_points_2d`] with mean distance `√3`.
pub fn normalize_points_3d(points: &[Pt3]) -> Option<(Vec<Pt3>, Mat4)> {
    let c = monocal_core::centroid_3d(points)?;
    let mean_dist = points.iter().map(|p| (p - c).norm()).sum::<Real>() / points.len() as Real;
    if mean_dist <= Real::EPSILON {
        return None;
    }
    let s = (3.0_f64).sqrt() / mean_dist;
    let mut t = Mat4::identity() * s;
    t[(3, 3)] = 1.0;
    t[(0, 3)] = -s * c.x;
    t[(1, 3)] = -s * c.y;
    t[(2, 3)] = -s * c.z;
    let norm = points.iter().map(|p| Pt3::from((p - c) * s)).collect();
    Some((norm, t))
}

/// Real roots of `ax² + bx + c`, ascending.
pub fn solve_quadratic_real(a: Real, b: Real, c: Real) -> Vec<Real> {
    let eps = 1e-12;
    if a.abs() < eps {
        return if b.abs() < eps { Vec::new() } else { vec![-c / b] };
    }
    let disc = b * b - 4.0 * a * c;
    if disc < -eps {
        return Vec::new();
    }
    let sq = disc.max(0.0).sqrt();
    let mut roots = vec![(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)];
    sort_dedup(&mut roots);
    roots
}

/// Real roots of `ax³ + bx² + cx + d`, ascending (Cardano / trigonometric form).
pub fn solve_cubic_real(a: Real, b: Real, c: Real, d: Real) -> Vec<Real> {
    let eps = 1e-12;
    if a.abs() < eps {
        return solve_quadratic_real(b, c, d);
    }
    let (b, c, d) = (b / a, c / a, d / a);
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = b / 3.0;
    let disc = (q / 2.0).powi(2) + (p / 3.0).powi(3);

    let mut roots = if disc > eps {
        let sq = disc.sqrt();
        vec![(-q / 2.0 + sq).cbrt() + (-q / 2.0 - sq).cbrt() - shift]
    } else if disc.abs() <= eps {
        let u = (-q / 2.0).cbrt();
        vec![2.0 * u - shift, -u - shift]
    } else {
        let r = (-p / 3.0).sqrt();
        let phi = (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0).acos();
        (0..3)
            .map(|k| {
                2.0 * r * ((phi + 2.0 * std::f64::consts::PI * k as Real) / 3.0).cos() - shift
            })
            .collect()
    };
    sort_dedup(&mut roots);
    roots
}

/// Real roots of `ax⁴ + bx³ + cx² + dx + e`, ascending, from the eigenvalues
/// of the companion matrix.
pub fn solve_quartic_real(a: Real, b: Real, c: Real, d: Real, e: Real) -> Vec<Real> {
    if a.abs() < 1e-12 {
        return solve_cubic_real(b, c, d, e);
    }
    let mut comp = DMatrix::<Real>::zeros(4, 4);
    comp[(0, 0)] = -b / a;
    comp[(0, 1)] = -c / a;
    comp[(0, 2)] = -d / a;
    comp[(0, 3)] = -e / a;
    comp[(1, 0)] = 1.0;
    comp[(2, 1)] = 1.0;
    comp[(3, 2)] = 1.0;

    let mut roots: Vec<Real> = Schur::new(comp)
        .complex_eigenvalues()
        .iter()
        .filter(|z| z.im.abs() < ROOT_DEDUP)
        .map(|z| z.re)
        .collect();
    sort_dedup(&mut roots);
    roots
}

fn sort_dedup(roots: &mut Vec<Real>) {
    roots.sort_by(|a, b| a.total_cmp(b));
    roots.dedup_by(|a, b| (*a - *b).abs() < ROOT_DEDUP);
}

/// Reshape row `row` of an SVD `Vᵀ` (12 columns) into a 3x4 matrix.
pub(crate) fn mat34_from_row(v_t: &DMatrix<Real>, row: usize) -> Matrix3x4<Real> {
    Matrix3x4::from_fn(|r, c| v_t[(row, 4 * r + c)])
}
