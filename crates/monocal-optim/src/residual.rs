//! Reprojection residuals, generic over the scalar so dual numbers can flow
//! through the same code as `f64`.

use crate::params::{ParamLayout, PARAM_COUNT, RVEC, TVEC};
use monocal_core::{
    perspective_clamped, rodrigues_generic, standard_camera, Pt2, Pt3, Real, UndistortOptions,
    INTRINSIC_PARAMS,
};
use nalgebra::{DMatrix, DVector, RealField, Vector3};
use num_dual::Dual64;

/// Smallest camera-frame depth used in the perspective division.
const MIN_DEPTH: Real = 1e-9;

/// Observations of one solve: world points and their measured pixels.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Observations<'a> {
    pub world: &'a [Pt3],
    pub pixels: &'a [Pt2],
}

impl Observations<'_> {
    pub fn len(&self) -> usize {
        self.world.len()
    }

    pub fn num_residuals(&self) -> usize {
        2 * self.world.len()
    }
}

/// Projected minus measured pixel for every observation, packed `[u0, v0, u1, v1, ...]`.
pub(crate) fn residuals_generic<T: RealField + Copy>(
    p: &[T; PARAM_COUNT],
    obs: &Observations<'_>,
) -> Vec<T> {
    let mut intr = [T::zero(); INTRINSIC_PARAMS];
    intr.copy_from_slice(&p[..INTRINSIC_PARAMS]);
    let cam = standard_camera(&intr, UndistortOptions::default());
    let rot = rodrigues_generic(&Vector3::new(p[RVEC], p[RVEC + 1], p[RVEC + 2]));
    let t = Vector3::new(p[TVEC], p[TVEC + 1], p[TVEC + 2]);
    let min_depth: T = nalgebra::convert(MIN_DEPTH);

    let mut out = Vec::with_capacity(obs.num_residuals());
    for (pw, px) in obs.world.iter().zip(obs.pixels) {
        let pw_t = Vector3::new(
            nalgebra::convert::<Real, T>(pw.x),
            nalgebra::convert(pw.y),
            nalgebra::convert(pw.z),
        );
        let proj = cam.project_normalized(&perspective_clamped(&(rot * pw_t + t), min_depth));
        out.push(proj.x - nalgebra::convert::<Real, T>(px.x));
        out.push(proj.y - nalgebra::convert::<Real, T>(px.y));
    }
    out
}

/// `f64` residuals of a full parameter vector; `None` if any is non-finite.
pub(crate) fn residuals(p: &[Real; PARAM_COUNT], obs: &Observations<'_>) -> Option<DVector<Real>> {
    let r = residuals_generic(p, obs);
    r.iter()
        .all(|v| v.is_finite())
        .then(|| DVector::from_vec(r))
}

/// Jacobian of the residuals with respect to the free parameters, one
/// forward-mode pass per free column.
pub(crate) fn jacobian(
    layout: &ParamLayout,
    free: &DVector<Real>,
    base: &[Real; PARAM_COUNT],
    obs: &Observations<'_>,
) -> Option<DMatrix<Real>> {
    let n = layout.num_free();
    let mut j = DMatrix::zeros(obs.num_residuals(), n);
    let mut seeded: Vec<Dual64> = free.iter().map(|&v| Dual64::new(v, 0.0)).collect();
    for col in 0..n {
        seeded[col] = Dual64::new(free[col], 1.0);
        let full = layout.expand(&seeded, base);
        for (row, r) in residuals_generic(&full, obs).iter().enumerate() {
            if !r.eps.is_finite() {
                return None;
            }
            j[(row, col)] = r.eps;
        }
        seeded[col] = Dual64::new(free[col], 0.0);
    }
    Some(j)
}

/// Euclidean pixel error of each observation.
pub(crate) fn per_point_errors(r: &DVector<Real>) -> Vec<Real> {
    r.as_slice()
        .chunks_exact(2)
        .map(|c| (c[0] * c[0] + c[1] * c[1]).sqrt())
        .collect()
}

/// `sqrt(Σ‖rᵢ‖² / N)` over points; zero for an empty set.
pub(crate) fn rms(r: &DVector<Real>) -> Real {
    let n = r.len() / 2;
    if n == 0 {
        return 0.0;
    }
    (r.norm_squared() / n as Real).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{pack, FX, FY, K1};
    use monocal_core::{CalibrationFlags, DistortionVector, ExtrinsicPose, IntrinsicModel, ImageSize, Vec3};

    fn scene() -> (IntrinsicModel, ExtrinsicPose, Vec<Pt3>) {
        let mut intr = IntrinsicModel::default_guess(ImageSize::new(1280, 720));
        intr.k.fx = 800.0;
        intr.k.fy = 790.0;
        intr.distortion = DistortionVector::new(&[-0.1, 0.02, 0.001, -0.002, 0.0]).unwrap();
        let pose = ExtrinsicPose::new(Vec3::new(0.1, -0.2, 0.05), Vec3::new(-50.0, -40.0, 420.0));
        let world = vec![
            Pt3::new(0.0, 0.0, 0.0),
            Pt3::new(100.0, 0.0, 0.0),
            Pt3::new(100.0, 100.0, 0.0),
            Pt3::new(50.0, 50.0, 50.0),
        ];
        (intr, pose, world)
    }

    #[test]
    fn residuals_vanish_at_truth() {
        let (intr, pose, world) = scene();
        let pixels: Vec<Pt2> = monocal_core::synthetic::scene::project_world_points(&intr, &pose, &world).unwrap();
        let obs = Observations { world: &world, pixels: &pixels };
        let r = residuals(&pack(&intr, &pose), &obs).unwrap();
        assert!(r.amax() < 1e-9);
        assert!((rms(&r) - r.norm() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn dual_jacobian_matches_finite_differences() {
        let (intr, pose, world) = scene();
        let pixels = vec![Pt2::new(600.0, 300.0); world.len()];
        let obs = Observations { world: &world, pixels: &pixels };
        let base = pack(&intr, &pose);
        let layout = ParamLayout::from_flags(CalibrationFlags::FIX_ASPECT_RATIO, &base);
        let x = layout.free_values(&base);
        let j = jacobian(&layout, &x, &base, &obs).unwrap();

        for col in 0..layout.num_free() {
            let idx = layout.free_indices()[col];
            let h = if idx == K1 { 1e-7 } else { 1e-6 * base[idx].abs().max(1.0) };
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[col] += h;
            xm[col] -= h;
            let rp = residuals(&layout.expand(xp.as_slice(), &base), &obs).unwrap();
            let rm = residuals(&layout.expand(xm.as_slice(), &base), &obs).unwrap();
            let fd = (rp - rm) / (2.0 * h);
            let diff = (fd - j.column(col)).amax();
            assert!(diff < 1e-4 * j.column(col).amax().max(1.0), "column {col} (param {idx}) off by {diff}");
        }
        // fx is tied, so the fy column carries both focal derivatives.
        assert_eq!(layout.free_indices()[0], FY);
        assert!(layout.free_indices().iter().all(|&i| i != FX));
    }
}
