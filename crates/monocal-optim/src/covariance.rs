use crate::params::{ParamLayout, Slot, PARAM_COUNT};
use monocal_core::Real;
use nalgebra::{DMatrix, DVector};

/// Standard deviation of every full-vector parameter from the residuals and
/// Jacobian at the optimum: `σ² = Σr² / max(m − n, 1)`, `cov = σ² (JᵀJ)⁻¹`.
///
/// Fixed parameters report zero; tied parameters scale their source.
pub(crate) fn parameter_std_devs(
    layout: &ParamLayout,
    r: &DVector<Real>,
    j: &DMatrix<Real>,
) -> [Real; PARAM_COUNT] {
    let m = r.len();
    let n = layout.num_free();
    let dof = m.saturating_sub(n).max(1) as Real;
    let sigma2 = r.norm_squared() / dof;

    let jtj = j.transpose() * j;
    let inv = jtj
        .clone()
        .try_inverse()
        .or_else(|| jtj.pseudo_inverse(1e-12).ok());

    let free_std: Vec<Real> = match inv {
        Some(inv) => (0..n)
            .map(|k| {
                let v = sigma2 * inv[(k, k)];
                if v.is_finite() && v > 0.0 {
                    v.sqrt()
                } else {
                    0.0
                }
            })
            .collect(),
        None => vec![0.0; n],
    };

    let mut out = [0.0; PARAM_COUNT];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = match layout.slot(i) {
            Slot::Free(col) => free_std[col],
            Slot::Fixed => 0.0,
            Slot::Tied { source, ratio } => match layout.slot(source) {
                Slot::Free(col) => ratio.abs() * free_std[col],
                _ => 0.0,
            },
        };
    }
    out
}
