use crate::params::{ParamLayout, PARAM_COUNT};
use crate::residual::{jacobian, residuals, Observations};
use crate::TermCriteria;
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, TerminationReason};
use monocal_core::Real;
use nalgebra::{storage::Owned, DMatrix, DVector, Dyn};

/// Reprojection problem over the free parameters.
pub(crate) struct ReprojectionProblem<'a> {
    pub layout: &'a ParamLayout,
    pub base: [Real; PARAM_COUNT],
    pub obs: Observations<'a>,
}

impl ReprojectionProblem<'_> {
    pub fn full(&self, free: &DVector<Real>) -> [Real; PARAM_COUNT] {
        self.layout.expand(free.as_slice(), &self.base)
    }

    pub fn residuals(&self, free: &DVector<Real>) -> Option<DVector<Real>> {
        residuals(&self.full(free), &self.obs)
    }

    pub fn jacobian(&self, free: &DVector<Real>) -> Option<DMatrix<Real>> {
        jacobian(self.layout, free, &self.base, &self.obs)
    }
}

struct LmWrapper<'a, 'p> {
    problem: &'p ReprojectionProblem<'a>,
    params: DVector<Real>,
}

impl LeastSquaresProblem<Real, Dyn, Dyn> for LmWrapper<'_, '_> {
    type ResidualStorage = Owned<Real, Dyn>;
    type JacobianStorage = Owned<Real, Dyn, Dyn>;
    type ParameterStorage = Owned<Real, Dyn>;

    fn set_params(&mut self, x: &DVector<Real>) {
        self.params.clone_from(x);
    }

    fn params(&self) -> DVector<Real> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<Real>> {
        self.problem.residuals(&self.params)
    }

    fn jacobian(&self) -> Option<DMatrix<Real>> {
        self.problem.jacobian(&self.params)
    }
}

/// How the minimiser stopped.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LmOutcome {
    Converged,
    /// Evaluation budget exhausted before the tolerances were met.
    IterationLimit,
    Failed(String),
}

#[derive(Debug, Clone)]
pub(crate) struct LmReport {
    pub outcome: LmOutcome,
    pub evaluations: usize,
    pub final_cost: Real,
}

fn classify(reason: &TerminationReason) -> LmOutcome {
    match reason {
        TerminationReason::ResidualsZero
        | TerminationReason::Orthogonal
        | TerminationReason::Converged { .. }
        // Tolerances below machine precision: the state cannot be improved.
        | TerminationReason::NoImprovementPossible(_) => LmOutcome::Converged,
        TerminationReason::LostPatience => LmOutcome::IterationLimit,
        other => LmOutcome::Failed(format!("{other:?}")),
    }
}

/// Minimise from `x0`; returns the final free vector and a report.
pub(crate) fn minimize(
    problem: &ReprojectionProblem<'_>,
    x0: DVector<Real>,
    criteria: &TermCriteria,
) -> (DVector<Real>, LmReport) {
    let lm = LevenbergMarquardt::new()
        .with_ftol(criteria.epsilon)
        .with_xtol(criteria.epsilon)
        .with_gtol(Real::EPSILON)
        .with_patience(criteria.max_iters.max(1));

    let wrapper = LmWrapper {
        problem,
        params: x0,
    };
    let (wrapper, report) = lm.minimize(wrapper);

    (
        wrapper.params,
        LmReport {
            outcome: classify(&report.termination),
            evaluations: report.number_of_evaluations,
            final_cost: report.objective_function,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{pack, FX};
    use monocal_core::{CalibrationFlags, ExtrinsicPose, ImageSize, IntrinsicModel, Pt2, Pt3, Vec3};

    #[test]
    fn recovers_focal_length_from_exact_data() {
        let truth = {
            let mut m = IntrinsicModel::default_guess(ImageSize::new(640, 480));
            m.k.fx = 500.0;
            m.k.fy = 500.0;
            m
        };
        let pose = ExtrinsicPose::new(Vec3::new(0.05, -0.1, 0.02), Vec3::new(-0.2, 0.1, 4.0));
        let world: Vec<Pt3> = (0..8)
            .map(|i| Pt3::new((i % 4) as Real * 0.3, (i / 4) as Real * 0.4, (i % 3) as Real * 0.2))
            .collect();
        let pixels: Vec<Pt2> =
            monocal_core::synthetic::scene::project_world_points(&truth, &pose, &world).unwrap();

        let mut start = truth;
        start.k.fx = 560.0;
        start.k.fy = 560.0;
        let base = pack(&start, &pose);
        let flags = CalibrationFlags::FIX_ASPECT_RATIO
            | CalibrationFlags::FIX_PRINCIPAL_POINT
            | CalibrationFlags::ZERO_TANGENT_DIST
            | CalibrationFlags::FIX_K1
            | CalibrationFlags::FIX_K2
            | CalibrationFlags::FIX_K3;
        let layout = ParamLayout::from_flags(flags, &base);
        let problem = ReprojectionProblem {
            layout: &layout,
            base,
            obs: Observations { world: &world, pixels: &pixels },
        };

        let (x, report) = minimize(&problem, layout.free_values(&base), &TermCriteria::default());
        let full = problem.full(&x);
        assert_eq!(report.outcome, LmOutcome::Converged, "{report:?}");
        assert!((full[FX] - 500.0).abs() < 1e-6, "fx = {}", full[FX]);
        assert!(report.final_cost < 1e-12);
        assert!(report.evaluations > 0);
    }
}
