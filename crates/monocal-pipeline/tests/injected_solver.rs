use monocal_core::synthetic::scene::{grid_points_3d, project_world_points, segment_points};
use monocal_core::{
    coords, CalibrationFlags, CalibrationResult, Coord, ExtrinsicPose, ImageSize, IntrinsicModel,
    Pt3, Vec3,
};
use monocal_optim::{CameraCalibrationSolver, LmCalibrationSolver, SolveRequest, SolverError};
use monocal_pipeline::{
    calibrate_with_solver, CalibrationError, CalibrationInput, CalibrationWarning,
    ColinearCalibrationConfig, Stage,
};
use std::cell::RefCell;

/// What the solver does once the trigger call is reached.
#[derive(Debug, Clone, Copy)]
enum Misbehave {
    /// Return `Diverged` carrying the real solve as best effort.
    Fail,
    /// Run the real solver from a distant pose with a one-iteration budget.
    Cap,
    /// Run the real solver but report that it stopped at the iteration cap.
    Unconverged,
}

/// Delegates to the real solver and records every request; misbehaves from
/// the given call onwards.
struct RecordingSolver {
    calls: RefCell<Vec<(CalibrationFlags, usize, bool)>>,
    from_call: Option<(usize, Misbehave)>,
}

impl RecordingSolver {
    fn new(fail_from_call: Option<usize>) -> Self {
        Self::misbehaving(fail_from_call.map(|n| (n, Misbehave::Fail)))
    }

    fn misbehaving(from_call: Option<(usize, Misbehave)>) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            from_call,
        }
    }
}

impl CameraCalibrationSolver for RecordingSolver {
    fn solve(&self, request: &SolveRequest<'_>) -> Result<CalibrationResult, SolverError> {
        let call = self.calls.borrow().len();
        self.calls.borrow_mut().push((
            request.flags,
            request.object_points.len(),
            request.initial_pose.is_some(),
        ));
        match self.from_call {
            Some((n, Misbehave::Fail)) if call >= n => {
                let best_effort = LmCalibrationSolver.solve(request)?;
                Err(SolverError::Diverged {
                    reason: "injected failure".to_string(),
                    best_effort: Box::new(best_effort),
                })
            }
            Some((n, Misbehave::Cap)) if call >= n => {
                let mut capped = request.clone();
                capped.criteria.max_iters = 1;
                capped.initial_pose = Some(ExtrinsicPose::new(
                    Vec3::new(0.6, 0.4, -0.3),
                    Vec3::new(0.0, 0.0, 900.0),
                ));
                LmCalibrationSolver.solve(&capped)
            }
            Some((n, Misbehave::Unconverged)) if call >= n => {
                let mut result = LmCalibrationSolver.solve(request)?;
                result.converged = false;
                Ok(result)
            }
            _ => LmCalibrationSolver.solve(request),
        }
    }
}

fn scene_input() -> CalibrationInput {
    let size = ImageSize::new(1280, 720);
    let mut truth = IntrinsicModel::default_guess(size);
    truth.k.fx = 800.0;
    truth.k.fy = 800.0;
    let pose = ExtrinsicPose::new(Vec3::new(0.1, 0.05, 0.0), Vec3::new(-120.0, -80.0, 400.0));
    let world = grid_points_3d(4, 3, 2, 80.0, 80.0);
    let pixels = project_world_points(&truth, &pose, &world).unwrap();
    let edge = segment_points(&Pt3::new(0.0, 200.0, 0.0), &Pt3::new(240.0, 200.0, 80.0), &[0.0, 0.5, 1.0]);
    let edge_pixels = project_world_points(&truth, &pose, &edge).unwrap();
    CalibrationInput {
        image_size: size,
        object_points: world.iter().map(|p| coords([p.x, p.y, p.z])).collect(),
        image_points: pixels.iter().map(|p| coords([p.x, p.y])).collect(),
        colinear_groups: vec![edge_pixels
            .iter()
            .flat_map(|p| [Coord::from(p.x), Coord::from(p.y)])
            .collect()],
        initial_guess: None,
    }
}

fn config() -> ColinearCalibrationConfig {
    ColinearCalibrationConfig {
        // Includes a bit this crate does not know about.
        flags: CalibrationFlags::ZERO_TANGENT_DIST | CalibrationFlags::FIX_K3 | CalibrationFlags(0x0100_0000),
        ..Default::default()
    }
}

#[test]
fn flags_pass_unchanged_through_both_passes() {
    let solver = RecordingSolver::new(None);
    let report = calibrate_with_solver(&scene_input(), &config(), &solver).unwrap();
    assert!(report.refined);

    let expected = config().flags | CalibrationFlags::USE_INTRINSIC_GUESS;
    let calls = solver.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], (expected, 24, false));
    assert_eq!(calls[1], (expected, 27, true));
    assert_eq!(report.flags, expected);
}

#[test]
fn failed_refinement_keeps_bootstrap() {
    let solver = RecordingSolver::new(Some(1));
    let report = calibrate_with_solver(&scene_input(), &config(), &solver).unwrap();

    assert!(!report.refined);
    assert_eq!(report.result, report.bootstrap);
    assert!(matches!(
        report.warnings.as_slice(),
        [CalibrationWarning::RefinementFailed { reason }] if reason.contains("injected failure")
    ));
}

#[test]
fn failed_bootstrap_is_an_error_with_best_effort_state() {
    let solver = RecordingSolver::new(Some(0));
    let err = calibrate_with_solver(&scene_input(), &config(), &solver).unwrap_err();
    assert_eq!(err.stage(), Stage::Bootstrap);
    assert!(matches!(err, CalibrationError::SolverDivergence { .. }));
    assert!(err.best_effort().is_some());
    assert!(err.to_string().contains("0x01000089"), "{err}");
    assert_eq!(solver.calls.borrow().len(), 1);
}

#[test]
fn invalid_input_never_reaches_the_solver() {
    let solver = RecordingSolver::new(None);
    let mut input = scene_input();
    input.colinear_groups.push(vec![Coord::from(1.0); 3]);
    let err = calibrate_with_solver(&input, &config(), &solver).unwrap_err();
    assert!(matches!(err, CalibrationError::InputShape { index: 2, .. }));
    assert!(solver.calls.borrow().is_empty());
}

#[test]
fn refinement_stopped_at_iteration_cap_keeps_bootstrap() {
    let solver = RecordingSolver::misbehaving(Some((1, Misbehave::Cap)));
    let report = calibrate_with_solver(&scene_input(), &config(), &solver).unwrap();

    assert_eq!(solver.calls.borrow().len(), 2);
    assert!(report.bootstrap.converged);
    assert!(!report.refined);
    assert_eq!(report.result, report.bootstrap);
    assert!(matches!(
        report.warnings.as_slice(),
        [CalibrationWarning::RefinementFailed { .. }]
    ));
}

#[test]
fn unconverged_refinement_names_the_cap_and_flags() {
    let solver = RecordingSolver::misbehaving(Some((1, Misbehave::Unconverged)));
    let report = calibrate_with_solver(&scene_input(), &config(), &solver).unwrap();

    assert!(!report.refined);
    assert_eq!(report.result, report.bootstrap);
    match report.warnings.as_slice() {
        [CalibrationWarning::RefinementFailed { reason }] => {
            assert!(reason.contains("iteration cap"), "{reason}");
            assert!(reason.contains("0x01000089"), "{reason}");
        }
        other => panic!("unexpected warnings {other:?}"),
    }
}

#[test]
fn unconverged_bootstrap_is_kept_with_a_warning() {
    let solver = RecordingSolver::misbehaving(Some((0, Misbehave::Unconverged)));
    let mut input = scene_input();
    input.colinear_groups.clear();
    let report = calibrate_with_solver(&input, &config(), &solver).unwrap();

    assert!(!report.result.converged);
    assert_eq!(
        report.warnings,
        vec![CalibrationWarning::BootstrapNotConverged {
            max_iters: config().term_criteria.max_iters,
            flags: config().flags | CalibrationFlags::USE_INTRINSIC_GUESS,
        }]
    );
}
