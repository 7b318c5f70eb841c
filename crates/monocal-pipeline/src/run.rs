use crate::refine::fallback_to_bootstrap;
use crate::{
    group_straightness, validate_colinear_groups, BaseCalibrator, CalibrationError,
    CalibrationInput, CalibrationReport, ColinearCalibrationConfig, ColinearConstraintExpander,
    RefinementCalibrator, Stage,
};
use log::{info, warn};
use monocal_core::{compact_points, CalibrationRecord};
use monocal_optim::{CameraCalibrationSolver, LmCalibrationSolver};

/// Two-pass calibration with the default Levenberg-Marquardt solver.
pub fn calibrate_with_colinear_groups(
    input: &CalibrationInput,
    config: &ColinearCalibrationConfig,
) -> Result<CalibrationReport, CalibrationError> {
    calibrate_with_solver(input, config, &LmCalibrationSolver)
}

/// Two-pass calibration through an arbitrary solver.
///
/// Input errors reject the request before any solve. A failed bootstrap is an
/// error; a failed refinement falls back to the bootstrap result with a
/// warning.
pub fn calibrate_with_solver<S: CameraCalibrationSolver + ?Sized>(
    input: &CalibrationInput,
    config: &ColinearCalibrationConfig,
    solver: &S,
) -> Result<CalibrationReport, CalibrationError> {
    let groups = validate_colinear_groups(&input.colinear_groups)?;
    let initial = input
        .initial_guess
        .as_ref()
        .map(CalibrationRecord::intrinsics)
        .transpose()
        .map_err(|source| CalibrationError::InvalidGuess {
            stage: Stage::Validation,
            source,
        })?;

    let points = compact_points(&input.object_points, &input.image_points);
    let base = BaseCalibrator::new(solver, config.term_criteria, config.undistort).calibrate(
        &points,
        input.image_size,
        initial,
        config.flags,
    )?;
    let mut warnings = base.warnings;
    let bootstrap = base.result;

    let mut colinear_groups = Vec::new();
    let mut synthetic_points = 0;
    let outcome = if groups.is_empty() {
        info!("no colinear groups; bootstrap result is final");
        None
    } else {
        let expander = ColinearConstraintExpander::new(config.depth, config.undistort);
        let outcome = match expander.expand(&points, &groups, &bootstrap) {
            Ok(expanded) => {
                synthetic_points = expanded.synthetic_count();
                colinear_groups = expanded.groups.clone();
                RefinementCalibrator::new(solver, config.term_criteria, config.undistort)
                    .refine(&expanded, &bootstrap, base.flags)
            }
            Err(err) => fallback_to_bootstrap(&bootstrap, err.to_string()),
        };
        Some(outcome)
    };

    let (result, refined) = match outcome {
        Some(outcome) => {
            warnings.extend(outcome.warning);
            (outcome.result, outcome.refined)
        }
        None => (bootstrap.clone(), false),
    };

    for report in &mut colinear_groups {
        let group = &groups[report.index - 1];
        report.straightness_after =
            match group_straightness(group, &result.intrinsics, config.undistort) {
                Ok(s) => Some(s),
                Err(err) => {
                    warn!("colinear group {}: straightness unavailable: {err}", report.index);
                    None
                }
            };
    }

    let valid = points.len();
    let per_point_errors = points
        .map
        .scatter(&result.per_point_errors[..valid.min(result.per_point_errors.len())]);

    Ok(CalibrationReport {
        result,
        bootstrap,
        refined,
        flags: base.flags,
        warnings,
        colinear_groups,
        synthetic_points,
        valid_points: valid,
        per_point_errors,
    })
}
