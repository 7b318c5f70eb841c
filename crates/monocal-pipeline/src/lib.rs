//! Two-pass single-photo calibration.
//!
//! 1. [`BaseCalibrator`] solves from the valid control points.
//! 2. [`ColinearConstraintExpander`] turns each colinear group into synthetic
//!    3D correspondences using the bootstrap model.
//! 3. [`RefinementCalibrator`] solves again on the expanded set, falling back
//!    to the bootstrap result if that fails.
//!
//! [`calibrate_with_colinear_groups`] runs all three from a [`CalibrationInput`].

mod base;
mod config;
mod error;
mod expand;
mod input;
mod refine;
mod report;
mod run;

pub use base::{BaseCalibrator, BaseOutcome};
pub use config::{ColinearCalibrationConfig, ColinearDepth};
pub use error::{CalibrationError, CalibrationWarning, Stage};
pub use expand::{
    group_straightness, validate_colinear_groups, ColinearConstraintExpander,
    ColinearGroupReport, ExpandedCorrespondences,
};
pub use input::CalibrationInput;
pub use refine::{RefinementCalibrator, RefinementOutcome};
pub use report::CalibrationReport;
pub use run::{calibrate_with_colinear_groups, calibrate_with_solver};
