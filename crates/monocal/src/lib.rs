//! High-level entry crate for `monocal`.
//!
//! Calibrates one camera from a single photograph. Surveyed control points
//! give a first solve, then image points known to lie on straight edges are
//! turned into extra 3D correspondences and the camera is solved again.
//!
//! ```no_run
//! use monocal::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let input: CalibrationInput = /* load from JSON */
//! # unimplemented!();
//! let config = ColinearCalibrationConfig {
//!     flags: CalibrationFlags::FIX_PRINCIPAL_POINT | CalibrationFlags::ZERO_TANGENT_DIST,
//!     ..Default::default()
//! };
//! let report = calibrate_with_colinear_groups(&input, &config)?;
//! println!("rms {:.3} px, fx {:.1}", report.result.rms, report.result.intrinsics.k.fx);
//! let record = report.to_record();
//! # let _ = record;
//! # Ok(())
//! # }
//! ```
//!
//! Custom solvers plug in through [`optim::CameraCalibrationSolver`] and
//! [`pipeline::calibrate_with_solver`].

/// Camera model, pose utilities, flags and the persisted record form.
pub mod core {
    pub use monocal_core::*;
}

/// Closed-form initialisation: homography, DLT, P3P and line fitting.
pub mod linear {
    pub use monocal_linear::*;
}

/// Parameter layout, reprojection residuals and the Levenberg-Marquardt solver.
pub mod optim {
    pub use monocal_optim::*;
}

/// Two-pass calibration with colinear refinement.
pub mod pipeline {
    pub use monocal_pipeline::*;
}

/// Convenient re-exports for common use cases.
///
/// Import with `use monocal::prelude::*;`.
pub mod prelude {
    pub use crate::core::{
        CalibrationFlags, CalibrationRecord, CalibrationResult, Coord, DistortionVector,
        ExtrinsicPose, ImageSize, IntrinsicModel, Pt2, Pt3, Real, UndistortOptions, Vec3,
    };

    pub use crate::optim::{CameraCalibrationSolver, LmCalibrationSolver, TermCriteria};

    pub use crate::pipeline::{
        calibrate_with_colinear_groups, calibrate_with_solver, CalibrationError,
        CalibrationInput, CalibrationReport, CalibrationWarning, ColinearCalibrationConfig,
        ColinearDepth,
    };
}
