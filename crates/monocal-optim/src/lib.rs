//! Non-linear refinement of intrinsics, distortion and pose from one photo.
//!
//! The [`CameraCalibrationSolver`] trait is the seam the pipeline calls
//! through; [`LmCalibrationSolver`] is the default implementation built on
//! `levenberg-marquardt` with a forward-mode (`num-dual`) Jacobian.

mod backend_lm;
mod covariance;
mod criteria;
mod error;
pub mod params;
mod residual;
mod solver;

pub use criteria::TermCriteria;
pub use error::SolverError;
pub use params::{ParamLayout, Slot, PARAM_COUNT};
pub use solver::{CameraCalibrationSolver, LmCalibrationSolver, SolveRequest};
