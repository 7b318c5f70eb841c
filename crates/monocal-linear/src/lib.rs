//! Closed-form building blocks for single-photo calibration.
//!
//! Everything here is linear or polynomial: DLT camera matrices, plane
//! homographies, P3P, and principal-axis line fitting. The results seed the
//! non-linear refinement in `monocal-optim` and the colinear expansion in
//! `monocal-pipeline`.

mod camera_matrix;
mod error;
mod homography;
mod line_fit;
pub mod math;
mod p3p;
mod planar_pose;
mod pose_init;

pub use camera_matrix::*;
pub use error::*;
pub use homography::*;
pub use line_fit::*;
pub use p3p::*;
pub use planar_pose::*;
pub use pose_init::*;
