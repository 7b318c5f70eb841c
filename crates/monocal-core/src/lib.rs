//! Core types for single-photo camera calibration.
//!
//! This crate contains:
//! - linear algebra aliases (`Real`, `Vec3`, `Mat3`, ...),
//! - Rodrigues / 4x4 pose utilities with shape-checked ingestion,
//! - the OpenCV-compatible camera model (pinhole, 14-term distortion, tilt),
//! - the calibration data model and its persisted record form,
//! - compaction of sparse control-point input with index mapping.
//!
//! Camera pipeline:
//! `pixel = K ∘ tilt ∘ distortion ∘ projection(R·X + t)`

mod compact;
mod error;
mod flags;
/// Rotation and pose utilities.
pub mod geometry;
/// Type aliases and small helpers.
pub mod math;
/// Camera model building blocks.
pub mod models;
/// Ground-truth scenes for tests.
pub mod synthetic;
/// Calibration data model.
pub mod types;

pub use compact::*;
pub use error::*;
pub use flags::*;
pub use geometry::*;
pub use math::*;
pub use models::*;
pub use types::*;
