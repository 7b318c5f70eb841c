//! Synthetic scenes with known ground truth, for tests and demos.

pub mod noise;
pub mod scene;

pub use noise::PixelNoise;
