use monocal_core::{CalibrationRecord, Coord, ImageSize};
use serde::{Deserialize, Serialize};

/// Everything a caller hands to one calibration, in its wire form.
///
/// Point arrays are index-aligned; `null` marks a missing coordinate.
/// Colinear groups are flat `[x1, y1, x2, y2, ...]` pixel lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationInput {
    pub image_size: ImageSize,
    pub object_points: Vec<[Coord; 3]>,
    pub image_points: Vec<[Coord; 2]>,
    #[serde(default)]
    pub colinear_groups: Vec<Vec<Coord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_guess: Option<CalibrationRecord>,
}
