use crate::{CalibrationWarning, ColinearGroupReport};
use monocal_core::{CalibrationFlags, CalibrationRecord, CalibrationResult, Real};
use serde::Serialize;

/// Outcome of a two-pass calibration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    /// Final calibration: the refined result, or the bootstrap one if
    /// refinement was skipped or failed.
    pub result: CalibrationResult,
    pub bootstrap: CalibrationResult,
    pub refined: bool,
    /// Flags both passes were solved with.
    pub flags: CalibrationFlags,
    pub warnings: Vec<CalibrationWarning>,
    pub colinear_groups: Vec<ColinearGroupReport>,
    pub synthetic_points: usize,
    pub valid_points: usize,
    /// Reprojection error of each caller control point under the final
    /// result; `None` where the point had a missing coordinate.
    pub per_point_errors: Vec<Option<Real>>,
}

impl CalibrationReport {
    pub fn to_record(&self) -> CalibrationRecord {
        CalibrationRecord::from(&self.result)
    }
}
