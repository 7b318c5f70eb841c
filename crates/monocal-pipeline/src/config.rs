use monocal_core::{CalibrationFlags, Real, UndistortOptions};
use monocal_optim::TermCriteria;
use serde::{Deserialize, Serialize};

/// Depth assigned to back-projected colinear points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ColinearDepth {
    /// Mean camera-frame depth of the valid control points under the
    /// bootstrap pose.
    #[default]
    MeanControlPointDepth,
    /// A fixed camera-frame depth in world units.
    Fixed { depth: Real },
}

/// Settings for one two-pass calibration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColinearCalibrationConfig {
    /// Passed unchanged to both solver passes.
    pub flags: CalibrationFlags,
    pub term_criteria: TermCriteria,
    pub undistort: UndistortOptions,
    pub depth: ColinearDepth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_reads_partial_json() {
        let cfg: ColinearCalibrationConfig = serde_json::from_str(
            r#"{"flags": 12, "depth": {"mode": "fixed", "depth": 350.0}}"#,
        )
        .unwrap();
        assert_eq!(
            cfg.flags,
            CalibrationFlags::FIX_PRINCIPAL_POINT | CalibrationFlags::ZERO_TANGENT_DIST
        );
        assert_eq!(cfg.depth, ColinearDepth::Fixed { depth: 350.0 });
        assert_eq!(cfg.term_criteria, TermCriteria::default());
    }

    #[test]
    fn default_depth_is_mean_of_control_points() {
        let cfg: ColinearCalibrationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.depth, ColinearDepth::MeanControlPointDepth);
        assert!(cfg.flags.is_empty());
    }
}
