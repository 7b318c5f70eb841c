//! Persisted calibration record.
//!
//! Field names match the records written by the existing field tools.
//! Vectors may be stored flat or as a single row/column; this module is the
//! only place that layout is interpreted.

use super::{CalibrationResult, DistortionVector, ExtrinsicPose, ImageSize, IntrinsicModel};
use crate::{GeometryError, Mat3, Real, RotationInput, Vec3};
use serde::{Deserialize, Serialize};

/// A numeric array as found in records: flat, a single row, or one value per row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayRepr {
    Flat(Vec<Real>),
    Nested(Vec<Vec<Real>>),
}

impl ArrayRepr {
    /// Values in row-major order together with the stored shape.
    fn flatten(&self) -> (Vec<Real>, usize, usize) {
        match self {
            ArrayRepr::Flat(v) => (v.clone(), 1, v.len()),
            ArrayRepr::Nested(rows) => {
                let cols = rows.first().map_or(0, Vec::len);
                let values: Vec<Real> = rows.iter().flatten().copied().collect();
                (values, rows.len(), cols)
            }
        }
    }

    fn to_rotation(&self) -> Result<RotationInput, GeometryError> {
        let (values, rows, cols) = self.flatten();
        RotationInput::from_slice(&values, rows, cols)
    }

    fn to_vec3(&self) -> Result<Vec3, GeometryError> {
        let (values, rows, cols) = self.flatten();
        if values.len() != 3 || !(rows == 1 || cols == 1) {
            return Err(GeometryError::UnsupportedShape { rows, cols });
        }
        Ok(Vec3::from_column_slice(&values))
    }

    fn to_row_vector(&self) -> Vec<Real> {
        self.flatten().0
    }
}

impl From<Vec3> for ArrayRepr {
    fn from(v: Vec3) -> Self {
        ArrayRepr::Flat(v.as_slice().to_vec())
    }
}

/// Wire form of a calibration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    #[serde(rename = "imageSize")]
    pub image_size: ImageSize,
    #[serde(alias = "cameraMatrix")]
    pub cmat: [[Real; 3]; 3],
    #[serde(alias = "distortionVector")]
    pub dvec: ArrayRepr,
    pub rvec: ArrayRepr,
    pub tvec: ArrayRepr,
    #[serde(rename = "R44", default, skip_serializing_if = "Option::is_none")]
    pub r44: Option<[[Real; 4]; 4]>,
    #[serde(rename = "CamPosition", default, skip_serializing_if = "Option::is_none")]
    pub cam_position: Option<[Real; 3]>,
}

impl CalibrationRecord {
    /// Export a result; the derived `R44` and `CamPosition` are recomputed.
    pub fn from_parts(image_size: ImageSize, intrinsics: &IntrinsicModel, pose: &ExtrinsicPose) -> Self {
        let k = intrinsics.camera_matrix();
        let h = pose.to_homogeneous();
        let c = pose.camera_position();
        Self {
            image_size,
            cmat: std::array::from_fn(|r| std::array::from_fn(|col| k[(r, col)])),
            dvec: ArrayRepr::Flat(intrinsics.distortion.as_slice().to_vec()),
            rvec: pose.rvec.into(),
            tvec: pose.tvec.into(),
            r44: Some(std::array::from_fn(|r| std::array::from_fn(|col| h[(r, col)]))),
            cam_position: Some([c.x, c.y, c.z]),
        }
    }

    pub fn intrinsics(&self) -> Result<IntrinsicModel, GeometryError> {
        let cmat = Mat3::from_fn(|r, c| self.cmat[r][c]);
        if cmat.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("camera matrix"));
        }
        let dvec = DistortionVector::new(&self.dvec.to_row_vector())?;
        Ok(IntrinsicModel::from_camera_matrix(&cmat, dvec))
    }

    /// Pose from `rvec` (1x3, 3x1 or 3x3) and `tvec`. `R44`/`CamPosition` are
    /// derived data and are not read back.
    pub fn pose(&self) -> Result<ExtrinsicPose, GeometryError> {
        ExtrinsicPose::from_rotation(self.rvec.to_rotation()?, self.tvec.to_vec3()?)
    }
}

impl From<&CalibrationResult> for CalibrationRecord {
    fn from(r: &CalibrationResult) -> Self {
        Self::from_parts(r.image_size, &r.intrinsics, &r.pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PinholeIntrinsics;

    fn sample() -> (IntrinsicModel, ExtrinsicPose) {
        let intr = IntrinsicModel {
            k: PinholeIntrinsics {
                fx: 812.0,
                fy: 805.0,
                cx: 641.0,
                cy: 358.0,
            },
            distortion: DistortionVector::new(&[-0.2, 0.05, 0.0, 0.0, 0.01]).unwrap(),
        };
        let pose = ExtrinsicPose::new(Vec3::new(0.1, 0.2, -0.05), Vec3::new(-40.0, 10.0, 500.0));
        (intr, pose)
    }

    #[test]
    fn record_roundtrip_through_json() {
        let (intr, pose) = sample();
        let rec = CalibrationRecord::from_parts(ImageSize::new(1280, 720), &intr, &pose);
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"imageSize\""));
        assert!(json.contains("\"R44\""));
        assert!(json.contains("\"CamPosition\""));

        let back: CalibrationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.intrinsics().unwrap(), intr);
        let p = back.pose().unwrap();
        assert!((p.rvec - pose.rvec).norm() < 1e-12);
        assert!((p.tvec - pose.tvec).norm() < 1e-12);
    }

    #[test]
    fn accepts_column_vectors_and_rotation_matrices() {
        let (_, pose) = sample();
        let r = pose.rotation_matrix();
        let json = format!(
            r#"{{
                "imageSize": {{"width": 640, "height": 480}},
                "cameraMatrix": [[500, 0, 320], [0, 500, 240], [0, 0, 1]],
                "distortionVector": [[0.1, 0.0, 0.0, 0.0]],
                "rvec": [[{}, {}, {}], [{}, {}, {}], [{}, {}, {}]],
                "tvec": [[1.0], [2.0], [3.0]]
            }}"#,
            r[(0, 0)], r[(0, 1)], r[(0, 2)],
            r[(1, 0)], r[(1, 1)], r[(1, 2)],
            r[(2, 0)], r[(2, 1)], r[(2, 2)],
        );
        let rec: CalibrationRecord = serde_json::from_str(&json).unwrap();
        let p = rec.pose().unwrap();
        assert!((p.rvec - pose.rvec).norm() < 1e-9);
        assert_eq!(p.tvec, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(rec.intrinsics().unwrap().distortion.len(), 4);
    }

    #[test]
    fn malformed_tvec_is_rejected() {
        let mut rec = CalibrationRecord::from_parts(
            ImageSize::new(10, 10),
            &sample().0,
            &ExtrinsicPose::default(),
        );
        rec.tvec = ArrayRepr::Flat(vec![1.0, 2.0]);
        assert!(rec.pose().is_err());
    }
}
