//! Pose and rotation utilities.
//!
//! Rotations arrive from the outside world in several shapes (a Rodrigues
//! vector stored as a row or a column, or a full 3x3 matrix). They are mapped
//! to [`RotationInput`] once, at the boundary; everything past that point works
//! on [`Vec3`] and [`Mat3`] only.
//!
//! Poses follow the usual camera convention: `x_cam = R * x_world + t`.

use crate::{GeometryError, Mat3, Mat4, Pt3, Real, Vec3};
use nalgebra::{Matrix3, RealField, Rotation3, UnitQuaternion, Vector3};

/// Tolerance on `‖RᵀR - I‖` when accepting a matrix as a rotation.
pub const ROTATION_TOLERANCE: Real = 1e-6;

/// A rotation in one of the accepted external representations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationInput {
    /// Rodrigues (axis-angle) vector, radians.
    Vector(Vec3),
    /// Row-major 3x3 rotation matrix.
    Matrix(Mat3),
}

impl RotationInput {
    /// Interpret `values` as a row-major `rows x cols` array.
    ///
    /// ```
    /// use monocal_core::RotationInput;
    ///
    /// let column = RotationInput::from_slice(&[0.1, 0.0, 0.2], 3, 1).unwrap();
    /// let row = RotationInput::from_slice(&[0.1, 0.0, 0.2], 1, 3).unwrap();
    /// assert_eq!(column, row);
    /// ```
    pub fn from_slice(values: &[Real], rows: usize, cols: usize) -> Result<Self, GeometryError> {
        let shape_ok = matches!((rows, cols), (1, 3) | (3, 1) | (3, 3));
        if !shape_ok {
            return Err(GeometryError::UnsupportedShape { rows, cols });
        }
        if values.len() != rows * cols {
            return Err(GeometryError::LengthMismatch {
                rows,
                cols,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite("rotation"));
        }
        if rows == 3 && cols == 3 {
            Ok(Self::Matrix(Mat3::from_row_slice(values)))
        } else {
            Ok(Self::Vector(Vec3::from_column_slice(values)))
        }
    }

    /// Rotation matrix for this input. Matrices are checked for orthonormality.
    pub fn to_matrix(&self) -> Result<Mat3, GeometryError> {
        match self {
            Self::Vector(v) => Ok(rodrigues_to_matrix(v)),
            Self::Matrix(m) => {
                check_rotation(m)?;
                Ok(*m)
            }
        }
    }

    /// Rodrigues vector for this input.
    pub fn to_rodrigues(&self) -> Result<Vec3, GeometryError> {
        match self {
            Self::Vector(v) => Ok(*v),
            Self::Matrix(m) => matrix_to_rodrigues(m),
        }
    }
}

/// Rodrigues vector → rotation matrix.
pub fn rodrigues_to_matrix(rvec: &Vec3) -> Mat3 {
    Rotation3::new(*rvec).into_inner()
}

/// Rotation matrix → Rodrigues vector with angle in `[0, π]`.
///
/// Goes through a unit quaternion so that angles close to `π` keep a
/// well-defined axis.
pub fn matrix_to_rodrigues(rotation: &Mat3) -> Result<Vec3, GeometryError> {
    check_rotation(rotation)?;
    let rot = Rotation3::from_matrix_unchecked(*rotation);
    Ok(UnitQuaternion::from_rotation_matrix(&rot).scaled_axis())
}

fn check_rotation(m: &Mat3) -> Result<(), GeometryError> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(GeometryError::NonFinite("rotation"));
    }
    let error = (m.transpose() * m - Mat3::identity()).norm();
    let det = m.determinant();
    if error > ROTATION_TOLERANCE || det <= 0.0 {
        return Err(GeometryError::NotARotation { error, det });
    }
    Ok(())
}

/// Assemble `[R | t; 0 0 0 1]`.
pub fn to_homogeneous_4x4(rotation: &Mat3, translation: &Vec3) -> Mat4 {
    let mut m = Mat4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    m
}

/// Split a rigid 4x4 transform into rotation and translation.
pub fn from_homogeneous_4x4(m: &Mat4) -> Result<(Mat3, Vec3), GeometryError> {
    let last = m.row(3);
    let expected = [0.0, 0.0, 0.0, 1.0];
    if last
        .iter()
        .zip(expected.iter())
        .any(|(a, b)| (a - b).abs() > ROTATION_TOLERANCE)
    {
        return Err(GeometryError::NotRigid);
    }
    let rotation: Mat3 = m.fixed_view::<3, 3>(0, 0).into_owned();
    check_rotation(&rotation)?;
    let translation: Vec3 = m.fixed_view::<3, 1>(0, 3).into_owned();
    Ok((rotation, translation))
}

/// Inverse of a rigid transform, `[Rᵀ | -Rᵀt]`.
pub fn invert_homogeneous_4x4(m: &Mat4) -> Result<Mat4, GeometryError> {
    let (r, t) = from_homogeneous_4x4(m)?;
    let rt = r.transpose();
    Ok(to_homogeneous_4x4(&rt, &(-(rt * t))))
}

/// Camera centre in world coordinates: the translation column of the inverse pose.
pub fn camera_position_in_world(rotation: &Mat3, translation: &Vec3) -> Vec3 {
    -(rotation.transpose() * translation)
}

/// Map a camera-frame point back into the world frame, `Rᵀ (p - t)`.
pub fn camera_to_world(rotation: &Mat3, translation: &Vec3, p_cam: &Vec3) -> Pt3 {
    Pt3::from(rotation.transpose() * (p_cam - translation))
}

/// Skew-symmetric cross-product matrix `[v]×`.
pub fn skew<T: RealField + Copy>(v: &Vector3<T>) -> Matrix3<T> {
    let z = T::zero();
    Matrix3::new(z, -v.z, v.y, v.z, z, -v.x, -v.y, v.x, z)
}

/// Rodrigues formula over any real field, so residuals can be evaluated on
/// dual numbers. Falls back to the first-order expansion for tiny angles,
/// where `θ = √(θ²)` has no usable derivative.
pub fn rodrigues_generic<T: RealField + Copy>(rvec: &Vector3<T>) -> Matrix3<T> {
    let theta2 = rvec.norm_squared();
    let k = skew(rvec);
    if theta2 < nalgebra::convert(1e-16) {
        return Matrix3::identity() + k;
    }
    let theta = theta2.sqrt();
    let (s, c) = theta.sin_cos();
    let a = s / theta;
    let b = (T::one() - c) / theta2;
    Matrix3::identity() + k * a + k * k * b
}
