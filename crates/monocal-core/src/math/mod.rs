//! Scalar and fixed-size linear algebra aliases shared by every crate.
//!
//! All geometry is carried in these value types. Shape handling of raw
//! numeric input (row vs. column vectors, flat vs. nested arrays) happens once
//! at ingestion, see [`crate::geometry::RotationInput`].

use nalgebra::{Isometry3, Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

/// Scalar type used throughout the workspace.
pub type Real = f64;

pub type Vec2 = Vector2<Real>;
pub type Vec3 = Vector3<Real>;
pub type Pt2 = Point2<Real>;
pub type Pt3 = Point3<Real>;
pub type Mat3 = Matrix3<Real>;
pub type Mat4 = Matrix4<Real>;
/// Rigid world → camera transform.
pub type Iso3 = Isometry3<Real>;

/// Lift an image point to homogeneous coordinates `(x, y, 1)`.
pub fn to_homogeneous(p: &Pt2) -> Vec3 {
    Vec3::new(p.x, p.y, 1.0)
}

/// Drop the homogeneous coordinate. `w` must be non-zero.
pub fn from_homogeneous(v: &Vec3) -> Pt2 {
    Pt2::new(v.x / v.z, v.y / v.z)
}

/// Centroid of a non-empty point set.
pub fn centroid_2d(points: &[Pt2]) -> Option<Pt2> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec2::zeros(), |acc, p| acc + p.coords);
    Some(Pt2::from(sum / points.len() as Real))
}

/// Centroid of a non-empty 3D point set.
pub fn centroid_3d(points: &[Pt3]) -> Option<Pt3> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
    Some(Pt3::from(sum / points.len() as Real))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homogeneous_roundtrip() {
        let p = Pt2::new(3.0, -2.0);
        let h = to_homogeneous(&p) * 4.0;
        let back = from_homogeneous(&h);
        assert!((back - p).norm() < 1e-12);
    }

    #[test]
    fn centroid_of_empty_set_is_none() {
        assert!(centroid_2d(&[]).is_none());
        assert!(centroid_3d(&[]).is_none());
        let c = centroid_3d(&[Pt3::new(0.0, 0.0, 0.0), Pt3::new(2.0, 4.0, 6.0)]).unwrap();
        assert_eq!(c, Pt3::new(1.0, 2.0, 3.0));
    }
}
