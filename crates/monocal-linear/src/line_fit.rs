use crate::LineFitError;
use monocal_core::{centroid_2d, Pt2, Real, Vec2};
use nalgebra::Matrix2;

/// Infinite 2D line through `centroid` along the unit `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line2 {
    pub centroid: Pt2,
    pub direction: Vec2,
}

impl Line2 {
    /// Unit normal, rotated +90° from the direction.
    pub fn normal(&self) -> Vec2 {
        Vec2::new(-self.direction.y, self.direction.x)
    }

    /// Orthogonal projection of `p` onto the line.
    pub fn project(&self, p: &Pt2) -> Pt2 {
        let s = (p - self.centroid).dot(&self.direction);
        self.centroid + self.direction * s
    }

    /// Unsigned perpendicular distance from `p` to the line.
    pub fn distance(&self, p: &Pt2) -> Real {
        (p - self.centroid).dot(&self.normal()).abs()
    }

    /// Root mean square of the perpendicular distances; zero for an empty set.
    pub fn rms_distance(&self, points: &[Pt2]) -> Real {
        if points.is_empty() {
            return 0.0;
        }
        let sum: Real = points.iter().map(|p| self.distance(p).powi(2)).sum();
        (sum / points.len() as Real).sqrt()
    }
}

/// Total least squares line fit: the line through the centroid along the
/// principal axis of the 2x2 scatter matrix.
pub fn fit_line_principal_axis(points: &[Pt2]) -> Result<Line2, LineFitError> {
    if points.len() < 2 {
        return Err(LineFitError::NotEnoughPoints(points.len()));
    }
    let centroid = centroid_2d(points).ok_or(LineFitError::NotEnoughPoints(0))?;
    let scatter = points.iter().fold(Matrix2::<Real>::zeros(), |acc, p| {
        let d = p - centroid;
        acc + d * d.transpose()
    });
    if scatter.trace() <= Real::EPSILON * Real::EPSILON {
        return Err(LineFitError::Degenerate);
    }

    let eig = scatter.symmetric_eigen();
    let major = if eig.eigenvalues[0] >= eig.eigenvalues[1] { 0 } else { 1 };
    let direction: Vec2 = eig.eigenvectors.column(major).into_owned();
    let norm = direction.norm();
    if !norm.is_finite() || norm <= Real::EPSILON {
        return Err(LineFitError::Degenerate);
    }
    Ok(Line2 {
        centroid,
        direction: direction / norm,
    })
}
