use crate::{Pt2, Pt3, Real};
use serde::{Deserialize, Serialize};

/// A single surveyed or observed scalar that may be absent.
///
/// Serialised as a JSON number or `null`. Non-finite numbers are treated as
/// missing on ingestion so that no NaN ever reaches the numerical code.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<Real>", into = "Option<Real>")]
pub enum Coord {
    Present(Real),
    Missing,
}

impl Coord {
    /// The value, if present and finite. A non-finite `Present` counts as missing.
    pub fn value(self) -> Option<Real> {
        match self {
            Coord::Present(v) if v.is_finite() => Some(v),
            _ => None,
        }
    }

    pub fn is_present(self) -> bool {
        self.value().is_some()
    }
}

impl From<Real> for Coord {
    fn from(v: Real) -> Self {
        if v.is_finite() {
            Coord::Present(v)
        } else {
            Coord::Missing
        }
    }
}

impl From<Option<Real>> for Coord {
    fn from(v: Option<Real>) -> Self {
        v.map_or(Coord::Missing, Coord::from)
    }
}

impl From<Coord> for Option<Real> {
    fn from(c: Coord) -> Self {
        c.value()
    }
}

/// Lift a fixed array of raw values into coordinates.
pub fn coords<const N: usize>(values: [Real; N]) -> [Coord; N] {
    values.map(Coord::from)
}

/// A surveyed world point paired with its observed pixel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub object: [Coord; 3],
    pub image: [Coord; 2],
}

impl ControlPoint {
    pub fn new(object: [Real; 3], image: [Real; 2]) -> Self {
        Self {
            object: coords(object),
            image: coords(image),
        }
    }

    /// All five scalars present.
    pub fn is_valid(&self) -> bool {
        self.object_point().is_some() && self.image_point().is_some()
    }

    pub fn object_point(&self) -> Option<Pt3> {
        Some(Pt3::new(
            self.object[0].value()?,
            self.object[1].value()?,
            self.object[2].value()?,
        ))
    }

    pub fn image_point(&self) -> Option<Pt2> {
        Some(Pt2::new(self.image[0].value()?, self.image[1].value()?))
    }
}
