use super::Coord;
use crate::Pt2;
use thiserror::Error;

/// Why a raw colinear group was refused.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColinearGroupError {
    #[error("has an odd number of coordinates ({0}); points must be given as x, y pairs")]
    OddCoordinateCount(usize),
    #[error("point {point} is missing its {axis} coordinate")]
    MissingCoordinate { point: usize, axis: char },
    #[error("has {0} point(s); at least 3 are needed to test straightness")]
    TooFewPoints(usize),
    #[error("all points coincide; the group does not define a line")]
    Degenerate,
}

/// Image points believed to lie on one straight world line.
#[derive(Clone, Debug, PartialEq)]
pub struct ColinearGroup {
    points: Vec<Pt2>,
}

impl ColinearGroup {
    pub const MIN_POINTS: usize = 3;

    /// Parse a flat `[x1, y1, x2, y2, ...]` list.
    pub fn from_flat(coords: &[Coord]) -> Result<Self, ColinearGroupError> {
        if coords.len() % 2 != 0 {
            return Err(ColinearGroupError::OddCoordinateCount(coords.len()));
        }
        let points = coords
            .chunks_exact(2)
            .enumerate()
            .map(|(i, xy)| {
                let x = xy[0].value().ok_or(ColinearGroupError::MissingCoordinate {
                    point: i + 1,
                    axis: 'x',
                })?;
                let y = xy[1].value().ok_or(ColinearGroupError::MissingCoordinate {
                    point: i + 1,
                    axis: 'y',
                })?;
                Ok(Pt2::new(x, y))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_points(points)
    }

    pub fn from_points(points: Vec<Pt2>) -> Result<Self, ColinearGroupError> {
        if points.len() < Self::MIN_POINTS {
            return Err(ColinearGroupError::TooFewPoints(points.len()));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Pt2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords;

    #[test]
    fn flat_list_becomes_points() {
        let g = ColinearGroup::from_flat(&coords([0.0, 1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.points()[2], Pt2::new(4.0, 5.0));
    }

    #[test]
    fn malformed_groups_are_refused() {
        assert_eq!(
            ColinearGroup::from_flat(&coords([0.0, 1.0, 2.0, 3.0, 4.0])),
            Err(ColinearGroupError::OddCoordinateCount(5))
        );
        assert_eq!(
            ColinearGroup::from_flat(&coords([0.0, 1.0, 2.0, 3.0])),
            Err(ColinearGroupError::TooFewPoints(2))
        );
        let mut c = coords([0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).to_vec();
        c[3] = Coord::Missing;
        assert_eq!(
            ColinearGroup::from_flat(&c),
            Err(ColinearGroupError::MissingCoordinate { point: 2, axis: 'y' })
        );
    }
}
