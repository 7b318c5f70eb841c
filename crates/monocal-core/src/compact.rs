//! Dense valid-only view over sparse control-point input.
//!
//! Field data routinely has gaps: a survey point that was never observed in
//! the photo, or an observation whose survey was lost. Compaction keeps only
//! fully specified correspondences and remembers where each came from, so
//! per-point results can be reported at the caller's original indices.

use crate::{ControlPoint, Coord, Pt2, Pt3};

/// Bidirectional map between caller indices and dense valid indices.
///
/// Invariants: `all_to_valid[valid_to_all[i]] == Some(i)` for every valid
/// index `i`, and `valid_to_all[v] == j` whenever `all_to_valid[j] == Some(v)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidIndexMap {
    valid_to_all: Vec<usize>,
    all_to_valid: Vec<Option<usize>>,
}

impl ValidIndexMap {
    /// Caller index of dense entry `i`.
    pub fn valid_to_all(&self, i: usize) -> Option<usize> {
        self.valid_to_all.get(i).copied()
    }

    /// Dense index of caller entry `j`, `None` when it was dropped or out of range.
    pub fn all_to_valid(&self, j: usize) -> Option<usize> {
        self.all_to_valid.get(j).copied().flatten()
    }

    pub fn valid_indices(&self) -> &[usize] {
        &self.valid_to_all
    }

    /// Table form with `-1` for dropped entries, as stored by legacy tools.
    pub fn all_to_valid_raw(&self) -> Vec<i64> {
        self.all_to_valid
            .iter()
            .map(|v| v.map_or(-1, |i| i as i64))
            .collect()
    }

    pub fn valid_count(&self) -> usize {
        self.valid_to_all.len()
    }

    /// Number of caller entries that were scanned.
    pub fn total_count(&self) -> usize {
        self.all_to_valid.len()
    }

    /// Spread per-valid-point values back over caller indices.
    ///
    /// Values past the valid count (e.g. synthetic correspondences appended
    /// later) are ignored.
    pub fn scatter<T: Clone>(&self, values: &[T]) -> Vec<Option<T>> {
        self.all_to_valid
            .iter()
            .map(|slot| slot.and_then(|i| values.get(i).cloned()))
            .collect()
    }
}

/// Valid correspondences plus the index map that produced them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompactedPoints {
    pub object_points: Vec<Pt3>,
    pub image_points: Vec<Pt2>,
    pub map: ValidIndexMap,
}

impl CompactedPoints {
    pub fn len(&self) -> usize {
        self.object_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_points.is_empty()
    }
}

/// Keep the correspondences whose five scalars are all present.
///
/// Only the common prefix `0..min(objects.len(), images.len())` is scanned.
/// Order is preserved and inputs are not modified.
pub fn compact_points(objects: &[[Coord; 3]], images: &[[Coord; 2]]) -> CompactedPoints {
    let n = objects.len().min(images.len());
    let mut out = CompactedPoints {
        object_points: Vec::with_capacity(n),
        image_points: Vec::with_capacity(n),
        map: ValidIndexMap {
            valid_to_all: Vec::with_capacity(n),
            all_to_valid: Vec::with_capacity(n),
        },
    };

    for (j, (obj, img)) in objects.iter().zip(images.iter()).enumerate() {
        let cp = ControlPoint {
            object: *obj,
            image: *img,
        };
        match (cp.object_point(), cp.image_point()) {
            (Some(pw), Some(px)) => {
                out.map.all_to_valid.push(Some(out.object_points.len()));
                out.map.valid_to_all.push(j);
                out.object_points.push(pw);
                out.image_points.push(px);
            }
            _ => out.map.all_to_valid.push(None),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords;

    fn check_invariants(c: &CompactedPoints) {
        let map = &c.map;
        assert_eq!(map.valid_count(), c.object_points.len());
        assert_eq!(map.valid_count(), c.image_points.len());
        for i in 0..map.valid_count() {
            let j = map.valid_to_all(i).unwrap();
            assert_eq!(map.all_to_valid(j), Some(i));
        }
        for j in 0..map.total_count() {
            if let Some(i) = map.all_to_valid(j) {
                assert_eq!(map.valid_to_all(i), Some(j));
            }
        }
    }

    #[test]
    fn single_missing_scalar_drops_the_whole_point() {
        for missing in 0..5 {
            let mut objects = vec![
                coords([0.0, 0.0, 0.0]),
                coords([1.0, 0.0, 0.0]),
                coords([0.0, 1.0, 0.0]),
            ];
            let mut images = vec![
                coords([10.0, 10.0]),
                coords([20.0, 10.0]),
                coords([10.0, 20.0]),
            ];
            if missing < 3 {
                objects[1][missing] = Coord::Missing;
            } else {
                images[1][missing - 3] = Coord::Missing;
            }
            let c = compact_points(&objects, &images);
            check_invariants(&c);
            assert_eq!(c.len(), 2);
            assert_eq!(c.map.all_to_valid_raw(), vec![0, -1, 1]);
            assert_eq!(c.image_points[1], Pt2::new(10.0, 20.0));
        }
    }

    #[test]
    fn scans_only_the_common_prefix() {
        let objects = vec![coords([0.0, 0.0, 0.0]); 5];
        let images = vec![coords([1.0, 1.0]); 3];
        let c = compact_points(&objects, &images);
        check_invariants(&c);
        assert_eq!(c.map.total_count(), 3);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn invariants_hold_for_mixed_patterns() {
        // Every validity pattern over six points.
        for mask in 0u32..64 {
            let objects: Vec<[Coord; 3]> = (0..6)
                .map(|i| {
                    let mut p = coords([i as f64, 0.0, 1.0]);
                    if mask & (1 << i) != 0 {
                        p[2] = Coord::Missing;
                    }
                    p
                })
                .collect();
            let images = vec![coords([0.0, 0.0]); 6];
            let c = compact_points(&objects, &images);
            check_invariants(&c);
            assert_eq!(c.len(), 6 - mask.count_ones() as usize);
        }
    }

    #[test]
    fn non_finite_present_coordinate_is_dropped() {
        let objects = vec![
            coords([0.0, 0.0, 0.0]),
            [Coord::Present(f64::NAN), Coord::Present(1.0), Coord::Present(1.0)],
            coords([1.0, 1.0, 1.0]),
        ];
        let images = vec![coords([0.0, 0.0]); 3];
        let c = compact_points(&objects, &images);
        check_invariants(&c);
        assert_eq!(c.map.all_to_valid_raw(), vec![0, -1, 1]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let c = compact_points(&[], &[]);
        assert!(c.is_empty());
        assert_eq!(c.map.total_count(), 0);
    }

    #[test]
    fn scatter_maps_back_to_caller_indices() {
        let objects = vec![coords([0.0, 0.0, 0.0]), [Coord::Missing; 3], coords([1.0, 1.0, 1.0])];
        let images = vec![coords([0.0, 0.0]); 3];
        let c = compact_points(&objects, &images);
        let errors = c.map.scatter(&[0.5, 0.25, 9.0]);
        assert_eq!(errors, vec![Some(0.5), None, Some(0.25)]);
    }
}
