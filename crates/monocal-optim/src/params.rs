//! Packing of the 24-scalar parameter vector and the free subset chosen by flags.
//!
//! Full layout: `fx, fy, cx, cy, k1, k2, p1, p2, k3, k4, k5, k6, s1, s2, s3,
//! s4, taux, tauy, rx, ry, rz, tx, ty, tz`.

use monocal_core::{CalibrationFlags, ExtrinsicPose, IntrinsicModel, Real, Vec3, INTRINSIC_PARAMS};
use nalgebra::{DVector, RealField};

pub const PARAM_COUNT: usize = INTRINSIC_PARAMS + 6;

pub const FX: usize = 0;
pub const FY: usize = 1;
pub const CX: usize = 2;
pub const CY: usize = 3;
pub const K1: usize = 4;
pub const K2: usize = 5;
pub const P1: usize = 6;
pub const P2: usize = 7;
pub const K3: usize = 8;
pub const K4: usize = 9;
pub const K5: usize = 10;
pub const K6: usize = 11;
pub const S1: usize = 12;
pub const TAU_X: usize = 16;
pub const TAU_Y: usize = 17;
pub const RVEC: usize = 18;
pub const TVEC: usize = 21;

/// Role of one scalar of the full parameter vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    /// Optimised; the payload is the column in the free vector.
    Free(usize),
    /// Held at its initial value.
    Fixed,
    /// `value = ratio * full[source]`, where `source` is itself free.
    Tied { source: usize, ratio: Real },
}

/// Mapping between the full parameter vector and the free subset.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamLayout {
    slots: [Slot; PARAM_COUNT],
    free: Vec<usize>,
}

impl ParamLayout {
    /// Derive the free set from `flags`. `initial` supplies the focal ratio
    /// kept by `FIX_ASPECT_RATIO`.
    pub fn from_flags(flags: CalibrationFlags, initial: &[Real; PARAM_COUNT]) -> Self {
        let mut fixed = [false; PARAM_COUNT];
        let mut fix = |idx: &[usize]| idx.iter().for_each(|&i| fixed[i] = true);

        if flags.contains(CalibrationFlags::FIX_FOCAL_LENGTH) {
            fix(&[FX, FY]);
        }
        if flags.contains(CalibrationFlags::FIX_PRINCIPAL_POINT) {
            fix(&[CX, CY]);
        }
        if flags.contains(CalibrationFlags::ZERO_TANGENT_DIST)
            || flags.contains(CalibrationFlags::FIX_TANGENT_DIST)
        {
            fix(&[P1, P2]);
        }
        for (flag, idx) in [
            (CalibrationFlags::FIX_K1, K1),
            (CalibrationFlags::FIX_K2, K2),
            (CalibrationFlags::FIX_K3, K3),
            (CalibrationFlags::FIX_K4, K4),
            (CalibrationFlags::FIX_K5, K5),
            (CalibrationFlags::FIX_K6, K6),
        ] {
            if flags.contains(flag) {
                fix(&[idx]);
            }
        }
        if !flags.contains(CalibrationFlags::RATIONAL_MODEL) {
            fix(&[K4, K5, K6]);
        }
        if !flags.contains(CalibrationFlags::THIN_PRISM_MODEL)
            || flags.contains(CalibrationFlags::FIX_S1_S2_S3_S4)
        {
            fix(&[S1, S1 + 1, S1 + 2, S1 + 3]);
        }
        if !flags.contains(CalibrationFlags::TILTED_MODEL)
            || flags.contains(CalibrationFlags::FIX_TAUX_TAUY)
        {
            fix(&[TAU_X, TAU_Y]);
        }

        let tie_aspect = flags.contains(CalibrationFlags::FIX_ASPECT_RATIO) && !fixed[FX];

        let mut slots = [Slot::Fixed; PARAM_COUNT];
        let mut free = Vec::with_capacity(PARAM_COUNT);
        for (i, slot) in slots.iter_mut().enumerate() {
            if fixed[i] || (tie_aspect && i == FX) {
                continue;
            }
            *slot = Slot::Free(free.len());
            free.push(i);
        }
        if tie_aspect {
            let ratio = if initial[FY].abs() > Real::EPSILON {
                initial[FX] / initial[FY]
            } else {
                1.0
            };
            slots[FX] = Slot::Tied { source: FY, ratio };
        }
        Self { slots, free }
    }

    pub fn slot(&self, idx: usize) -> Slot {
        self.slots[idx]
    }

    pub fn num_free(&self) -> usize {
        self.free.len()
    }

    /// Full-vector index of each free column.
    pub fn free_indices(&self) -> &[usize] {
        &self.free
    }

    pub fn free_values(&self, full: &[Real; PARAM_COUNT]) -> DVector<Real> {
        DVector::from_iterator(self.free.len(), self.free.iter().map(|&i| full[i]))
    }

    /// Rebuild the full vector from the free values, taking fixed entries
    /// from `base`. Generic so that dual numbers flow through ties.
    pub fn expand<T: RealField + Copy>(&self, free: &[T], base: &[Real; PARAM_COUNT]) -> [T; PARAM_COUNT] {
        let mut out = [T::zero(); PARAM_COUNT];
        for (i, slot) in self.slots.iter().enumerate() {
            out[i] = match *slot {
                Slot::Free(col) => free[col],
                Slot::Fixed => nalgebra::convert(base[i]),
                Slot::Tied { .. } => T::zero(),
            };
        }
        for (i, slot) in self.slots.iter().enumerate() {
            if let Slot::Tied { source, ratio } = *slot {
                out[i] = out[source] * nalgebra::convert::<Real, T>(ratio);
            }
        }
        out
    }
}

/// Full parameter vector from an intrinsic model and a pose.
pub fn pack(intrinsics: &IntrinsicModel, pose: &ExtrinsicPose) -> [Real; PARAM_COUNT] {
    let mut p = [0.0; PARAM_COUNT];
    p[..INTRINSIC_PARAMS].copy_from_slice(&intrinsics.packed());
    p[RVEC..RVEC + 3].copy_from_slice(pose.rvec.as_slice());
    p[TVEC..TVEC + 3].copy_from_slice(pose.tvec.as_slice());
    p
}

/// Inverse of [`pack`]; `dist_len` sets the reported distortion length.
pub fn unpack(p: &[Real; PARAM_COUNT], dist_len: usize) -> (IntrinsicModel, ExtrinsicPose) {
    let mut intr = [0.0; INTRINSIC_PARAMS];
    intr.copy_from_slice(&p[..INTRINSIC_PARAMS]);
    let pose = ExtrinsicPose::new(
        Vec3::new(p[RVEC], p[RVEC + 1], p[RVEC + 2]),
        Vec3::new(p[TVEC], p[TVEC + 1], p[TVEC + 2]),
    );
    (IntrinsicModel::from_packed(&intr, dist_len), pose)
}
