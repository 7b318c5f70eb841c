//! Calibration flag bitmask.
//!
//! Bit values are the OpenCV `CALIB_*` constants so that records produced by
//! existing field tools keep their meaning. Unknown bits are carried through
//! untouched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Caller-assembled set of calibration toggles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationFlags(pub u32);

impl CalibrationFlags {
    pub const NONE: Self = Self(0);
    pub const USE_INTRINSIC_GUESS: Self = Self(0x0000_0001);
    pub const FIX_ASPECT_RATIO: Self = Self(0x0000_0002);
    pub const FIX_PRINCIPAL_POINT: Self = Self(0x0000_0004);
    pub const ZERO_TANGENT_DIST: Self = Self(0x0000_0008);
    pub const FIX_FOCAL_LENGTH: Self = Self(0x0000_0010);
    pub const FIX_K1: Self = Self(0x0000_0020);
    pub const FIX_K2: Self = Self(0x0000_0040);
    pub const FIX_K3: Self = Self(0x0000_0080);
    pub const FIX_K4: Self = Self(0x0000_0800);
    pub const FIX_K5: Self = Self(0x0000_1000);
    pub const FIX_K6: Self = Self(0x0000_2000);
    pub const RATIONAL_MODEL: Self = Self(0x0000_4000);
    pub const THIN_PRISM_MODEL: Self = Self(0x0000_8000);
    pub const FIX_S1_S2_S3_S4: Self = Self(0x0001_0000);
    pub const TILTED_MODEL: Self = Self(0x0004_0000);
    pub const FIX_TAUX_TAUY: Self = Self(0x0008_0000);
    pub const FIX_TANGENT_DIST: Self = Self(0x0020_0000);

    const NAMED: [(Self, &'static str); 17] = [
        (Self::USE_INTRINSIC_GUESS, "USE_INTRINSIC_GUESS"),
        (Self::FIX_ASPECT_RATIO, "FIX_ASPECT_RATIO"),
        (Self::FIX_PRINCIPAL_POINT, "FIX_PRINCIPAL_POINT"),
        (Self::ZERO_TANGENT_DIST, "ZERO_TANGENT_DIST"),
        (Self::FIX_FOCAL_LENGTH, "FIX_FOCAL_LENGTH"),
        (Self::FIX_K1, "FIX_K1"),
        (Self::FIX_K2, "FIX_K2"),
        (Self::FIX_K3, "FIX_K3"),
        (Self::FIX_K4, "FIX_K4"),
        (Self::FIX_K5, "FIX_K5"),
        (Self::FIX_K6, "FIX_K6"),
        (Self::RATIONAL_MODEL, "RATIONAL_MODEL"),
        (Self::THIN_PRISM_MODEL, "THIN_PRISM_MODEL"),
        (Self::FIX_S1_S2_S3_S4, "FIX_S1_S2_S3_S4"),
        (Self::TILTED_MODEL, "TILTED_MODEL"),
        (Self::FIX_TAUX_TAUY, "FIX_TAUX_TAUY"),
        (Self::FIX_TANGENT_DIST, "FIX_TANGENT_DIST"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of distortion coefficients the enabled model reports.
    pub fn distortion_len(self) -> usize {
        if self.contains(Self::TILTED_MODEL) {
            14
        } else if self.contains(Self::THIN_PRISM_MODEL) {
            12
        } else if self.contains(Self::RATIONAL_MODEL) {
            8
        } else {
            5
        }
    }
}

impl BitOr for CalibrationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CalibrationFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// `0x0000000c (FIX_PRINCIPAL_POINT | ZERO_TANGENT_DIST)`
impl fmt::Display for CalibrationFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)?;
        if self.is_empty() {
            return write!(f, " (none)");
        }
        let mut names: Vec<String> = Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| (*name).to_string())
            .collect();
        let known = Self::NAMED.iter().fold(0, |acc, (flag, _)| acc | flag.0);
        let unknown = self.0 & !known;
        if unknown != 0 {
            names.push(format!("{unknown:#x}"));
        }
        write!(f, " ({})", names.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_names_and_unknown_bits() {
        let flags = CalibrationFlags::FIX_PRINCIPAL_POINT
            | CalibrationFlags::ZERO_TANGENT_DIST
            | CalibrationFlags(0x0100_0000);
        assert_eq!(
            flags.to_string(),
            "0x0100000c (FIX_PRINCIPAL_POINT | ZERO_TANGENT_DIST | 0x1000000)"
        );
        assert_eq!(CalibrationFlags::NONE.to_string(), "0x00000000 (none)");
    }

    #[test]
    fn distortion_length_follows_model() {
        assert_eq!(CalibrationFlags::NONE.distortion_len(), 5);
        assert_eq!(CalibrationFlags::RATIONAL_MODEL.distortion_len(), 8);
        assert_eq!(
            (CalibrationFlags::RATIONAL_MODEL | CalibrationFlags::THIN_PRISM_MODEL)
                .distortion_len(),
            12
        );
        assert_eq!(CalibrationFlags::TILTED_MODEL.distortion_len(), 14);
    }

    #[test]
    fn serializes_as_plain_integer() {
        let flags = CalibrationFlags::FIX_K3 | CalibrationFlags::USE_INTRINSIC_GUESS;
        assert_eq!(serde_json::to_string(&flags).unwrap(), "129");
        let back: CalibrationFlags = serde_json::from_str("129").unwrap();
        assert_eq!(back, flags);
    }
}
