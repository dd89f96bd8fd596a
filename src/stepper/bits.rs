//! Per-axis bit sets for step and direction lines.

use core::ops::{BitOr, BitOrAssign, BitXor};

use crate::config::Axis;

/// Axes that receive a step pulse on a tick (bit 0 = X, 1 = Y, 2 = Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepBits(u8);

impl StepBits {
    /// No axis steps.
    pub const NONE: Self = Self(0);

    /// Build from a raw mask (bits above Z are dropped).
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Raw mask.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether `axis` steps.
    #[inline]
    pub const fn contains(self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }

    /// Mark `axis` as stepping.
    #[inline]
    pub fn insert(&mut self, axis: Axis) {
        self.0 |= axis.bit();
    }

    /// Whether no axis steps.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for StepBits {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StepBits {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Direction line levels (bit set = line driven high).
///
/// Blocks carry these already XOR-ed with the machine invert mask, so the
/// engine writes them to the pins unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirectionBits(u8);

impl DirectionBits {
    /// All direction lines low.
    pub const NONE: Self = Self(0);

    /// Build from a raw mask (bits above Z are dropped).
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Raw mask.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the line of `axis` is high.
    #[inline]
    pub const fn contains(self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }

    /// Drive the line of `axis` high.
    #[inline]
    pub fn insert(&mut self, axis: Axis) {
        self.0 |= axis.bit();
    }
}

impl BitXor for DirectionBits {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_bits() {
        let mut bits = StepBits::NONE;
        assert!(bits.is_empty());
        bits.insert(Axis::Y);
        assert!(bits.contains(Axis::Y));
        assert!(!bits.contains(Axis::X));
        assert_eq!((bits | StepBits::from_bits(0b100)).bits(), 0b110);
    }

    #[test]
    fn test_direction_invert() {
        let negative_x = DirectionBits::from_bits(0b001);
        let invert_x_and_z = DirectionBits::from_bits(0b101);
        assert_eq!((negative_x ^ invert_x_and_z).bits(), 0b100);
        assert_eq!(DirectionBits::from_bits(0xff).bits(), 0b111);
    }
}
