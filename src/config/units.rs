//! Unit types for physical quantities.
//!
//! Configuration values carry their unit in the type; the planner unwraps
//! them into plain `f32` once, in [`Kinematics`](super::Kinematics).

use serde::Deserialize;

/// Linear position or distance in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f32);

impl Millimeters {
    /// Create a new Millimeters value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Feed rate in millimetres per minute (the unit G-code `F` words use).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MmPerMin(pub f32);

impl MmPerMin {
    /// Create a new MmPerMin value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Linear acceleration in millimetres per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MmPerSecSquared(pub f32);

impl MmPerSecSquared {
    /// Create a new MmPerSecSquared value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Convert to mm/min², the unit the planner works in.
    #[inline]
    pub fn per_minute_squared(self) -> f32 {
        self.0 * 3600.0
    }
}

/// Signed step count on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Steps(pub i32);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Get absolute value as u32.
    #[inline]
    pub fn abs(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// Convert to millimetres using the axis resolution.
    #[inline]
    pub fn to_millimeters(self, steps_per_mm: f32) -> Millimeters {
        Millimeters(self.0 as f32 / steps_per_mm)
    }

    /// Create from millimetres, rounding to the nearest step.
    #[inline]
    pub fn from_millimeters(mm: Millimeters, steps_per_mm: f32) -> Self {
        Self(libm::roundf(mm.0 * steps_per_mm) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceleration_per_minute() {
        let a = MmPerSecSquared::new(500.0);
        assert!((a.per_minute_squared() - 1_800_000.0).abs() < 1.0);
    }

    #[test]
    fn test_steps_round_trip() {
        let steps = Steps::from_millimeters(Millimeters(10.0), 32.808_4);
        assert_eq!(steps.value(), 328);
        assert!((steps.to_millimeters(32.808_4).value() - 10.0).abs() < 0.02);
    }

    #[test]
    fn test_steps_round_negative() {
        let steps = Steps::from_millimeters(Millimeters(-0.26), 10.0);
        assert_eq!(steps.value(), -3);
        assert_eq!(steps.abs(), 3);
    }
}
