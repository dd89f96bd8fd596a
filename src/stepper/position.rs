//! Machine position in millimetres.

use libm::fabsf;

use crate::config::units::{Millimeters, Steps};
use crate::config::{Axis, Kinematics};

/// A point in machine coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    /// X coordinate in mm.
    pub x: f32,
    /// Y coordinate in mm.
    pub y: f32,
    /// Z coordinate in mm.
    pub z: f32,
}

impl Position {
    /// Create a position from coordinates in mm.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Convert step counters to millimetres.
    pub fn from_steps(steps: [i32; 3], kinematics: &Kinematics) -> Self {
        let mm = |axis: Axis| {
            Steps(steps[axis.index()])
                .to_millimeters(kinematics.steps_per_mm[axis.index()])
                .0
        };
        Self::new(mm(Axis::X), mm(Axis::Y), mm(Axis::Z))
    }

    /// Get the coordinate of `axis`.
    #[inline]
    pub fn axis(&self, axis: Axis) -> Millimeters {
        Millimeters(self.to_array()[axis.index()])
    }

    /// Coordinates as `[x, y, z]`.
    #[inline]
    pub const fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Whether every coordinate is within `tolerance` mm of `other`.
    pub fn approx_eq(&self, other: &Position, tolerance: f32) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| fabsf(a - b) <= tolerance)
    }
}

impl From<[f32; 3]> for Position {
    fn from(value: [f32; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;

    #[test]
    fn test_from_steps() {
        let kin = Kinematics::from_config(&MachineConfig::default().with_steps_per_mm(100.0));
        let pos = Position::from_steps([1000, -250, 0], &kin);

        assert!((pos.x - 10.0).abs() < 1e-4);
        assert!((pos.y + 2.5).abs() < 1e-4);
        assert_eq!(pos.axis(Axis::Z).0, 0.0);
    }

    #[test]
    fn test_approx_eq() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::from([1.0005, 2.0, 3.0]);
        assert!(a.approx_eq(&b, 0.001));
        assert!(!a.approx_eq(&b, 0.0001));
    }
}
