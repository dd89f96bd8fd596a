//! Per-axis configuration from TOML.

use serde::Deserialize;

use super::units::MmPerMin;

/// Stock resolution of the belt-driven laser gantry (microsteps per mm).
pub const DEFAULT_STEPS_PER_MM: f32 = 32.808_399;

/// Machine axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X axis (bit 0).
    X,
    /// Y axis (bit 1).
    Y,
    /// Z axis (bit 2).
    Z,
}

impl Axis {
    /// All axes in bit order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Array index of this axis.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Bit mask of this axis in step/direction bit sets.
    #[inline]
    pub const fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// Configuration of one linear axis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AxisConfig {
    /// Motor steps (including microstepping) per millimetre of travel.
    #[serde(default = "default_steps_per_mm")]
    pub steps_per_mm: f32,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Optional maximum travel rate of this axis.
    #[serde(default, rename = "max_rate_mm_per_min")]
    pub max_rate: Option<MmPerMin>,
}

fn default_steps_per_mm() -> f32 {
    DEFAULT_STEPS_PER_MM
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            steps_per_mm: DEFAULT_STEPS_PER_MM,
            invert_direction: false,
            max_rate: None,
        }
    }
}

impl AxisConfig {
    /// Create an axis with the given resolution and no rate limit.
    pub fn new(steps_per_mm: f32) -> Self {
        Self {
            steps_per_mm,
            ..Self::default()
        }
    }
}

/// The three machine axes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AxesConfig {
    /// X axis.
    #[serde(default)]
    pub x: AxisConfig,
    /// Y axis.
    #[serde(default)]
    pub y: AxisConfig,
    /// Z axis.
    #[serde(default)]
    pub z: AxisConfig,
}

impl AxesConfig {
    /// Get an axis configuration.
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Iterate axes in bit order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &AxisConfig)> {
        Axis::ALL.into_iter().map(move |axis| (axis, self.get(axis)))
    }
}
