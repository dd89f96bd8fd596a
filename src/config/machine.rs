//! Machine configuration - root configuration structure.

use serde::Deserialize;

use super::axis::{Axis, AxesConfig, AxisConfig};
use super::units::{Millimeters, MmPerMin, MmPerSecSquared};

/// What the planner does with its position after a cancel or a halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResumePolicy {
    /// Adopt the machine position reported by the step counters.
    #[default]
    Resync,
    /// Keep the last planned target (host re-sends from there).
    KeepPlanned,
}

/// Motion parameters shared by all axes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotionSettings {
    /// Acceleration used for ramps and junction speeds.
    #[serde(default = "default_acceleration", rename = "acceleration_mm_per_sec2")]
    pub acceleration: MmPerSecSquared,

    /// Allowed path deviation at a junction.
    #[serde(default = "default_junction_deviation", rename = "junction_deviation_mm")]
    pub junction_deviation: Millimeters,

    /// Feed rate used when none is given (G1).
    #[serde(default = "default_rate", rename = "default_feed_rate_mm_per_min")]
    pub default_feed_rate: MmPerMin,

    /// Seek rate used when none is given (G0).
    #[serde(default = "default_rate", rename = "default_seek_rate_mm_per_min")]
    pub default_seek_rate: MmPerMin,

    /// Step rate floor so every block keeps moving.
    #[serde(default = "default_min_steps_per_minute")]
    pub min_steps_per_minute: u32,

    /// Rate adjustments per second during ramps.
    #[serde(default = "default_acceleration_ticks")]
    pub acceleration_ticks_per_second: u32,

    /// Width of a step pulse.
    #[serde(default = "default_pulse_microseconds")]
    pub pulse_microseconds: u32,

    /// Position recovery after cancel or halt.
    #[serde(default)]
    pub resume_policy: ResumePolicy,
}

fn default_acceleration() -> MmPerSecSquared {
    MmPerSecSquared(500.0)
}

fn default_junction_deviation() -> Millimeters {
    Millimeters(0.006)
}

fn default_rate() -> MmPerMin {
    MmPerMin(8000.0)
}

fn default_min_steps_per_minute() -> u32 {
    1600
}

fn default_acceleration_ticks() -> u32 {
    100
}

fn default_pulse_microseconds() -> u32 {
    5
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            acceleration: default_acceleration(),
            junction_deviation: default_junction_deviation(),
            default_feed_rate: default_rate(),
            default_seek_rate: default_rate(),
            min_steps_per_minute: default_min_steps_per_minute(),
            acceleration_ticks_per_second: default_acceleration_ticks(),
            pulse_microseconds: default_pulse_microseconds(),
            resume_policy: ResumePolicy::default(),
        }
    }
}

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MachineConfig {
    /// Axis resolutions and polarities.
    #[serde(default)]
    pub axes: AxesConfig,

    /// Acceleration and rate settings.
    #[serde(default)]
    pub motion: MotionSettings,
}

impl MachineConfig {
    /// Get an axis configuration.
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        self.axes.get(axis)
    }

    /// Set the same resolution on every axis.
    pub fn with_steps_per_mm(mut self, steps_per_mm: f32) -> Self {
        self.axes.x.steps_per_mm = steps_per_mm;
        self.axes.y.steps_per_mm = steps_per_mm;
        self.axes.z.steps_per_mm = steps_per_mm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MachineConfig::default();
        assert_eq!(config.motion.min_steps_per_minute, 1600);
        assert_eq!(config.motion.acceleration_ticks_per_second, 100);
        assert_eq!(config.motion.resume_policy, ResumePolicy::Resync);
        assert!((config.axis(Axis::Z).steps_per_mm - 32.808).abs() < 0.001);
    }

    #[test]
    fn test_with_steps_per_mm() {
        let config = MachineConfig::default().with_steps_per_mm(100.0);
        for (_, axis) in config.axes.iter() {
            assert_eq!(axis.steps_per_mm, 100.0);
        }
    }
}
