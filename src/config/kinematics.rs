//! Derived kinematic parameters computed from machine configuration.

use crate::stepper::DirectionBits;

use super::axis::Axis;
use super::machine::{MachineConfig, ResumePolicy};

/// Nanoseconds per minute, the numerator of every rate-to-period conversion.
pub const NS_PER_MINUTE: u64 = 60_000_000_000;

/// Timer period for a step rate, never slower than `floor` steps/min.
#[inline]
pub fn step_period_ns(steps_per_minute: u32, floor: u32) -> u32 {
    let rate = steps_per_minute.max(floor).max(1);
    (NS_PER_MINUTE / rate as u64).min(u32::MAX as u64) as u32
}

/// Machine parameters in the units the planner and engine work in.
///
/// These are computed once at initialization and used for all motion planning.
#[derive(Debug, Clone, PartialEq)]
pub struct Kinematics {
    /// Steps per millimetre, indexed by [`Axis::index`].
    pub steps_per_mm: [f32; 3],

    /// Optional per-axis rate limit in mm/min.
    pub max_rate: [Option<f32>; 3],

    /// Direction lines to invert.
    pub invert_mask: DirectionBits,

    /// Acceleration in mm/min².
    pub acceleration: f32,

    /// Junction deviation in mm.
    pub junction_deviation: f32,

    /// Default feed rate in mm/min.
    pub default_feed_rate: f32,

    /// Default seek rate in mm/min.
    pub default_seek_rate: f32,

    /// Step rate floor in steps/min.
    pub min_steps_per_minute: u32,

    /// Ramp adjustments per second.
    pub acceleration_ticks_per_second: u32,

    /// Length of one acceleration tick in nanoseconds.
    pub ns_per_acceleration_tick: u32,

    /// Step pulse width in nanoseconds.
    pub pulse_ns: u32,

    /// Position recovery after cancel or halt.
    pub resume_policy: ResumePolicy,
}

impl Kinematics {
    /// Compute kinematics from a (validated) machine configuration.
    pub fn from_config(config: &MachineConfig) -> Self {
        let mut invert_mask = DirectionBits::NONE;
        let mut steps_per_mm = [0.0; 3];
        let mut max_rate = [None; 3];
        for (axis, axis_config) in config.axes.iter() {
            steps_per_mm[axis.index()] = axis_config.steps_per_mm;
            max_rate[axis.index()] = axis_config.max_rate.map(|r| r.0);
            if axis_config.invert_direction {
                invert_mask.insert(axis);
            }
        }

        let motion = &config.motion;
        let ticks = motion.acceleration_ticks_per_second.max(1);

        Self {
            steps_per_mm,
            max_rate,
            invert_mask,
            acceleration: motion.acceleration.per_minute_squared(),
            junction_deviation: motion.junction_deviation.0,
            default_feed_rate: motion.default_feed_rate.0,
            default_seek_rate: motion.default_seek_rate.0,
            min_steps_per_minute: motion.min_steps_per_minute,
            acceleration_ticks_per_second: ticks,
            ns_per_acceleration_tick: 1_000_000_000 / ticks,
            pulse_ns: motion.pulse_microseconds.saturating_mul(1000),
            resume_policy: motion.resume_policy,
        }
    }

    /// Convert millimetres to fractional steps on an axis.
    #[inline]
    pub fn mm_to_steps(&self, axis: Axis, mm: f32) -> f32 {
        mm * self.steps_per_mm[axis.index()]
    }

    /// Convert steps to millimetres on an axis.
    #[inline]
    pub fn steps_to_mm(&self, axis: Axis, steps: i32) -> f32 {
        steps as f32 / self.steps_per_mm[axis.index()]
    }

    /// Timer period for a step rate, with the rate clamped to the floor.
    #[inline]
    pub fn rate_to_period_ns(&self, steps_per_minute: u32) -> u32 {
        step_period_ns(steps_per_minute, self.min_steps_per_minute)
    }
}

impl Default for Kinematics {
    fn default() -> Self {
        Self::from_config(&MachineConfig::default())
    }
}
