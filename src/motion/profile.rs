//! Trapezoid generation.
//!
//! Ramps are planned in step-rate space (step events per minute) because the
//! engine only ever counts discrete step events, never continuous time.

use libm::{ceilf, floorf, sqrtf};

use crate::config::Kinematics;
use crate::planner::Block;

/// Current phase of a block's velocity profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Rate rising toward `nominal_rate`.
    Accelerating,
    /// Holding `nominal_rate`.
    Cruising,
    /// Rate falling toward `final_rate`.
    Decelerating,
    /// All step events emitted.
    Complete,
}

/// Ramp schedule of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Trapezoid {
    /// Step rate at the first step event.
    pub initial_rate: u32,
    /// Step rate at the last step event.
    pub final_rate: u32,
    /// Step event at which acceleration stops.
    pub accelerate_until: u32,
    /// Step event at which deceleration starts.
    pub decelerate_after: u32,
}

impl Trapezoid {
    /// Get the number of step events spent at nominal rate.
    #[inline]
    pub fn plateau_steps(&self) -> u32 {
        self.decelerate_after - self.accelerate_until
    }

    /// Get the phase a step event falls into.
    pub fn phase_at(&self, step: u32, step_event_count: u32) -> MotionPhase {
        if step >= step_event_count {
            MotionPhase::Complete
        } else if step < self.accelerate_until {
            MotionPhase::Accelerating
        } else if step < self.decelerate_after {
            MotionPhase::Cruising
        } else {
            MotionPhase::Decelerating
        }
    }

    /// Write the schedule into the ramp fields of `block`.
    pub fn apply(&self, block: &mut Block) {
        block.initial_rate = self.initial_rate;
        block.final_rate = self.final_rate;
        block.accelerate_until = self.accelerate_until;
        block.decelerate_after = self.decelerate_after;
    }
}

/// Distance (in steps or mm, matching the inputs) needed to go from
/// `initial_rate` to `target_rate` at constant `acceleration`.
///
/// A negative `acceleration` gives the distance of a deceleration.
#[inline]
pub fn estimate_acceleration_distance(initial_rate: f32, target_rate: f32, acceleration: f32) -> f32 {
    (target_rate * target_rate - initial_rate * initial_rate) / (2.0 * acceleration)
}

/// Point at which to stop accelerating and start decelerating so that a move
/// of `distance` starting at `initial_rate` ends at `final_rate`.
///
/// Used when the block is too short to reach its nominal rate.
#[inline]
pub fn intersection_distance(
    initial_rate: f32,
    final_rate: f32,
    acceleration: f32,
    distance: f32,
) -> f32 {
    (2.0 * acceleration * distance - initial_rate * initial_rate + final_rate * final_rate)
        / (4.0 * acceleration)
}

/// Highest speed from which `target_velocity` can still be reached by
/// decelerating at `deceleration` over `distance`.
#[inline]
pub fn max_allowable_speed(deceleration: f32, target_velocity: f32, distance: f32) -> f32 {
    sqrtf(target_velocity * target_velocity + 2.0 * deceleration * distance)
}

/// Compute the ramp of a LINE block.
///
/// `entry_factor` and `exit_factor` are the entry and exit speeds expressed
/// as a fraction of the block's nominal speed.
pub fn calculate_trapezoid(
    block: &Block,
    entry_factor: f32,
    exit_factor: f32,
    kinematics: &Kinematics,
) -> Trapezoid {
    let nominal_rate = block.nominal_rate;
    let step_events = block.step_event_count;

    let initial_rate = scaled_rate(nominal_rate, entry_factor);
    let final_rate = scaled_rate(nominal_rate, exit_factor);

    let acceleration_per_minute =
        block.rate_delta as f32 * kinematics.acceleration_ticks_per_second as f32 * 60.0;

    if step_events == 0 || acceleration_per_minute <= 0.0 {
        return Trapezoid {
            initial_rate,
            final_rate,
            accelerate_until: 0,
            decelerate_after: step_events,
        };
    }

    let nominal = nominal_rate as f32;
    let initial = initial_rate as f32;
    let exit = final_rate as f32;

    let mut accelerate_steps =
        ceilf(estimate_acceleration_distance(initial, nominal, acceleration_per_minute)) as i64;
    let decelerate_steps =
        floorf(estimate_acceleration_distance(nominal, exit, -acceleration_per_minute)) as i64;
    let mut plateau_steps = step_events as i64 - accelerate_steps - decelerate_steps;

    // Nominal rate is never reached: meet the deceleration ramp half way.
    if plateau_steps < 0 {
        accelerate_steps = ceilf(intersection_distance(
            initial,
            exit,
            acceleration_per_minute,
            step_events as f32,
        )) as i64;
        accelerate_steps = accelerate_steps.clamp(0, step_events as i64);
        plateau_steps = 0;
    }

    let accelerate_until = accelerate_steps as u32;
    let decelerate_after = (accelerate_steps + plateau_steps).min(step_events as i64) as u32;

    Trapezoid {
        initial_rate,
        final_rate,
        accelerate_until,
        decelerate_after,
    }
}

fn scaled_rate(nominal_rate: u32, factor: f32) -> u32 {
    let factor = if factor.is_finite() { factor.clamp(0.0, 1.0) } else { 0.0 };
    (ceilf(nominal_rate as f32 * factor) as u32).min(nominal_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::BlockKind;
    use proptest::prelude::*;

    fn line(step_events: u32, nominal_rate: u32, rate_delta: u32) -> Block {
        let mut block = Block::command(BlockKind::Line);
        block.step_delta = [step_events as i32, 0, 0];
        block.step_event_count = step_events;
        block.nominal_rate = nominal_rate;
        block.rate_delta = rate_delta;
        block
    }

    #[test]
    fn test_full_trapezoid() {
        // 600 * 100 ticks/s * 60 = 3.6e6 steps/min², 500 steps to reach 60000
        let kin = Kinematics::default();
        let ramp = calculate_trapezoid(&line(2000, 60_000, 600), 0.0, 0.0, &kin);

        assert_eq!(ramp.initial_rate, 0);
        assert_eq!(ramp.final_rate, 0);
        assert_eq!(ramp.accelerate_until, 500);
        assert_eq!(ramp.decelerate_after, 1500);
        assert_eq!(ramp.plateau_steps(), 1000);
    }

    #[test]
    fn test_triangle_profile() {
        let kin = Kinematics::default();
        let ramp = calculate_trapezoid(&line(400, 60_000, 600), 0.0, 0.0, &kin);

        assert_eq!(ramp.plateau_steps(), 0);
        assert_eq!(ramp.accelerate_until, 200);
        assert_eq!(ramp.decelerate_after, 200);
    }

    #[test]
    fn test_entry_speed_shortens_acceleration() {
        let kin = Kinematics::default();
        let ramp = calculate_trapezoid(&line(2000, 60_000, 600), 0.5, 1.0, &kin);

        assert_eq!(ramp.initial_rate, 30_000);
        assert_eq!(ramp.final_rate, 60_000);
        assert_eq!(ramp.accelerate_until, 375);
        assert_eq!(ramp.decelerate_after, 2000);
    }

    #[test]
    fn test_phase_at() {
        let ramp = Trapezoid {
            initial_rate: 0,
            final_rate: 0,
            accelerate_until: 10,
            decelerate_after: 20,
        };
        assert_eq!(ramp.phase_at(0, 30), MotionPhase::Accelerating);
        assert_eq!(ramp.phase_at(10, 30), MotionPhase::Cruising);
        assert_eq!(ramp.phase_at(20, 30), MotionPhase::Decelerating);
        assert_eq!(ramp.phase_at(30, 30), MotionPhase::Complete);
    }

    #[test]
    fn test_max_allowable_speed() {
        // From rest over 1 mm at 1.8e6 mm/min²
        let v = max_allowable_speed(1_800_000.0, 0.0, 1.0);
        assert!((v - 1897.37).abs() < 0.1);
        assert_eq!(max_allowable_speed(1_800_000.0, 100.0, 0.0), 100.0);
    }

    proptest! {
        #[test]
        fn prop_ramp_is_ordered(
            step_events in 1u32..50_000,
            nominal_rate in 1u32..400_000,
            rate_delta in 1u32..20_000,
            entry in 0.0f32..=1.0,
            exit in 0.0f32..=1.0,
        ) {
            let kin = Kinematics::default();
            let block = line(step_events, nominal_rate, rate_delta);
            let ramp = calculate_trapezoid(&block, entry, exit, &kin);

            prop_assert!(ramp.initial_rate <= nominal_rate);
            prop_assert!(ramp.final_rate <= nominal_rate);
            prop_assert!(ramp.accelerate_until <= ramp.decelerate_after);
            prop_assert!(ramp.decelerate_after <= step_events);
        }
    }
}
