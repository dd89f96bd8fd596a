//! Ramp execution: walks a block's trapezoid one step event at a time.

use crate::config::step_period_ns;
use crate::planner::Block;

use super::profile::{MotionPhase, Trapezoid};

/// Runtime ramp state of the block being stepped.
#[derive(Debug, Clone)]
pub struct RampExecutor {
    /// Ramp being executed.
    trapezoid: Trapezoid,

    /// Step events in the block.
    step_event_count: u32,

    /// Cruise rate.
    nominal_rate: u32,

    /// Rate change per acceleration tick.
    rate_delta: u32,

    /// Step events emitted so far.
    current_step: u32,

    /// Current step rate in steps/min.
    rate: u32,

    /// Nanoseconds accumulated toward the next acceleration tick.
    tick_counter_ns: u32,

    /// Length of one acceleration tick.
    ns_per_tick: u32,

    /// Rate floor for period conversion.
    min_rate: u32,

    /// Current phase of motion.
    phase: MotionPhase,
}

impl RampExecutor {
    /// Create an executor positioned at the first step event of `block`.
    pub fn new(block: &Block, ns_per_tick: u32, min_rate: u32) -> Self {
        let trapezoid = Trapezoid {
            initial_rate: block.initial_rate,
            final_rate: block.final_rate,
            accelerate_until: block.accelerate_until,
            decelerate_after: block.decelerate_after,
        };
        let phase = trapezoid.phase_at(0, block.step_event_count);

        Self {
            trapezoid,
            step_event_count: block.step_event_count,
            nominal_rate: block.nominal_rate,
            rate_delta: block.rate_delta,
            current_step: 0,
            rate: block.initial_rate,
            // Midpoint rule: first rate change half a tick in.
            tick_counter_ns: ns_per_tick / 2,
            ns_per_tick,
            min_rate,
            phase,
        }
    }

    /// Check if every step event has been emitted.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.phase == MotionPhase::Complete
    }

    /// Get the number of step events emitted.
    #[inline]
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// Get step events remaining.
    #[inline]
    pub fn steps_remaining(&self) -> u32 {
        self.step_event_count.saturating_sub(self.current_step)
    }

    /// Get the current phase.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// Get the current step rate in steps/min.
    #[inline]
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Get the timer period for the current rate.
    #[inline]
    pub fn period_ns(&self) -> u32 {
        step_period_ns(self.rate, self.min_rate)
    }

    /// Record one emitted step event and update the rate for the next one.
    ///
    /// Returns `false` once the block is complete.
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }

        let elapsed_ns = self.period_ns();
        self.current_step += 1;

        if self.current_step >= self.step_event_count {
            self.phase = MotionPhase::Complete;
            return false;
        }

        let step = self.current_step;
        if step < self.trapezoid.accelerate_until {
            if self.acceleration_tick(elapsed_ns) {
                self.rate = self.rate.saturating_add(self.rate_delta).min(self.nominal_rate);
            }
        } else if step >= self.trapezoid.decelerate_after {
            if step == self.trapezoid.decelerate_after {
                self.tick_counter_ns = self.ns_per_tick / 2;
            } else if self.acceleration_tick(elapsed_ns) {
                self.rate = self
                    .rate
                    .saturating_sub(self.rate_delta)
                    .max(self.trapezoid.final_rate);
            }
        } else {
            self.rate = self.nominal_rate;
        }

        self.phase = self.trapezoid.phase_at(step, self.step_event_count);
        true
    }

    fn acceleration_tick(&mut self, elapsed_ns: u32) -> bool {
        self.tick_counter_ns = self.tick_counter_ns.saturating_add(elapsed_ns);
        if self.tick_counter_ns > self.ns_per_tick {
            self.tick_counter_ns -= self.ns_per_tick;
            true
        } else {
            false
        }
    }
}
