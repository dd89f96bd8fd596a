//! Off-target simulation: a virtual timer plus recording outputs.
//!
//! Lets the engine run on the host with exact timing, e.g.
//!
//! ```rust,ignore
//! let mut engine = core.engine(RecordingStepPort::new(), RecordingTool::new(), NoInterlock);
//! let mut clock = SimClock::new();
//! clock.run_until_idle(&mut engine, 1_000_000)?;
//! ```

use crate::config::Axis;
use crate::error::{Result, StepperError};

use super::bits::{DirectionBits, StepBits};
use super::engine::{StepperEngine, Tick};
use super::io::{Interlock, StepPort, ToolOutput};

/// Virtual one-shot timer driving an engine.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_ns: u64,
    ticks: u64,
}

impl SimClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the simulated time in nanoseconds.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// Get the number of ticks run.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fire one tick at the current time, then advance by its period.
    ///
    /// Returns the time the tick fired at together with its outcome.
    pub fn tick<const N: usize, P, T, L>(
        &mut self,
        engine: &mut StepperEngine<'_, N, P, T, L>,
    ) -> Result<(u64, Tick)>
    where
        P: StepPort,
        T: ToolOutput,
        L: Interlock,
    {
        let fired_at = self.now_ns;
        let tick = engine.tick()?;
        self.now_ns += tick.period_ns as u64;
        self.ticks += 1;
        Ok((fired_at, tick))
    }

    /// Tick until nothing is queued or running, at most `max_ticks` times.
    ///
    /// Returns the number of ticks run.
    pub fn run_until_idle<const N: usize, P, T, L>(
        &mut self,
        engine: &mut StepperEngine<'_, N, P, T, L>,
        max_ticks: u64,
    ) -> Result<u64>
    where
        P: StepPort,
        T: ToolOutput,
        L: Interlock,
    {
        let start = self.ticks;
        while self.ticks - start < max_ticks {
            self.tick(engine)?;
            if engine.core().queued_blocks() == 0 {
                break;
            }
        }
        Ok(self.ticks - start)
    }
}

/// [`StepPort`] that counts pulses.
///
/// Position assumes no direction inversion: a set direction bit means the
/// axis moves toward negative.
#[derive(Debug, Clone, Default)]
pub struct RecordingStepPort {
    directions: DirectionBits,
    /// Net steps per axis.
    pub position: [i64; 3],
    /// Total pulses per axis.
    pub pulses: [u64; 3],
    /// Every non-empty pulse, in order.
    pub events: Vec<StepBits>,
    /// Every direction change, in order.
    pub direction_changes: Vec<DirectionBits>,
}

impl RecordingStepPort {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepPort for RecordingStepPort {
    fn set_directions(&mut self, directions: DirectionBits) -> core::result::Result<(), StepperError> {
        self.directions = directions;
        self.direction_changes.push(directions);
        Ok(())
    }

    fn pulse(&mut self, steps: StepBits) -> core::result::Result<(), StepperError> {
        if steps.is_empty() {
            return Ok(());
        }
        for axis in Axis::ALL {
            if steps.contains(axis) {
                let i = axis.index();
                self.pulses[i] += 1;
                self.position[i] += if self.directions.contains(axis) { -1 } else { 1 };
            }
        }
        self.events.push(steps);
        Ok(())
    }
}

/// One tool output change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEvent {
    /// Laser intensity written.
    Intensity(u8),
    /// Air assist switched.
    Air(bool),
    /// Gas assist switched.
    Gas(bool),
}

/// [`ToolOutput`] that records every change.
#[derive(Debug, Clone, Default)]
pub struct RecordingTool {
    /// Current laser intensity.
    pub intensity: u8,
    /// Current air state.
    pub air: bool,
    /// Current gas state.
    pub gas: bool,
    /// Every write, in order.
    pub events: Vec<ToolEvent>,
}

impl RecordingTool {
    /// Create an all-off recorder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToolOutput for RecordingTool {
    fn set_intensity(&mut self, intensity: u8) -> core::result::Result<(), StepperError> {
        self.intensity = intensity;
        self.events.push(ToolEvent::Intensity(intensity));
        Ok(())
    }

    fn set_air(&mut self, on: bool) -> core::result::Result<(), StepperError> {
        self.air = on;
        self.events.push(ToolEvent::Air(on));
        Ok(())
    }

    fn set_gas(&mut self, on: bool) -> core::result::Result<(), StepperError> {
        self.gas = on;
        self.events.push(ToolEvent::Gas(on));
        Ok(())
    }
}
