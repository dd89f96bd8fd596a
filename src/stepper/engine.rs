//! Interrupt-side block execution.
//!
//! [`StepperEngine::tick`] is meant to be called from a one-shot timer
//! interrupt: it emits at most one step event and returns the delay until
//! it must run again.

use crate::config::Axis;
use crate::error::Result;
use crate::motion::{MotionPhase, RampExecutor};
use crate::planner::{Block, BlockKind};
use crate::system::MotionCore;

use super::bits::StepBits;
use super::io::{Interlock, StepPort, ToolOutput};
use super::state::{EngineState, StopReason};

/// Timer period while nothing is queued.
pub const IDLE_PERIOD_NS: u32 = 1_000_000;

/// Longest single wait while dwelling.
///
/// Matches the idle period so that a halt during a lasing dwell is seen
/// within one idle tick.
pub const MAX_DWELL_SLICE_NS: u64 = IDLE_PERIOD_NS as u64;

/// Outcome of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick {
    /// Axes that received a pulse.
    pub steps: StepBits,
    /// Delay before the next tick.
    pub period_ns: u32,
}

impl Tick {
    const fn wait(period_ns: u32) -> Self {
        Self {
            steps: StepBits::NONE,
            period_ns,
        }
    }
}

/// Line block being stepped.
#[derive(Debug)]
struct LineRun {
    block: Block,
    ramp: RampExecutor,
    /// Bresenham error terms.
    counters: [i32; 3],
}

impl LineRun {
    fn new(block: Block, ns_per_tick: u32, min_rate: u32) -> Self {
        // Bias by half a step so that minor axes step mid-interval.
        let bias = -((block.step_event_count >> 1) as i32);
        Self {
            ramp: RampExecutor::new(&block, ns_per_tick, min_rate),
            counters: [bias; 3],
            block,
        }
    }

    /// Advance the DDA by one step event.
    fn next_steps(&mut self) -> StepBits {
        let mut steps = StepBits::NONE;
        let event_count = self.block.step_event_count as i32;
        for axis in Axis::ALL {
            let i = axis.index();
            self.counters[i] += self.block.steps(axis) as i32;
            if self.counters[i] > 0 {
                self.counters[i] -= event_count;
                steps.insert(axis);
            }
        }
        steps
    }

    /// Signed position change of a step event.
    fn position_delta(&self, steps: StepBits) -> [i32; 3] {
        let mut delta = [0; 3];
        for axis in Axis::ALL {
            if steps.contains(axis) {
                delta[axis.index()] = self.block.step_delta[axis.index()].signum();
            }
        }
        delta
    }
}

#[derive(Debug)]
enum Running {
    Line(LineRun),
    Dwell { remaining_ns: u64 },
}

/// Consumer side of a [`MotionCore`].
///
/// Generic over:
/// - `P`: step and direction lines
/// - `T`: laser and assist outputs
/// - `L`: safety interlock
pub struct StepperEngine<'a, const N: usize, P, T, L>
where
    P: StepPort,
    T: ToolOutput,
    L: Interlock,
{
    core: &'a MotionCore<N>,
    port: P,
    tool: T,
    interlock: L,
    running: Option<Running>,
    /// Laser level last written.
    intensity: u8,
}

impl<'a, const N: usize, P, T, L> StepperEngine<'a, N, P, T, L>
where
    P: StepPort,
    T: ToolOutput,
    L: Interlock,
{
    pub(crate) fn new(core: &'a MotionCore<N>, port: P, tool: T, interlock: L) -> Self {
        Self {
            core,
            port,
            tool,
            interlock,
            running: None,
            intensity: 0,
        }
    }

    /// Run one timer tick.
    ///
    /// Checks the interlock, loads the next block if none is running, and
    /// emits the next step event. Command blocks are applied and retired
    /// within the same tick.
    ///
    /// # Errors
    ///
    /// Returns an error if a step, direction or tool output fails.
    pub fn tick(&mut self) -> Result<Tick> {
        if let Some(reason) = self.pending_halt() {
            self.halt(reason)?;
            return Ok(Tick::wait(IDLE_PERIOD_NS));
        }

        loop {
            match &mut self.running {
                None => {
                    if !self.load_next()? {
                        self.laser_off()?;
                        return Ok(Tick::wait(IDLE_PERIOD_NS));
                    }
                }
                Some(Running::Line(run)) => {
                    let steps = run.next_steps();
                    let delta = run.position_delta(steps);
                    let more = run.ramp.advance();
                    let period_ns = run.ramp.period_ns();

                    self.port.pulse(steps)?;
                    self.core.with(|shared| {
                        for (position, d) in shared.machine_position.iter_mut().zip(delta) {
                            *position += d;
                        }
                        if !more {
                            shared.retire_head();
                        }
                    });

                    if !more {
                        self.running = None;
                        trace!("line retired");
                    }
                    return Ok(Tick { steps, period_ns });
                }
                Some(Running::Dwell { remaining_ns }) => {
                    if *remaining_ns == 0 {
                        self.retire_head();
                        self.set_intensity(0)?;
                        trace!("dwell retired");
                        continue;
                    }
                    let slice = (*remaining_ns).min(MAX_DWELL_SLICE_NS);
                    *remaining_ns -= slice;
                    return Ok(Tick::wait(slice as u32));
                }
            }
        }
    }

    /// Get what the engine is currently doing.
    pub fn state(&self) -> EngineState {
        match &self.running {
            None => EngineState::Idle,
            Some(Running::Dwell { .. }) => EngineState::Dwelling,
            Some(Running::Line(run)) => match run.ramp.phase() {
                MotionPhase::Accelerating => EngineState::Accelerating,
                MotionPhase::Cruising => EngineState::Cruising,
                MotionPhase::Decelerating => EngineState::Decelerating,
                MotionPhase::Complete => EngineState::Idle,
            },
        }
    }

    /// Get the current step rate in steps/min (0 when not stepping).
    pub fn rate(&self) -> u32 {
        match &self.running {
            Some(Running::Line(run)) => run.ramp.rate(),
            _ => 0,
        }
    }

    /// Get the shared core.
    #[inline]
    pub fn core(&self) -> &'a MotionCore<N> {
        self.core
    }

    /// Get the step port.
    #[inline]
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Get the tool outputs.
    #[inline]
    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Release the hardware.
    pub fn release(self) -> (P, T, L) {
        (self.port, self.tool, self.interlock)
    }

    /// Host stop request, or the interlock while there is motion to stop.
    fn pending_halt(&mut self) -> Option<StopReason> {
        if let Some(reason) = self.core.take_halt_request() {
            return Some(reason);
        }
        if self.running.is_some() || self.core.is_active() {
            self.interlock.poll()
        } else {
            None
        }
    }

    fn halt(&mut self, reason: StopReason) -> Result<()> {
        self.running = None;
        self.core.with(|shared| {
            shared.discard_all();
            if shared.stop.is_none() {
                shared.stop = Some(reason);
            }
            self.core.set_active(false);
        });
        self.tool.all_off()?;
        self.intensity = 0;
        warn!("halted: {}", reason);
        Ok(())
    }

    /// Start the oldest queued block.
    ///
    /// Returns `false` if the buffer is empty.
    fn load_next(&mut self) -> Result<bool> {
        let core = self.core;
        let block = core.with(|shared| {
            if shared.stop.is_some() {
                return None;
            }
            let block = shared.buffer.front().copied();
            match block {
                Some(_) => shared.start_head(),
                None => core.set_active(false),
            }
            block
        });

        let Some(block) = block else {
            return Ok(false);
        };

        let kin = core.kinematics();
        match block.kind {
            BlockKind::Line => {
                self.port.set_directions(block.direction_bits)?;
                self.set_intensity(block.nominal_laser_intensity)?;
                self.running = Some(Running::Line(LineRun::new(
                    block,
                    kin.ns_per_acceleration_tick,
                    kin.min_steps_per_minute,
                )));
            }
            BlockKind::Dwell => {
                self.set_intensity(block.nominal_laser_intensity)?;
                self.running = Some(Running::Dwell {
                    remaining_ns: block.dwell_ns,
                });
            }
            BlockKind::AirEnable => {
                self.tool.set_air(true)?;
                self.retire_head();
            }
            BlockKind::GasEnable => {
                self.tool.set_gas(true)?;
                self.retire_head();
            }
            BlockKind::AirGasDisable => {
                self.tool.set_air(false)?;
                self.tool.set_gas(false)?;
                self.retire_head();
            }
            BlockKind::Cancel => {
                core.with(|shared| {
                    shared.discard_all();
                    core.set_active(false);
                });
                self.tool.all_off()?;
                self.intensity = 0;
                debug!("cancel executed");
            }
        }
        Ok(true)
    }

    fn retire_head(&mut self) {
        self.running = None;
        self.core.with(|shared| shared.retire_head());
    }

    fn set_intensity(&mut self, intensity: u8) -> Result<()> {
        self.tool.set_intensity(intensity)?;
        self.intensity = intensity;
        Ok(())
    }

    fn laser_off(&mut self) -> Result<()> {
        if self.intensity != 0 {
            self.set_intensity(0)?;
        }
        Ok(())
    }
}
