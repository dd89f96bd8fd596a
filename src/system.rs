//! Shared motion context.
//!
//! [`MotionCore`] owns everything the foreground planner and the timer
//! interrupt both touch: the block buffer, the machine step counters and the
//! stop latch. Both sides reach it through short critical sections; two
//! atomic flags let the interrupt check for work without taking one.

use core::cell::RefCell;

use critical_section::Mutex;
use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use crate::config::{validate_config, Kinematics, MachineConfig};
use crate::error::Result;
use crate::planner::{Block, BlockBuffer, Planner};
use crate::stepper::{Interlock, Position, StepPort, StepperEngine, StopReason, ToolOutput};

/// Block buffer capacity used when none is given.
pub const DEFAULT_BUFFER_SIZE: usize = 16;

/// How a producer waits while the buffer is full or draining.
pub trait IdleStrategy {
    /// Called once per wait iteration.
    fn idle(&mut self);
}

/// Busy-wait with a spin-loop hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spin;

impl IdleStrategy for Spin {
    #[inline]
    fn idle(&mut self) {
        core::hint::spin_loop();
    }
}

impl<F: FnMut()> IdleStrategy for F {
    #[inline]
    fn idle(&mut self) {
        self()
    }
}

/// State guarded by the critical-section mutex.
#[derive(Debug)]
pub(crate) struct Shared<const N: usize> {
    /// Queued blocks; the running block stays at index 0 until it retires.
    pub buffer: BlockBuffer<N>,
    /// The engine has started the block at index 0.
    pub head_busy: bool,
    /// Step counters, updated on every pulse.
    pub machine_position: [i32; 3],
    /// Latched halt.
    pub stop: Option<StopReason>,
    /// A cancel or halt discarded planned motion.
    pub position_stale: bool,
    /// Bumped whenever the engine changes the buffer or starts its head.
    pub epoch: u32,
}

impl<const N: usize> Shared<N> {
    const fn new() -> Self {
        Self {
            buffer: BlockBuffer::new(),
            head_busy: false,
            machine_position: [0; 3],
            stop: None,
            position_stale: false,
            epoch: 0,
        }
    }

    /// Mark the oldest block as started.
    pub fn start_head(&mut self) {
        self.head_busy = true;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Remove the oldest block once it has run.
    pub fn retire_head(&mut self) {
        self.buffer.pop_front();
        self.head_busy = false;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Drop every block, including a running one.
    pub fn discard_all(&mut self) {
        self.buffer.clear();
        self.head_busy = false;
        self.position_stale = true;
        self.epoch = self.epoch.wrapping_add(1);
    }
}

/// Motion context shared by one [`Planner`] and one [`StepperEngine`].
///
/// `N` is the block buffer capacity.
///
/// # Example
///
/// ```rust,ignore
/// use laser_motion::{MachineConfig, MotionCore};
///
/// let core: MotionCore = MotionCore::from_config(&MachineConfig::default())?;
/// let mut planner = core.planner();
/// let mut engine = core.engine(step_port, tool, sense_inputs);
///
/// // timer interrupt
/// let tick = engine.tick()?;
/// timer.schedule_ns(tick.period_ns);
/// ```
pub struct MotionCore<const N: usize = DEFAULT_BUFFER_SIZE> {
    kinematics: Kinematics,
    shared: Mutex<RefCell<Shared<N>>>,
    /// Buffer non-empty or a block loaded.
    active: AtomicBool,
    /// Pending host stop, as a [`StopReason::code`]; 0 when none.
    halt_request: AtomicU8,
}

impl<const N: usize> MotionCore<N> {
    /// Create a core from precomputed kinematics.
    pub fn new(kinematics: Kinematics) -> Self {
        Self {
            kinematics,
            shared: Mutex::new(RefCell::new(Shared::new())),
            active: AtomicBool::new(false),
            halt_request: AtomicU8::new(0),
        }
    }

    /// Validate a machine configuration and create a core from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn from_config(config: &MachineConfig) -> Result<Self> {
        validate_config(config)?;
        Ok(Self::new(Kinematics::from_config(config)))
    }

    /// Get the kinematics.
    #[inline]
    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Create the planner handle, busy-waiting when blocked.
    pub fn planner(&self) -> Planner<'_, N> {
        Planner::new(self, Spin)
    }

    /// Create the planner handle with a custom wait strategy.
    pub fn planner_with_idle<I: IdleStrategy>(&self, idle: I) -> Planner<'_, N, I> {
        Planner::new(self, idle)
    }

    /// Create the engine handle for the timer interrupt.
    pub fn engine<P, T, L>(&self, port: P, tool: T, interlock: L) -> StepperEngine<'_, N, P, T, L>
    where
        P: StepPort,
        T: ToolOutput,
        L: Interlock,
    {
        StepperEngine::new(self, port, tool, interlock)
    }

    /// Ask the engine to halt on its next tick.
    ///
    /// Safe to call from any context.
    pub fn request_stop(&self, reason: StopReason) {
        self.halt_request.store(reason.code(), Ordering::Release);
    }

    /// Get the latched stop reason, if any.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.with(|shared| shared.stop)
    }

    /// Check if motion is queued or running.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Get the number of queued blocks, including a running one.
    pub fn queued_blocks(&self) -> usize {
        self.with(|shared| shared.buffer.len())
    }

    /// Get a copy of the queued block at `index` (0 = oldest).
    pub fn block(&self, index: usize) -> Option<Block> {
        self.with(|shared| shared.buffer.get(index).copied())
    }

    /// Get the machine step counters.
    pub fn machine_steps(&self) -> [i32; 3] {
        self.with(|shared| shared.machine_position)
    }

    /// Get the machine position in millimetres.
    pub fn machine_position(&self) -> Position {
        Position::from_steps(self.machine_steps(), &self.kinematics)
    }

    /// Run `f` on the shared state inside a critical section.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut Shared<N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.shared.borrow_ref_mut(cs)))
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub(crate) fn take_halt_request(&self) -> Option<StopReason> {
        StopReason::from_code(self.halt_request.swap(0, Ordering::AcqRel))
    }

    pub(crate) fn clear_halt_request(&self) {
        self.halt_request.store(0, Ordering::Release);
    }
}

impl<const N: usize> Default for MotionCore<N> {
    fn default() -> Self {
        Self::new(Kinematics::default())
    }
}
