//! Stepper module for laser-motion.
//!
//! Provides the interrupt-side engine, its hardware seams and the machine
//! position type.

mod bits;
mod builder;
mod engine;
mod io;
mod position;
#[cfg(feature = "std")]
pub mod sim;
mod state;

pub use bits::{DirectionBits, StepBits};
pub use builder::PinStepPortBuilder;
pub use engine::{StepperEngine, Tick, IDLE_PERIOD_NS, MAX_DWELL_SLICE_NS};
pub use io::{Interlock, NoInterlock, PinStepPort, PwmTool, SenseInputs, StepPort, ToolOutput};
pub use position::Position;
pub use state::{EngineState, StopReason};
