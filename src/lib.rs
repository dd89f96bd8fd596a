//! # laser-motion
//!
//! Look-ahead motion planner and interrupt-driven step generator for CNC and
//! laser cutters, with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Look-ahead planning**: Junction speeds re-planned over the whole block buffer
//! - **Trapezoidal ramps**: Computed in step-rate space, walked per step event
//! - **Bresenham stepping**: Three axes from one variable-period timer interrupt
//! - **Laser and assist control**: Intensity, air and gas switched at block boundaries
//! - **Interlocks**: Power, chiller, door and limit inputs halt and flush motion
//! - **no_std compatible**: Shared state behind `critical-section`, no allocation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use laser_motion::{MotionCore, NoInterlock};
//!
//! let config = laser_motion::load_config("machine.toml")?;
//! let core: MotionCore = MotionCore::from_config(&config)?;
//!
//! // Timer interrupt side
//! let mut engine = core.engine(step_port, tool, sense_inputs);
//!
//! // Foreground side
//! let mut planner = core.planner();
//! planner.plan_seek(10.0, 10.0, 0.0)?;
//! planner.plan_line(60.0, 10.0, 0.0, 3000.0, 200)?;
//! planner.synchronize()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O, TOML parsing and the host simulator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod error;
pub mod motion;
pub mod planner;
pub mod stepper;
pub mod system;

// Re-exports for ergonomic API
pub use config::{validate_config, Axis, Kinematics, MachineConfig, ResumePolicy};
pub use error::{Error, Result};
pub use motion::{MotionPhase, Trapezoid};
pub use planner::{Block, BlockKind, Planner};
pub use stepper::{
    EngineState, Interlock, NoInterlock, Position, StepPort, StepperEngine, StopReason, Tick,
    ToolOutput,
};
pub use system::{IdleStrategy, MotionCore, Spin, DEFAULT_BUFFER_SIZE};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Millimeters, MmPerMin, MmPerSecSquared, Steps};
