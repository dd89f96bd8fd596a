//! Error types for laser-motion.
//!
//! Provides unified error handling across configuration, planning, and step execution.

use core::fmt;

use crate::stepper::StopReason;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all laser-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Planner rejected a request
    Planner(PlannerError),
    /// Step execution error
    Stepper(StepperError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Steps per millimetre must be finite and > 0
    InvalidStepsPerMm(f32),
    /// Per-axis max rate must be finite and > 0
    InvalidAxisRate(f32),
    /// Acceleration must be finite and > 0
    InvalidAcceleration(f32),
    /// Junction deviation must be finite and >= 0
    InvalidJunctionDeviation(f32),
    /// Default feed rate must be finite and > 0
    InvalidFeedRate(f32),
    /// Default seek rate must be finite and > 0
    InvalidSeekRate(f32),
    /// Minimum step rate must be > 0
    InvalidMinStepRate(u32),
    /// Acceleration tick frequency must be > 0
    InvalidAccelerationTicks(u32),
    /// Step pulse width must be > 0
    InvalidPulseWidth(u32),
    /// A required builder field was not set
    MissingField(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Planner request errors.
///
/// None of these leave a partially queued block behind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlannerError {
    /// Feed or seek rate is zero, negative or not finite
    InvalidFeedRate(f32),
    /// Target coordinate is not finite
    InvalidTarget,
    /// Move produces no step on any axis
    ZeroLengthMove,
    /// Dwell duration is negative or not finite
    InvalidDwell(f32),
    /// `plan_command` was given a motion or dwell kind
    NotACommand,
    /// Operation requires an idle engine and empty buffer
    Busy,
    /// Engine is halted and must be cleared first
    Stopped(StopReason),
}

/// Step execution errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepperError {
    /// Step, direction or tool pin operation failed
    Pin,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Planner(e) => write!(f, "Planner error: {}", e),
            Error::Stepper(e) => write!(f, "Stepper error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidStepsPerMm(v) => {
                write!(f, "Invalid steps per mm: {}. Must be > 0", v)
            }
            ConfigError::InvalidAxisRate(v) => write!(f, "Invalid axis max rate: {}. Must be > 0", v),
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidJunctionDeviation(v) => {
                write!(f, "Invalid junction deviation: {}. Must be >= 0", v)
            }
            ConfigError::InvalidFeedRate(v) => write!(f, "Invalid default feed rate: {}. Must be > 0", v),
            ConfigError::InvalidSeekRate(v) => write!(f, "Invalid default seek rate: {}. Must be > 0", v),
            ConfigError::InvalidMinStepRate(v) => {
                write!(f, "Invalid minimum step rate: {}. Must be > 0", v)
            }
            ConfigError::InvalidAccelerationTicks(v) => {
                write!(f, "Invalid acceleration ticks per second: {}. Must be > 0", v)
            }
            ConfigError::InvalidPulseWidth(v) => write!(f, "Invalid pulse width: {} us. Must be > 0", v),
            ConfigError::MissingField(name) => write!(f, "{} is required", name),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::InvalidFeedRate(v) => write!(f, "Invalid feed rate: {}", v),
            PlannerError::InvalidTarget => write!(f, "Target position is not finite"),
            PlannerError::ZeroLengthMove => write!(f, "Move has no steps on any axis"),
            PlannerError::InvalidDwell(v) => write!(f, "Invalid dwell duration: {} s", v),
            PlannerError::NotACommand => write!(f, "Block kind is not a command"),
            PlannerError::Busy => write!(f, "Motion in progress"),
            PlannerError::Stopped(reason) => write!(f, "Stopped: {}", reason),
        }
    }
}

impl fmt::Display for StepperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepperError::Pin => write!(f, "GPIO pin operation failed"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<PlannerError> for Error {
    fn from(e: PlannerError) -> Self {
        Error::Planner(e)
    }
}

impl From<StepperError> for Error {
    fn from(e: StepperError) -> Self {
        Error::Stepper(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for PlannerError {}

#[cfg(feature = "std")]
impl std::error::Error for StepperError {}
