//! Configuration module for laser-motion.
//!
//! Provides types for loading and validating machine configuration
//! from TOML files (with `std` feature) or pre-built values.

mod axis;
mod kinematics;
mod machine;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use axis::{AxesConfig, Axis, AxisConfig, DEFAULT_STEPS_PER_MM};
pub use kinematics::{step_period_ns, Kinematics, NS_PER_MINUTE};
pub use machine::{MachineConfig, MotionSettings, ResumePolicy};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Millimeters, MmPerMin, MmPerSecSquared, Steps};
