//! Motion module for laser-motion.
//!
//! Provides trapezoid calculation and per-step ramp execution.

mod executor;
mod profile;

pub use executor::RampExecutor;
pub use profile::{
    calculate_trapezoid, estimate_acceleration_distance, intersection_distance,
    max_allowable_speed, MotionPhase, Trapezoid,
};
