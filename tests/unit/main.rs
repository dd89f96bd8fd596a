//! Unit test harness for laser-motion.
//!
//! Exercises the public configuration API the way a firmware image or host
//! tool would use it.

mod config_parsing;
mod config_validation;
