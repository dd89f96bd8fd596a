//! Unit tests for TOML configuration parsing.

use laser_motion::config::{parse_config, Axis, Kinematics, MachineConfig, ResumePolicy};

/// A full machine description with every key set.
#[test]
fn test_parse_full_machine() {
    let toml_str = r#"
[axes.x]
steps_per_mm = 80.0
max_rate_mm_per_min = 24000.0

[axes.y]
steps_per_mm = 80.0
invert_direction = true

[axes.z]
steps_per_mm = 400.0
max_rate_mm_per_min = 600.0

[motion]
acceleration_mm_per_sec2 = 1200.0
junction_deviation_mm = 0.02
default_feed_rate_mm_per_min = 3000.0
default_seek_rate_mm_per_min = 12000.0
min_steps_per_minute = 2000
acceleration_ticks_per_second = 50
pulse_microseconds = 2
resume_policy = "keep_planned"
"#;

    let config = parse_config(toml_str).expect("Failed to parse TOML");

    assert_eq!(config.axis(Axis::X).steps_per_mm, 80.0);
    assert_eq!(config.axis(Axis::X).max_rate.map(|r| r.0), Some(24000.0));
    assert!(config.axis(Axis::Y).invert_direction);
    assert_eq!(config.axis(Axis::Z).steps_per_mm, 400.0);
    assert_eq!(config.motion.acceleration.0, 1200.0);
    assert_eq!(config.motion.junction_deviation.0, 0.02);
    assert_eq!(config.motion.default_feed_rate.0, 3000.0);
    assert_eq!(config.motion.default_seek_rate.0, 12000.0);
    assert_eq!(config.motion.min_steps_per_minute, 2000);
    assert_eq!(config.motion.acceleration_ticks_per_second, 50);
    assert_eq!(config.motion.pulse_microseconds, 2);
    assert_eq!(config.motion.resume_policy, ResumePolicy::KeepPlanned);
}

/// Derived kinematics follow the parsed values.
#[test]
fn test_kinematics_from_parsed_config() {
    let toml_str = r#"
[axes.y]
invert_direction = true

[motion]
acceleration_mm_per_sec2 = 100.0
acceleration_ticks_per_second = 50
pulse_microseconds = 10
"#;

    let config = parse_config(toml_str).expect("Failed to parse TOML");
    let kin = Kinematics::from_config(&config);

    // 100 mm/s² = 360 000 mm/min²
    assert!((kin.acceleration - 360_000.0).abs() < 0.5);
    assert_eq!(kin.ns_per_acceleration_tick, 20_000_000);
    assert_eq!(kin.pulse_ns, 10_000);
    assert_eq!(kin.invert_mask.bits(), 0b010);
}

/// Missing sections fall back to the stock machine.
#[test]
fn test_partial_config_uses_defaults() {
    let config = parse_config("[axes.x]\nsteps_per_mm = 50.0\n").expect("Failed to parse TOML");
    let defaults = MachineConfig::default();

    assert_eq!(config.axis(Axis::X).steps_per_mm, 50.0);
    assert_eq!(config.axes.y, defaults.axes.y);
    assert_eq!(config.motion, defaults.motion);
}

/// Unknown resume policies are rejected by the parser.
#[test]
fn test_unknown_resume_policy() {
    assert!(parse_config("[motion]\nresume_policy = \"rewind\"\n").is_err());
}
