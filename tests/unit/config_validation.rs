//! Unit tests for configuration validation.

use laser_motion::config::{validate_config, MachineConfig, MmPerMin};
use laser_motion::error::{ConfigError, Error};

/// Test validation of the stock configuration.
#[test]
fn test_default_config_passes_validation() {
    assert!(validate_config(&MachineConfig::default()).is_ok());
}

/// Test validation fails for a zero axis resolution.
#[test]
fn test_zero_steps_per_mm() {
    let mut config = MachineConfig::default();
    config.axes.z.steps_per_mm = 0.0;

    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidStepsPerMm(_)))
    ));
}

/// Test validation fails for a NaN resolution.
#[test]
fn test_nan_steps_per_mm() {
    let config = MachineConfig::default().with_steps_per_mm(f32::NAN);

    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidStepsPerMm(_)))
    ));
}

/// Test validation fails for a negative axis rate limit.
#[test]
fn test_negative_axis_rate() {
    let mut config = MachineConfig::default();
    config.axes.x.max_rate = Some(MmPerMin(-1.0));

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidAxisRate(-1.0)))
    );
}

/// A zero junction deviation is allowed and means exact stop at corners.
#[test]
fn test_zero_junction_deviation_is_valid() {
    let mut config = MachineConfig::default();
    config.motion.junction_deviation.0 = 0.0;
    assert!(validate_config(&config).is_ok());

    config.motion.junction_deviation.0 = -0.1;
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidJunctionDeviation(_)))
    ));
}

/// Test validation of the integer motion settings.
#[test]
fn test_zero_integer_settings() {
    let mut config = MachineConfig::default();
    config.motion.acceleration_ticks_per_second = 0;
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidAccelerationTicks(0)))
    );

    let mut config = MachineConfig::default();
    config.motion.pulse_microseconds = 0;
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidPulseWidth(0)))
    );
}

/// Test validation fails for zero feed and seek rates.
#[test]
fn test_zero_default_rates() {
    let mut config = MachineConfig::default();
    config.motion.default_feed_rate = MmPerMin(0.0);
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidFeedRate(_)))
    ));

    let mut config = MachineConfig::default();
    config.motion.default_seek_rate = MmPerMin(0.0);
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidSeekRate(_)))
    ));
}

/// Error messages are human readable.
#[test]
fn test_error_display() {
    let err = Error::Config(ConfigError::InvalidMinStepRate(0));
    assert_eq!(
        err.to_string(),
        "Configuration error: Invalid minimum step rate: 0. Must be > 0"
    );
}
