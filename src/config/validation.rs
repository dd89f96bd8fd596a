//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::axis::AxisConfig;
use super::machine::MotionSettings;
use super::MachineConfig;

/// Validate a machine configuration.
///
/// Checks:
/// - Axis resolutions are positive and finite
/// - Optional axis rate limits are positive
/// - Acceleration, feed and seek rates are positive; junction deviation is not negative
/// - Step rate floor, acceleration tick frequency and pulse width are non-zero
pub fn validate_config(config: &MachineConfig) -> Result<()> {
    for (_, axis) in config.axes.iter() {
        validate_axis(axis)?;
    }

    validate_motion(&config.motion)
}

fn validate_axis(axis: &AxisConfig) -> Result<()> {
    if !(axis.steps_per_mm.is_finite() && axis.steps_per_mm > 0.0) {
        return Err(Error::Config(ConfigError::InvalidStepsPerMm(axis.steps_per_mm)));
    }

    if let Some(rate) = axis.max_rate {
        if !(rate.0.is_finite() && rate.0 > 0.0) {
            return Err(Error::Config(ConfigError::InvalidAxisRate(rate.0)));
        }
    }

    Ok(())
}

fn validate_motion(motion: &MotionSettings) -> Result<()> {
    let acceleration = motion.acceleration.0;
    if !(acceleration.is_finite() && acceleration > 0.0) {
        return Err(Error::Config(ConfigError::InvalidAcceleration(acceleration)));
    }

    let deviation = motion.junction_deviation.0;
    if !(deviation.is_finite() && deviation >= 0.0) {
        return Err(Error::Config(ConfigError::InvalidJunctionDeviation(deviation)));
    }

    let feed = motion.default_feed_rate.0;
    if !(feed.is_finite() && feed > 0.0) {
        return Err(Error::Config(ConfigError::InvalidFeedRate(feed)));
    }

    let seek = motion.default_seek_rate.0;
    if !(seek.is_finite() && seek > 0.0) {
        return Err(Error::Config(ConfigError::InvalidSeekRate(seek)));
    }

    if motion.min_steps_per_minute == 0 {
        return Err(Error::Config(ConfigError::InvalidMinStepRate(0)));
    }

    if motion.acceleration_ticks_per_second == 0 {
        return Err(Error::Config(ConfigError::InvalidAccelerationTicks(0)));
    }

    if motion.pulse_microseconds == 0 {
        return Err(Error::Config(ConfigError::InvalidPulseWidth(0)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::{MmPerMin, MmPerSecSquared};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&MachineConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_steps_per_mm() {
        let mut config = MachineConfig::default();
        config.axes.x.steps_per_mm = -1.0; // Invalid!

        let result = validate_config(&config);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidStepsPerMm(_)))
        ));
    }

    #[test]
    fn test_invalid_axis_rate() {
        let mut config = MachineConfig::default();
        config.axes.z.max_rate = Some(MmPerMin(0.0));
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidAxisRate(_)))
        ));
    }

    #[test]
    fn test_invalid_acceleration() {
        let mut config = MachineConfig::default();
        config.motion.acceleration = MmPerSecSquared(f32::NAN);
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidAcceleration(_)))
        ));
    }

    #[test]
    fn test_zero_junction_deviation_allowed() {
        let mut config = MachineConfig::default();
        config.motion.junction_deviation.0 = 0.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let mut config = MachineConfig::default();
        config.motion.acceleration_ticks_per_second = 0;
        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidAccelerationTicks(0)))
        );
    }
}
