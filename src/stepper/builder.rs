//! Builder pattern for PinStepPort.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{Axis, Kinematics};
use crate::error::{ConfigError, Error, Result};

use super::io::PinStepPort;

/// Default pulse width when none is configured.
const DEFAULT_PULSE_NS: u32 = 5_000;

/// Builder for creating [`PinStepPort`] instances.
///
/// # Example
///
/// ```rust,ignore
/// let port = PinStepPortBuilder::new()
///     .step_pin(Axis::X, x_step)
///     .dir_pin(Axis::X, x_dir)
///     // ... Y and Z
///     .delay(delay)
///     .from_kinematics(core.kinematics())
///     .build()?;
/// ```
pub struct PinStepPortBuilder<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    step_pins: [Option<STEP>; 3],
    dir_pins: [Option<DIR>; 3],
    delay: Option<DELAY>,
    pulse_ns: u32,
}

impl<STEP, DIR, DELAY> Default for PinStepPortBuilder<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<STEP, DIR, DELAY> PinStepPortBuilder<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            step_pins: [None, None, None],
            dir_pins: [None, None, None],
            delay: None,
            pulse_ns: DEFAULT_PULSE_NS,
        }
    }

    /// Set the STEP pin of an axis.
    pub fn step_pin(mut self, axis: Axis, pin: STEP) -> Self {
        self.step_pins[axis.index()] = Some(pin);
        self
    }

    /// Set the DIR pin of an axis.
    pub fn dir_pin(mut self, axis: Axis, pin: DIR) -> Self {
        self.dir_pins[axis.index()] = Some(pin);
        self
    }

    /// Set the delay provider used for pulse width.
    pub fn delay(mut self, delay: DELAY) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the pulse width in nanoseconds.
    pub fn pulse_ns(mut self, pulse_ns: u32) -> Self {
        self.pulse_ns = pulse_ns;
        self
    }

    /// Take the pulse width from machine kinematics.
    pub fn from_kinematics(mut self, kinematics: &Kinematics) -> Self {
        self.pulse_ns = kinematics.pulse_ns;
        self
    }

    /// Build the port.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin or the delay is missing.
    pub fn build(self) -> Result<PinStepPort<STEP, DIR, DELAY>> {
        let step_pins = all_axes(self.step_pins, ["x step pin", "y step pin", "z step pin"])?;
        let dir_pins = all_axes(self.dir_pins, ["x dir pin", "y dir pin", "z dir pin"])?;
        let delay = self.delay.ok_or(Error::Config(ConfigError::MissingField("delay")))?;

        Ok(PinStepPort::new(step_pins, dir_pins, delay, self.pulse_ns))
    }
}

fn all_axes<P>(pins: [Option<P>; 3], names: [&'static str; 3]) -> Result<[P; 3]> {
    match pins {
        [Some(x), Some(y), Some(z)] => Ok([x, y, z]),
        [None, _, _] => Err(Error::Config(ConfigError::MissingField(names[0]))),
        [_, None, _] => Err(Error::Config(ConfigError::MissingField(names[1]))),
        _ => Err(Error::Config(ConfigError::MissingField(names[2]))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::Mock as PinMock;

    fn pin() -> PinMock {
        PinMock::new(&[])
    }

    #[test]
    fn test_build_complete() {
        let kin = Kinematics::default();
        let port = PinStepPortBuilder::new()
            .step_pin(Axis::X, pin())
            .step_pin(Axis::Y, pin())
            .step_pin(Axis::Z, pin())
            .dir_pin(Axis::X, pin())
            .dir_pin(Axis::Y, pin())
            .dir_pin(Axis::Z, pin())
            .delay(NoopDelay::new())
            .from_kinematics(&kin)
            .build()
            .unwrap();

        assert_eq!(port.pulse_ns(), 5_000);
        let (steps, dirs, _) = port.release();
        for mut p in steps.into_iter().chain(dirs) {
            p.done();
        }
    }

    #[test]
    fn test_missing_pin() {
        let mut y_step = pin();
        let result = PinStepPortBuilder::<PinMock, PinMock, NoopDelay>::new()
            .step_pin(Axis::Y, y_step.clone())
            .delay(NoopDelay::new())
            .build();

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingField("x step pin")))
        ));
        y_step.done();
    }
}
