//! Hardware seams of the engine and their embedded-hal implementations.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

use crate::config::Axis;
use crate::error::StepperError;

use super::bits::{DirectionBits, StepBits};
use super::state::StopReason;

/// Step and direction lines of the three axes.
pub trait StepPort {
    /// Drive the direction lines.
    fn set_directions(&mut self, directions: DirectionBits) -> Result<(), StepperError>;

    /// Emit one pulse on every axis in `steps`.
    fn pulse(&mut self, steps: StepBits) -> Result<(), StepperError>;
}

/// Laser and assist-gas outputs.
pub trait ToolOutput {
    /// Set laser intensity (0 = off, 255 = full).
    fn set_intensity(&mut self, intensity: u8) -> Result<(), StepperError>;

    /// Switch air assist.
    fn set_air(&mut self, on: bool) -> Result<(), StepperError>;

    /// Switch gas assist.
    fn set_gas(&mut self, on: bool) -> Result<(), StepperError>;

    /// Laser, air and gas off.
    fn all_off(&mut self) -> Result<(), StepperError> {
        self.set_intensity(0)?;
        self.set_air(false)?;
        self.set_gas(false)
    }
}

/// Safety inputs consulted while motion is active.
pub trait Interlock {
    /// Get the reason to halt, if any input asks for one.
    fn poll(&mut self) -> Option<StopReason>;
}

/// Interlock that never halts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterlock;

impl Interlock for NoInterlock {
    #[inline]
    fn poll(&mut self) -> Option<StopReason> {
        None
    }
}

impl<F: FnMut() -> Option<StopReason>> Interlock for F {
    #[inline]
    fn poll(&mut self) -> Option<StopReason> {
        self()
    }
}

/// [`StepPort`] on six GPIO outputs.
///
/// Pulses are `pulse_ns` wide; all stepping axes rise together.
pub struct PinStepPort<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    step_pins: [STEP; 3],
    dir_pins: [DIR; 3],
    delay: DELAY,
    pulse_ns: u32,
    /// Last written direction levels (cached to avoid unnecessary pin writes).
    current_directions: Option<DirectionBits>,
}

impl<STEP, DIR, DELAY> PinStepPort<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    /// Create a port from pins indexed by [`Axis::index`].
    pub fn new(step_pins: [STEP; 3], dir_pins: [DIR; 3], delay: DELAY, pulse_ns: u32) -> Self {
        Self {
            step_pins,
            dir_pins,
            delay,
            pulse_ns,
            current_directions: None,
        }
    }

    /// Get the pulse width in nanoseconds.
    #[inline]
    pub fn pulse_ns(&self) -> u32 {
        self.pulse_ns
    }

    /// Release the pins and delay.
    pub fn release(self) -> ([STEP; 3], [DIR; 3], DELAY) {
        (self.step_pins, self.dir_pins, self.delay)
    }
}

impl<STEP, DIR, DELAY> StepPort for PinStepPort<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    fn set_directions(&mut self, directions: DirectionBits) -> Result<(), StepperError> {
        if self.current_directions == Some(directions) {
            return Ok(());
        }

        for axis in Axis::ALL {
            let pin = &mut self.dir_pins[axis.index()];
            if directions.contains(axis) {
                pin.set_high().map_err(|_| StepperError::Pin)?;
            } else {
                pin.set_low().map_err(|_| StepperError::Pin)?;
            }
        }

        self.current_directions = Some(directions);
        Ok(())
    }

    fn pulse(&mut self, steps: StepBits) -> Result<(), StepperError> {
        if steps.is_empty() {
            return Ok(());
        }

        for axis in Axis::ALL {
            if steps.contains(axis) {
                self.step_pins[axis.index()].set_high().map_err(|_| StepperError::Pin)?;
            }
        }

        self.delay.delay_ns(self.pulse_ns);

        for axis in Axis::ALL {
            if steps.contains(axis) {
                self.step_pins[axis.index()].set_low().map_err(|_| StepperError::Pin)?;
            }
        }
        Ok(())
    }
}

/// [`ToolOutput`] on a PWM channel and two active-low relay outputs.
pub struct PwmTool<PWM, AIR, GAS>
where
    PWM: SetDutyCycle,
    AIR: OutputPin,
    GAS: OutputPin,
{
    laser: PWM,
    air: AIR,
    gas: GAS,
}

impl<PWM, AIR, GAS> PwmTool<PWM, AIR, GAS>
where
    PWM: SetDutyCycle,
    AIR: OutputPin,
    GAS: OutputPin,
{
    /// Create the tool outputs.
    pub fn new(laser: PWM, air: AIR, gas: GAS) -> Self {
        Self { laser, air, gas }
    }

    /// Release the peripherals.
    pub fn release(self) -> (PWM, AIR, GAS) {
        (self.laser, self.air, self.gas)
    }
}

impl<PWM, AIR, GAS> ToolOutput for PwmTool<PWM, AIR, GAS>
where
    PWM: SetDutyCycle,
    AIR: OutputPin,
    GAS: OutputPin,
{
    fn set_intensity(&mut self, intensity: u8) -> Result<(), StepperError> {
        self.laser
            .set_duty_cycle_fraction(intensity as u16, u8::MAX as u16)
            .map_err(|_| StepperError::Pin)
    }

    fn set_air(&mut self, on: bool) -> Result<(), StepperError> {
        set_active_low(&mut self.air, on)
    }

    fn set_gas(&mut self, on: bool) -> Result<(), StepperError> {
        set_active_low(&mut self.gas, on)
    }
}

fn set_active_low<P: OutputPin>(pin: &mut P, on: bool) -> Result<(), StepperError> {
    if on {
        pin.set_low().map_err(|_| StepperError::Pin)
    } else {
        pin.set_high().map_err(|_| StepperError::Pin)
    }
}

/// [`Interlock`] reading four sense inputs; a high line means fault.
///
/// A failed read is reported as a fault.
pub struct SenseInputs<POWER, CHILLER, DOOR, LIMIT>
where
    POWER: InputPin,
    CHILLER: InputPin,
    DOOR: InputPin,
    LIMIT: InputPin,
{
    power_off: POWER,
    chiller_off: CHILLER,
    door_open: DOOR,
    limit_hit: LIMIT,
}

impl<POWER, CHILLER, DOOR, LIMIT> SenseInputs<POWER, CHILLER, DOOR, LIMIT>
where
    POWER: InputPin,
    CHILLER: InputPin,
    DOOR: InputPin,
    LIMIT: InputPin,
{
    /// Create the interlock from its sense lines.
    pub fn new(power_off: POWER, chiller_off: CHILLER, door_open: DOOR, limit_hit: LIMIT) -> Self {
        Self {
            power_off,
            chiller_off,
            door_open,
            limit_hit,
        }
    }
}

impl<POWER, CHILLER, DOOR, LIMIT> Interlock for SenseInputs<POWER, CHILLER, DOOR, LIMIT>
where
    POWER: InputPin,
    CHILLER: InputPin,
    DOOR: InputPin,
    LIMIT: InputPin,
{
    fn poll(&mut self) -> Option<StopReason> {
        if self.power_off.is_high().unwrap_or(true) {
            Some(StopReason::PowerOff)
        } else if self.chiller_off.is_high().unwrap_or(true) {
            Some(StopReason::ChillerOff)
        } else if self.limit_hit.is_high().unwrap_or(true) {
            Some(StopReason::LimitHit)
        } else if self.door_open.is_high().unwrap_or(true) {
            Some(StopReason::DoorOpen)
        } else {
            None
        }
    }
}
