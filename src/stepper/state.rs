//! Engine state and stop conditions.

use core::fmt;

/// What the engine is doing on the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    /// No block loaded.
    #[default]
    Idle,
    /// Stepping, rate rising.
    Accelerating,
    /// Stepping at nominal rate.
    Cruising,
    /// Stepping, rate falling.
    Decelerating,
    /// Holding position for a dwell.
    Dwelling,
}

impl EngineState {
    /// Get the state name for display/debugging.
    pub fn name(self) -> &'static str {
        match self {
            EngineState::Idle => "Idle",
            EngineState::Accelerating => "Accelerating",
            EngineState::Cruising => "Cruising",
            EngineState::Decelerating => "Decelerating",
            EngineState::Dwelling => "Dwelling",
        }
    }
}

/// Why motion was halted.
///
/// Latched by the engine until the planner clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopReason {
    /// Host asked for a stop.
    SerialRequest,
    /// Power sense line dropped.
    PowerOff,
    /// Chiller sense line dropped.
    ChillerOff,
    /// Door or lid opened.
    DoorOpen,
    /// A limit switch triggered.
    LimitHit,
}

impl StopReason {
    /// Status code reported to the host.
    pub const fn code(self) -> u8 {
        match self {
            StopReason::SerialRequest => 5,
            StopReason::PowerOff => 6,
            StopReason::ChillerOff => 7,
            StopReason::LimitHit => 8,
            StopReason::DoorOpen => 9,
        }
    }

    /// Reverse of [`StopReason::code`].
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            5 => Some(StopReason::SerialRequest),
            6 => Some(StopReason::PowerOff),
            7 => Some(StopReason::ChillerOff),
            8 => Some(StopReason::LimitHit),
            9 => Some(StopReason::DoorOpen),
            _ => None,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::SerialRequest => "stop requested",
            StopReason::PowerOff => "power off",
            StopReason::ChillerOff => "chiller off",
            StopReason::DoorOpen => "door open",
            StopReason::LimitHit => "limit hit",
        };
        f.write_str(text)
    }
}
