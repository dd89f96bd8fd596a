//! Planned blocks: one queued motion or side-effect command.

use crate::config::Axis;
use crate::stepper::DirectionBits;

/// Command types the planner and stepper can schedule for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockKind {
    /// Straight-line move.
    Line,
    /// Hold position for a duration, laser at the block intensity.
    Dwell,
    /// Drop every block queued behind this one and switch outputs off.
    Cancel,
    /// Switch air assist on.
    AirEnable,
    /// Switch gas assist on.
    GasEnable,
    /// Switch air and gas assist off.
    AirGasDisable,
}

impl BlockKind {
    /// Whether this kind is a non-motion, non-dwell command.
    #[inline]
    pub const fn is_command(self) -> bool {
        matches!(
            self,
            BlockKind::Cancel | BlockKind::AirEnable | BlockKind::GasEnable | BlockKind::AirGasDisable
        )
    }
}

/// One buffered motion or command.
///
/// "Nominal" values are as requested by the caller and may never actually be
/// reached if the block is too short to accelerate to them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    /// Type of command.
    pub kind: BlockKind,

    /// Signed step count along each axis.
    pub step_delta: [i32; 3],

    /// Direction line levels, already adjusted for axis polarity.
    pub direction_bits: DirectionBits,

    /// Step events needed to complete the block (dominant axis count).
    pub step_event_count: u32,

    /// Requested cruise speed in mm/min.
    pub nominal_speed: f32,

    /// Requested cruise rate in step events/min.
    pub nominal_rate: u32,

    /// Speed at the junction with the previous block in mm/min.
    pub entry_speed: f32,

    /// Upper bound for `entry_speed` from the junction angle in mm/min.
    pub vmax_junction: f32,

    /// Euclidean length of the move.
    pub millimeters: f32,

    /// Laser output (0-255) while this block runs.
    pub nominal_laser_intensity: u8,

    /// Ramp must be recomputed before the block runs.
    pub recalculate_flag: bool,

    /// Block is long enough to reach nominal speed from any entry speed.
    pub nominal_length_flag: bool,

    /// Step rate at the start of the block.
    pub initial_rate: u32,

    /// Step rate at the end of the block.
    pub final_rate: u32,

    /// Steps/min added or removed per acceleration tick.
    pub rate_delta: u32,

    /// Step event at which acceleration stops.
    pub accelerate_until: u32,

    /// Step event at which deceleration starts.
    pub decelerate_after: u32,

    /// Dwell duration (DWELL blocks only).
    pub dwell_ns: u64,
}

impl Block {
    /// A block of `kind` with no motion.
    pub const fn command(kind: BlockKind) -> Self {
        Self {
            kind,
            step_delta: [0; 3],
            direction_bits: DirectionBits::NONE,
            step_event_count: 0,
            nominal_speed: 0.0,
            nominal_rate: 0,
            entry_speed: 0.0,
            vmax_junction: 0.0,
            millimeters: 0.0,
            nominal_laser_intensity: 0,
            recalculate_flag: false,
            nominal_length_flag: false,
            initial_rate: 0,
            final_rate: 0,
            rate_delta: 0,
            accelerate_until: 0,
            decelerate_after: 0,
            dwell_ns: 0,
        }
    }

    /// A dwell of `dwell_ns` with the laser at `intensity`.
    pub const fn dwell(dwell_ns: u64, intensity: u8) -> Self {
        let mut block = Self::command(BlockKind::Dwell);
        block.dwell_ns = dwell_ns;
        block.nominal_laser_intensity = intensity;
        block
    }

    /// Whether this is a motion block.
    #[inline]
    pub fn is_line(&self) -> bool {
        self.kind == BlockKind::Line
    }

    /// Absolute step count of `axis`.
    #[inline]
    pub fn steps(&self, axis: Axis) -> u32 {
        self.step_delta[axis.index()].unsigned_abs()
    }

    /// Speed the block may enter with, as seen by its neighbours.
    ///
    /// Non-motion blocks sit between two standstills.
    #[inline]
    pub(crate) fn junction_entry_speed(&self) -> f32 {
        if self.is_line() {
            self.entry_speed
        } else {
            0.0
        }
    }
}
