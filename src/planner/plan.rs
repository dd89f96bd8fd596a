//! Foreground planner handle.

use libm::{ceilf, fabsf, roundf, sqrtf};

use crate::config::{Axis, ResumePolicy};
use crate::error::{PlannerError, Result};
use crate::motion::max_allowable_speed;
use crate::stepper::{DirectionBits, Position};
use crate::system::{IdleStrategy, MotionCore, Shared, Spin};

use super::block::{Block, BlockKind};
use super::buffer::BlockBuffer;
use super::junction::{max_junction_speed, Segment};
use super::lookahead;

/// Line block plus the planner state it commits on success.
struct PreparedLine {
    block: Block,
    segment: Segment,
    target_steps: [f32; 3],
}

/// Buffer state taken for one enqueue attempt.
enum Snapshot<const N: usize> {
    /// Command or dwell already appended.
    Queued,
    Stale,
    Full,
    /// Buffer copy with the new line appended, to be re-planned.
    Line {
        plan: BlockBuffer<N>,
        head_busy: bool,
        epoch: u32,
    },
}

enum Enqueue {
    Queued,
    /// A cancel or halt ran while the block was being prepared.
    Stale,
}

/// Producer side of a [`MotionCore`].
///
/// Turns absolute targets into blocks, appends them to the buffer and
/// re-plans the queued speeds. There must be only one planner per core.
pub struct Planner<'a, const N: usize, I: IdleStrategy = Spin> {
    pub(super) core: &'a MotionCore<N>,
    pub(super) idle: I,
    /// Last committed target in fractional steps.
    pub(super) position: [f32; 3],
    /// Last queued line, for the junction with the next one.
    pub(super) previous: Option<Segment>,
}

impl<'a, const N: usize, I: IdleStrategy> Planner<'a, N, I> {
    pub(crate) fn new(core: &'a MotionCore<N>, idle: I) -> Self {
        let steps = core.machine_steps();
        Self {
            core,
            idle,
            position: steps.map(|s| s as f32),
            previous: None,
        }
    }

    /// Queue a straight move to an absolute target.
    ///
    /// `feed_rate` is in mm/min, `intensity` is the laser output (0-255) held
    /// for the whole move. Blocks while the buffer is full.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::InvalidFeedRate`] if the rate is not a positive number
    /// - [`PlannerError::InvalidTarget`] if a coordinate is not finite
    /// - [`PlannerError::ZeroLengthMove`] if no axis would step
    /// - [`PlannerError::Stopped`] if motion is halted
    pub fn plan_line(&mut self, x: f32, y: f32, z: f32, feed_rate: f32, intensity: u8) -> Result<()> {
        if !(feed_rate.is_finite() && feed_rate > 0.0) {
            return Err(PlannerError::InvalidFeedRate(feed_rate).into());
        }
        let target = [x, y, z];
        if target.iter().any(|v| !v.is_finite()) {
            return Err(PlannerError::InvalidTarget.into());
        }

        loop {
            self.sync_position()?;
            let line = self.prepare_line(&target, feed_rate, intensity)?;

            match self.enqueue(line.block, Some(line.segment))? {
                Enqueue::Queued => {
                    self.position = line.target_steps;
                    self.previous = Some(line.segment);
                    debug!(
                        "queued line: {} steps at {} mm/min",
                        line.block.step_event_count,
                        line.block.nominal_speed
                    );
                    return Ok(());
                }
                Enqueue::Stale => continue,
            }
        }
    }

    /// Rapid move to an absolute target at the default seek rate, laser off.
    pub fn plan_seek(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        let rate = self.core.kinematics().default_seek_rate;
        self.plan_line(x, y, z, rate, 0)
    }

    /// Cutting move at the default feed rate.
    pub fn plan_feed(&mut self, x: f32, y: f32, z: f32, intensity: u8) -> Result<()> {
        let rate = self.core.kinematics().default_feed_rate;
        self.plan_line(x, y, z, rate, intensity)
    }

    /// Queue a pause of `seconds` with the laser held at `intensity`.
    ///
    /// # Errors
    ///
    /// [`PlannerError::InvalidDwell`] for a negative or non-finite duration.
    pub fn plan_dwell(&mut self, seconds: f32, intensity: u8) -> Result<()> {
        if !(seconds.is_finite() && seconds >= 0.0) {
            return Err(PlannerError::InvalidDwell(seconds).into());
        }
        let dwell_ns = (seconds as f64 * 1e9) as u64;

        self.enqueue(Block::dwell(dwell_ns, intensity), None)?;
        self.previous = None;
        debug!("queued dwell: {} ns", dwell_ns);
        Ok(())
    }

    /// Queue a cancel or air/gas command, ordered with the motion around it.
    ///
    /// # Errors
    ///
    /// [`PlannerError::NotACommand`] for [`BlockKind::Line`] and [`BlockKind::Dwell`].
    pub fn plan_command(&mut self, kind: BlockKind) -> Result<()> {
        if !kind.is_command() {
            return Err(PlannerError::NotACommand.into());
        }

        self.enqueue(Block::command(kind), None)?;
        self.previous = None;
        debug!("queued command: {}", kind);
        Ok(())
    }

    /// Get the last committed target.
    ///
    /// Runs ahead of [`Planner::get_position`] while blocks are queued.
    pub fn planned_position(&self) -> Position {
        let kin = self.core.kinematics();
        let mm = |axis: Axis| self.position[axis.index()] / kin.steps_per_mm[axis.index()];
        Position::new(mm(Axis::X), mm(Axis::Y), mm(Axis::Z))
    }

    /// Get the shared core.
    #[inline]
    pub fn core(&self) -> &'a MotionCore<N> {
        self.core
    }

    /// Pick up the machine position after a cancel or halt discarded motion.
    pub(super) fn sync_position(&mut self) -> Result<()> {
        let machine = self.core.with(|shared| {
            if let Some(reason) = shared.stop {
                return Err(PlannerError::Stopped(reason));
            }
            if !shared.position_stale {
                return Ok(None);
            }
            shared.position_stale = false;
            Ok(Some(shared.machine_position))
        })?;

        if let Some(steps) = machine {
            self.apply_resume_policy(steps);
        }
        Ok(())
    }

    pub(super) fn apply_resume_policy(&mut self, machine_steps: [i32; 3]) {
        self.previous = None;
        match self.core.kinematics().resume_policy {
            ResumePolicy::Resync => {
                self.position = machine_steps.map(|s| s as f32);
                debug!("planner resynced to machine position");
            }
            ResumePolicy::KeepPlanned => {}
        }
    }

    fn prepare_line(&self, target: &[f32; 3], feed_rate: f32, intensity: u8) -> Result<PreparedLine> {
        let kin = self.core.kinematics();

        let mut target_steps = [0.0; 3];
        let mut step_delta = [0i32; 3];
        let mut delta_mm = [0.0f32; 3];
        let mut direction_bits = DirectionBits::NONE;

        for axis in Axis::ALL {
            let i = axis.index();
            target_steps[i] = kin.mm_to_steps(axis, target[i]);
            step_delta[i] = checked_step_delta(target_steps[i], self.position[i])?;
            delta_mm[i] = kin.steps_to_mm(axis, step_delta[i]);
            if step_delta[i] < 0 {
                direction_bits.insert(axis);
            }
        }

        let step_event_count = step_delta.iter().map(|d| d.unsigned_abs()).max().unwrap_or(0);
        if step_event_count == 0 {
            return Err(PlannerError::ZeroLengthMove.into());
        }

        let millimeters = sqrtf(delta_mm.iter().map(|d| d * d).sum());
        let inverse_millimeters = 1.0 / millimeters;

        // Slow down so that no axis exceeds its own rate limit.
        let mut nominal_speed = feed_rate;
        for axis in Axis::ALL {
            let i = axis.index();
            let axis_mm = fabsf(delta_mm[i]);
            if let Some(max_rate) = kin.max_rate[i] {
                if axis_mm > 0.0 {
                    nominal_speed = nominal_speed.min(max_rate * millimeters / axis_mm);
                }
            }
        }

        let step_events = step_event_count as f32;
        let nominal_rate = ceilf(step_events * nominal_speed * inverse_millimeters) as u32;
        let rate_delta = ceilf(
            step_events * inverse_millimeters * kin.acceleration
                / (60.0 * kin.acceleration_ticks_per_second as f32),
        ) as u32;

        let mut block = Block::command(BlockKind::Line);
        block.step_delta = step_delta;
        block.direction_bits = direction_bits ^ kin.invert_mask;
        block.step_event_count = step_event_count;
        block.nominal_speed = nominal_speed;
        block.nominal_rate = nominal_rate;
        block.millimeters = millimeters;
        block.nominal_laser_intensity = intensity;
        block.rate_delta = rate_delta;
        block.nominal_length_flag =
            nominal_speed <= max_allowable_speed(kin.acceleration, 0.0, millimeters);
        block.recalculate_flag = true;

        Ok(PreparedLine {
            block,
            segment: Segment {
                unit_vec: delta_mm.map(|d| d * inverse_millimeters),
                nominal_speed,
            },
            target_steps,
        })
    }

    /// Append `block`, waiting for a free slot.
    ///
    /// `segment` is set for line blocks; they are rejected as stale if a
    /// cancel or halt ran since their step deltas were computed.
    ///
    /// Look-ahead runs on a copy of the buffer outside the critical section,
    /// so the step interrupt is only held off for two block copies. The copy
    /// is committed only if the engine did not start or retire a block in
    /// the meantime; otherwise it is planned again.
    fn enqueue(&mut self, block: Block, segment: Option<Segment>) -> Result<Enqueue> {
        let core = self.core;
        loop {
            let snapshot = core.with(|shared| {
                if let Some(reason) = shared.stop {
                    return Err(PlannerError::Stopped(reason));
                }
                if segment.is_some() && shared.position_stale {
                    return Ok(Snapshot::Stale);
                }
                if shared.buffer.is_full() {
                    return Ok(Snapshot::Full);
                }

                let mut block = block;
                let Some(segment) = &segment else {
                    // Commands and dwells never change other blocks' ramps.
                    if shared.buffer.push(block).is_err() {
                        return Ok(Snapshot::Full);
                    }
                    core.set_active(true);
                    return Ok(Snapshot::Queued);
                };

                block.vmax_junction = self.junction_speed(shared, segment);
                let mut plan = shared.buffer.clone();
                if plan.push(block).is_err() {
                    return Ok(Snapshot::Full);
                }
                Ok(Snapshot::Line {
                    plan,
                    head_busy: shared.head_busy,
                    epoch: shared.epoch,
                })
            })?;

            let (mut plan, head_busy, epoch) = match snapshot {
                Snapshot::Queued => return Ok(Enqueue::Queued),
                Snapshot::Stale => return Ok(Enqueue::Stale),
                Snapshot::Full => {
                    self.idle.idle();
                    continue;
                }
                Snapshot::Line { plan, head_busy, epoch } => (plan, head_busy, epoch),
            };

            lookahead::recalculate(&mut plan, head_busy, core.kinematics());

            let committed = core.with(|shared| {
                if shared.epoch != epoch {
                    return false;
                }
                shared.buffer = plan;
                core.set_active(true);
                true
            });
            if committed {
                return Ok(Enqueue::Queued);
            }
            trace!("buffer moved during look-ahead, re-planning");
        }
    }

    fn junction_speed(&self, shared: &Shared<N>, segment: &Segment) -> f32 {
        let kin = self.core.kinematics();
        match (shared.buffer.newest(), &self.previous) {
            // Starts from rest, nothing to constrain the corner.
            (None, _) => segment.nominal_speed,
            (Some(newest), Some(previous)) if newest.is_line() => {
                max_junction_speed(previous, segment, kin.acceleration, kin.junction_deviation)
            }
            _ => 0.0,
        }
    }
}

/// Whole-step distance from `from` to `to`, both in fractional steps.
///
/// Targets outside the step counter range are rejected.
fn checked_step_delta(to: f32, from: f32) -> Result<i32> {
    const LIMIT: f32 = i32::MAX as f32;
    let to = roundf(to);
    if !(-LIMIT..LIMIT).contains(&to) {
        return Err(PlannerError::InvalidTarget.into());
    }
    let delta = to as i64 - roundf(from) as i64;
    i32::try_from(delta).map_err(|_| PlannerError::InvalidTarget.into())
}
