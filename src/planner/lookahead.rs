//! Look-ahead recalculation over the queued blocks.
//!
//! Runs on the planner's copy of the buffer. The oldest block's entry speed
//! is never touched. Once the engine has started the oldest block its ramp is
//! frozen too, and so is the entry speed of the block behind it, since the
//! running ramp already decelerates into that speed.

use crate::config::Kinematics;
use crate::motion::{calculate_trapezoid, max_allowable_speed};

use super::block::Block;
use super::buffer::BlockBuffer;

/// Re-plan entry speeds and ramps after a block was appended.
pub fn recalculate<const N: usize>(buffer: &mut BlockBuffer<N>, head_busy: bool, kinematics: &Kinematics) {
    let acceleration = kinematics.acceleration;
    let first_free_entry = if head_busy { 2 } else { 1 };
    let first_free_ramp = if head_busy { 1 } else { 0 };

    reverse_pass(buffer, first_free_entry, acceleration);
    forward_pass(buffer, first_free_entry, acceleration);
    recalculate_trapezoids(buffer, first_free_ramp, kinematics);

    trace!("look-ahead over {} blocks", buffer.len());
}

/// Newest to oldest: raise each entry speed as far as the block can still
/// slow down to the next block's entry.
fn reverse_pass<const N: usize>(buffer: &mut BlockBuffer<N>, first: usize, acceleration: f32) {
    let len = buffer.len();
    for index in (first..len).rev() {
        let next_entry = exit_speed(buffer, index);
        if let Some(current) = buffer.get_mut(index) {
            if current.is_line() {
                reverse_kernel(current, next_entry, acceleration);
            }
        }
    }
}

fn reverse_kernel(current: &mut Block, next_entry: f32, acceleration: f32) {
    if current.entry_speed == current.vmax_junction {
        return;
    }

    current.entry_speed = if !current.nominal_length_flag && current.vmax_junction > next_entry {
        current
            .vmax_junction
            .min(max_allowable_speed(acceleration, next_entry, current.millimeters))
    } else {
        current.vmax_junction
    };
    current.recalculate_flag = true;
}

/// Oldest to newest: cap each entry speed by what the previous block can
/// reach accelerating over its length.
fn forward_pass<const N: usize>(buffer: &mut BlockBuffer<N>, first: usize, acceleration: f32) {
    let len = buffer.len();
    for index in first.max(1)..len {
        let previous = match buffer.get(index - 1) {
            Some(previous) if previous.is_line() => *previous,
            _ => continue,
        };
        if let Some(current) = buffer.get_mut(index) {
            if current.is_line() {
                forward_kernel(&previous, current, acceleration);
            }
        }
    }
}

fn forward_kernel(previous: &Block, current: &mut Block, acceleration: f32) {
    if previous.nominal_length_flag || previous.entry_speed >= current.entry_speed {
        return;
    }

    let reachable = max_allowable_speed(acceleration, previous.entry_speed, previous.millimeters);
    if reachable < current.entry_speed {
        current.entry_speed = reachable;
        current.recalculate_flag = true;
    }
}

/// Recompute the ramp of every block whose entry or exit speed moved.
fn recalculate_trapezoids<const N: usize>(buffer: &mut BlockBuffer<N>, first: usize, kinematics: &Kinematics) {
    let len = buffer.len();
    for index in first..len {
        let next_changed = buffer
            .get(index + 1)
            .map(|next| next.recalculate_flag)
            .unwrap_or(true);
        let exit = exit_speed(buffer, index);

        if let Some(current) = buffer.get_mut(index) {
            if current.is_line() && (current.recalculate_flag || next_changed) {
                let nominal = current.nominal_speed;
                let ramp = calculate_trapezoid(
                    current,
                    current.entry_speed / nominal,
                    exit / nominal,
                    kinematics,
                );
                ramp.apply(current);
            }
        }
    }

    for index in first..len {
        if let Some(block) = buffer.get_mut(index) {
            block.recalculate_flag = false;
        }
    }
}

/// Speed a block must leave with: the next block's entry, or rest.
fn exit_speed<const N: usize>(buffer: &BlockBuffer<N>, index: usize) -> f32 {
    buffer
        .get(index + 1)
        .map(Block::junction_entry_speed)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::BlockKind;

    fn line(vmax_junction: f32, nominal_speed: f32, millimeters: f32) -> Block {
        let kin = Kinematics::default();
        let mut block = Block::command(BlockKind::Line);
        let steps = (millimeters * kin.steps_per_mm[0]) as u32;
        block.step_delta = [steps as i32, 0, 0];
        block.step_event_count = steps;
        block.nominal_speed = nominal_speed;
        block.nominal_rate = (steps as f32 * nominal_speed / millimeters) as u32;
        block.rate_delta = 9843;
        block.vmax_junction = vmax_junction;
        block.millimeters = millimeters;
        block.nominal_length_flag =
            nominal_speed <= max_allowable_speed(kin.acceleration, 0.0, millimeters);
        block.recalculate_flag = true;
        block
    }

    #[test]
    fn test_single_block_ends_at_rest() {
        let kin = Kinematics::default();
        let mut buffer: BlockBuffer<4> = BlockBuffer::new();
        buffer.push(line(6000.0, 6000.0, 10.0)).unwrap();

        recalculate(&mut buffer, false, &kin);

        let block = buffer.get(0).unwrap();
        assert_eq!(block.entry_speed, 0.0);
        assert_eq!(block.initial_rate, 0);
        assert_eq!(block.final_rate, 0);
        assert!(!block.recalculate_flag);
    }

    #[test]
    fn test_collinear_chain_carries_speed() {
        let kin = Kinematics::default();
        let mut buffer: BlockBuffer<4> = BlockBuffer::new();
        buffer.push(line(6000.0, 6000.0, 10.0)).unwrap();
        recalculate(&mut buffer, false, &kin);
        buffer.push(line(6000.0, 6000.0, 10.0)).unwrap();
        recalculate(&mut buffer, false, &kin);

        let first = *buffer.get(0).unwrap();
        let second = *buffer.get(1).unwrap();
        assert_eq!(first.entry_speed, 0.0);
        assert!(second.entry_speed > 0.0);
        assert!(second.entry_speed <= second.vmax_junction);
        assert!(first.final_rate > 0);
        assert_eq!(second.final_rate, 0);
    }

    #[test]
    fn test_running_block_is_frozen() {
        let kin = Kinematics::default();
        let mut buffer: BlockBuffer<4> = BlockBuffer::new();
        buffer.push(line(6000.0, 6000.0, 10.0)).unwrap();
        recalculate(&mut buffer, false, &kin);
        let running = *buffer.get(0).unwrap();

        buffer.push(line(6000.0, 6000.0, 10.0)).unwrap();
        recalculate(&mut buffer, true, &kin);

        assert_eq!(*buffer.get(0).unwrap(), running);
        let second = buffer.get(1).unwrap();
        assert_eq!(second.entry_speed, 0.0);
        assert_eq!(second.initial_rate, 0);
    }

    #[test]
    fn test_barrier_forces_rest() {
        let kin = Kinematics::default();
        let mut buffer: BlockBuffer<4> = BlockBuffer::new();
        buffer.push(line(6000.0, 6000.0, 10.0)).unwrap();
        buffer.push(Block::dwell(1_000, 0)).unwrap();
        buffer.push(line(0.0, 6000.0, 10.0)).unwrap();
        recalculate(&mut buffer, false, &kin);

        assert_eq!(buffer.get(0).unwrap().final_rate, 0);
        assert_eq!(buffer.get(2).unwrap().entry_speed, 0.0);
    }
}
