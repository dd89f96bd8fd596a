//! Position queries and synchronisation with the engine.

use crate::config::units::{Millimeters, Steps};
use crate::config::Axis;
use crate::error::{PlannerError, Result};
use crate::stepper::{Position, StopReason};
use crate::system::IdleStrategy;

use super::plan::Planner;

impl<'a, const N: usize, I: IdleStrategy> Planner<'a, N, I> {
    /// Get the machine position derived from emitted steps.
    ///
    /// Matches the last planned target only once [`Planner::synchronize`]
    /// has returned.
    pub fn get_position(&self) -> Position {
        self.core.machine_position()
    }

    /// Wait until every queued block has run and the engine is idle.
    ///
    /// Returns immediately if nothing is queued.
    ///
    /// # Errors
    ///
    /// [`PlannerError::Stopped`] if a halt is latched.
    pub fn synchronize(&mut self) -> Result<()> {
        loop {
            let drained = self.core.with(|shared| match shared.stop {
                Some(reason) => Err(PlannerError::Stopped(reason)),
                None => Ok(shared.buffer.is_empty()),
            })?;

            if drained {
                return Ok(());
            }
            self.idle.idle();
        }
    }

    /// Declare the current machine location to be `(x, y, z)` mm.
    ///
    /// Sets the planner position and the machine step counters together,
    /// e.g. after homing.
    ///
    /// # Errors
    ///
    /// [`PlannerError::Busy`] unless the buffer is empty.
    pub fn reset_position(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        let target = [x, y, z];
        if target.iter().any(|v| !v.is_finite()) {
            return Err(PlannerError::InvalidTarget.into());
        }

        let kin = self.core.kinematics();
        let mut exact = [0.0f32; 3];
        let mut steps = [0i32; 3];
        for axis in Axis::ALL {
            let i = axis.index();
            exact[i] = kin.mm_to_steps(axis, target[i]);
            steps[i] = Steps::from_millimeters(Millimeters(target[i]), kin.steps_per_mm[i]).value();
        }

        self.core.with(|shared| {
            if !shared.buffer.is_empty() {
                return Err(PlannerError::Busy);
            }
            shared.machine_position = steps;
            shared.position_stale = false;
            Ok(())
        })?;

        self.position = exact;
        self.previous = None;
        info!("position reset to {} {} {}", x, y, z);
        Ok(())
    }

    /// Get the latched stop reason, if any.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.core.stop_reason()
    }

    /// Acknowledge a halt so that motion is accepted again.
    ///
    /// The planner position is then recovered according to the configured
    /// [`ResumePolicy`](crate::config::ResumePolicy).
    pub fn clear_stop(&mut self) {
        let machine = self.core.with(|shared| {
            shared.stop.take()?;
            shared.position_stale = false;
            Some(shared.machine_position)
        });

        // Without a latched stop, a pending request has not been seen yet.
        if let Some(steps) = machine {
            self.core.clear_halt_request();
            self.apply_resume_policy(steps);
            info!("stop cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{MachineConfig, ResumePolicy};
    use crate::error::{Error, PlannerError};
    use crate::stepper::StopReason;
    use crate::system::MotionCore;

    #[test]
    fn test_synchronize_idle_returns_immediately() {
        let core: MotionCore<4> = MotionCore::default();
        let mut waits = 0;
        let mut planner = core.planner_with_idle(|| waits += 1);

        planner.synchronize().unwrap();
        planner.synchronize().unwrap();
        drop(planner);
        assert_eq!(waits, 0);
    }

    #[test]
    fn test_reset_position() {
        let core: MotionCore<4> = MotionCore::default();
        let mut planner = core.planner();

        planner.reset_position(10.0, 20.0, 0.0).unwrap();
        let pos = planner.get_position();
        assert!((pos.x - 10.0).abs() < 0.05);
        assert!((pos.y - 20.0).abs() < 0.05);
        assert!(planner.planned_position().approx_eq(&pos, 0.05));
    }

    #[test]
    fn test_reset_position_requires_empty_buffer() {
        let core: MotionCore<4> = MotionCore::default();
        let mut planner = core.planner();
        planner.plan_line(10.0, 0.0, 0.0, 6000.0, 0).unwrap();

        assert_eq!(
            planner.reset_position(0.0, 0.0, 0.0),
            Err(Error::Planner(PlannerError::Busy))
        );
    }

    #[test]
    fn test_clear_stop_resyncs() {
        let core: MotionCore<4> = MotionCore::default();
        let mut planner = core.planner();
        planner.plan_line(10.0, 0.0, 0.0, 6000.0, 0).unwrap();

        // Simulate a halt that discarded the queued move
        core.with(|shared| {
            shared.discard_all();
            shared.stop = Some(StopReason::ChillerOff);
        });

        assert_eq!(planner.stop_reason(), Some(StopReason::ChillerOff));
        assert_eq!(
            planner.synchronize(),
            Err(Error::Planner(PlannerError::Stopped(StopReason::ChillerOff)))
        );

        planner.clear_stop();
        assert_eq!(planner.stop_reason(), None);
        assert_eq!(planner.planned_position(), planner.get_position());
    }

    #[test]
    fn test_clear_stop_keeps_unseen_request() {
        let core: MotionCore<4> = MotionCore::default();
        let mut planner = core.planner();

        core.request_stop(StopReason::SerialRequest);
        planner.clear_stop();

        assert_eq!(core.take_halt_request(), Some(StopReason::SerialRequest));
    }

    #[test]
    fn test_clear_stop_keeps_pending_resync() {
        let core: MotionCore<4> = MotionCore::default();
        let mut planner = core.planner();
        planner.plan_line(10.0, 0.0, 0.0, 6000.0, 0).unwrap();

        // Cancel executed: motion discarded, no stop latched
        core.with(|shared| shared.discard_all());
        planner.clear_stop();

        planner.plan_line(1.0, 0.0, 0.0, 6000.0, 0).unwrap();
        assert!((planner.planned_position().x - 1.0).abs() < 0.05);
        let block = core.block(0).unwrap();
        assert_eq!(block.step_delta[0], libm::roundf(core.kinematics().steps_per_mm[0]) as i32);
    }

    #[test]
    fn test_clear_stop_keep_planned() {
        let mut config = MachineConfig::default();
        config.motion.resume_policy = ResumePolicy::KeepPlanned;
        let core: MotionCore<4> = MotionCore::from_config(&config).unwrap();
        let mut planner = core.planner();
        planner.plan_line(10.0, 0.0, 0.0, 6000.0, 0).unwrap();

        core.with(|shared| {
            shared.discard_all();
            shared.stop = Some(StopReason::SerialRequest);
        });
        planner.clear_stop();

        assert!((planner.planned_position().x - 10.0).abs() < 0.05);
        assert_eq!(planner.get_position().x, 0.0);
    }
}
