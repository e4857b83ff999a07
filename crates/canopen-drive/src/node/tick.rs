// crates/canopen-drive/src/node/tick.rs
use super::{commands, Configuration, DriveState, NodeDriver, RunningTask, SdoExchangeState};
use crate::action::{Action, EnsureMode};
use crate::hal::CanOpenDriver;
use crate::sdo::{ReadTarget, SdoField};
use crate::dictionary::{OD_POSITION_ACTUAL, OD_STATUSWORD};
use crate::types::STATUS_POLL_INTERVAL_FRAMES;
use log::{debug, trace};

/// Result of executing one command-list step.
enum Step {
    /// The step was dispatched; move the cursor on.
    Advance,
    /// The step could not progress this tick; retry later.
    Hold,
    /// The sentinel was reached.
    End,
}

impl NodeDriver {
    /// Advances the node by one frame. Never blocks; every SDO operation is
    /// fire-and-forget with asynchronous completion.
    pub fn tick(&mut self, driver: &mut dyn CanOpenDriver, frame_idx: u32) {
        if !self.present {
            return;
        }
        match self.state {
            DriveState::Inactive => {
                if self.configuration != Configuration::None {
                    debug!("[Node {}] setting up {:?}", self.node_id, self.configuration);
                    self.state = DriveState::SettingUp;
                }
            }
            DriveState::SettingUp => self.run_setup(driver, frame_idx),
            DriveState::Running => {
                self.run_tasks(driver, frame_idx);
                self.poll_telemetry(driver, frame_idx);
            }
            // Reserved: nothing transitions here yet, but a homing node
            // keeps its telemetry fresh.
            DriveState::Homing => self.poll_telemetry(driver, frame_idx),
        }
    }

    fn run_setup(&mut self, driver: &mut dyn CanOpenDriver, frame_idx: u32) {
        let action = self
            .configuration
            .setup_commands()
            .get(self.setup_cursor)
            .copied()
            .unwrap_or(Action::Invalid);
        match self.step(driver, action, frame_idx) {
            Step::Advance => self.setup_cursor += 1,
            Step::Hold => {}
            Step::End => {
                // Wait for the final write to be acknowledged before the
                // task dispatcher is allowed to run.
                if self.write_state == SdoExchangeState::Inactive {
                    self.enter_running();
                }
            }
        }
    }

    fn enter_running(&mut self) {
        debug!("[Node {}] configuration applied; running", self.node_id);
        self.state = DriveState::Running;
        self.running_task = None;
        self.task_cursor = 0;
        self.fault_reset_requested = false;
        self.desired_angle_requested = false;
        self.profile_velocity_requested = false;
        self.max_following_error_requested = false;
    }

    fn run_tasks(&mut self, driver: &mut dyn CanOpenDriver, frame_idx: u32) {
        if self.running_task.is_none() {
            self.select_task();
        }
        if self.running_task.is_none() {
            return;
        }
        let action = self.current_task_action();
        match self.step(driver, action, frame_idx) {
            Step::Advance => self.task_cursor += 1,
            Step::Hold => {}
            Step::End => {
                if self.write_state == SdoExchangeState::Inactive {
                    debug!(
                        "[Node {}] task {:?} complete",
                        self.node_id, self.running_task
                    );
                    self.running_task = None;
                    self.task_cursor = 0;
                }
            }
        }
    }

    /// Picks the highest-priority requested task and stamps its pending
    /// value into the task's command buffer.
    fn select_task(&mut self) {
        let task = if self.fault_reset_requested {
            self.fault_reset_requested = false;
            // The drive may have moved or rebooted behind our back; cached
            // telemetry and the remembered target are no longer trustworthy.
            self.angle_valid = false;
            self.status_valid = false;
            self.desired_angle = None;
            self.fault_reset_commands = commands::fault_reset_commands();
            RunningTask::SendFaultReset
        } else if self.profile_velocity_requested {
            self.profile_velocity_requested = false;
            self.profile_velocity_commands =
                commands::profile_velocity_commands(self.new_profile_velocity);
            RunningTask::SetProfileVelocity
        } else if self.max_following_error_requested {
            self.max_following_error_requested = false;
            self.max_following_error_commands =
                commands::max_following_error_commands(self.new_max_following_error);
            RunningTask::SetMaximumFollowingError
        } else if self.desired_angle_requested {
            self.desired_angle_requested = false;
            self.desired_angle_commands =
                commands::desired_angle_commands(self.new_desired_angle);
            RunningTask::SetDesiredAngle
        } else {
            return;
        };
        debug!("[Node {}] starting task {:?}", self.node_id, task);
        self.running_task = Some(task);
        self.task_cursor = 0;
    }

    fn current_task_action(&self) -> Action {
        let commands: &[Action] = match self.running_task {
            Some(RunningTask::SetDesiredAngle) => &self.desired_angle_commands,
            Some(RunningTask::SendFaultReset) => &self.fault_reset_commands,
            Some(RunningTask::SetProfileVelocity) => &self.profile_velocity_commands,
            Some(RunningTask::SetMaximumFollowingError) => &self.max_following_error_commands,
            None => return Action::Invalid,
        };
        commands
            .get(self.task_cursor)
            .copied()
            .unwrap_or(Action::Invalid)
    }

    fn step(&mut self, driver: &mut dyn CanOpenDriver, action: Action, frame_idx: u32) -> Step {
        match action {
            Action::Invalid => Step::End,
            Action::EnsureNmtState { mode, desired } => {
                if self.last_known_nmt == desired {
                    Step::Advance
                } else {
                    if mode == EnsureMode::Active {
                        trace!(
                            "[Node {}] active NMT transitions not implemented; waiting for {:?}",
                            self.node_id,
                            desired
                        );
                    }
                    Step::Hold
                }
            }
            Action::SdoWrite(field) => {
                if self.try_dispatch_write(driver, &field, frame_idx) {
                    Step::Advance
                } else {
                    Step::Hold
                }
            }
        }
    }

    fn try_dispatch_write(
        &mut self,
        driver: &mut dyn CanOpenDriver,
        field: &SdoField,
        frame_idx: u32,
    ) -> bool {
        if self.write_state == SdoExchangeState::Active {
            return false;
        }
        if driver.queue_sdo_write(self.node_id, field.index, field.sub_index, field.payload()) {
            trace!("[Node {}] dispatched {}", self.node_id, field);
            self.write_state = SdoExchangeState::Active;
            self.write_dispatch_frame = frame_idx;
            true
        } else {
            // Transport queue full; the cursor stays put and the write is
            // retried next tick.
            trace!("[Node {}] transport rejected {}", self.node_id, field);
            false
        }
    }

    /// Keeps the cached statusword and position fresh, one poll per tick.
    /// The statusword takes precedence whenever it has never been read or
    /// its freshness window has elapsed.
    fn poll_telemetry(&mut self, driver: &mut dyn CanOpenDriver, frame_idx: u32) {
        if self.read_state == SdoExchangeState::Active {
            return;
        }
        let status_stale =
            frame_idx.wrapping_sub(self.last_status_poll) > STATUS_POLL_INTERVAL_FRAMES;
        let field = if !self.status_valid || status_stale {
            SdoField::read("Statusword", OD_STATUSWORD, 0, ReadTarget::StatusWord)
        } else {
            SdoField::read(
                "Position Actual",
                OD_POSITION_ACTUAL,
                0,
                ReadTarget::PositionActual,
            )
        };
        if driver.queue_sdo_read(self.node_id, field.index, field.sub_index) {
            if field.read_target == Some(ReadTarget::StatusWord) {
                self.last_status_poll = frame_idx;
            }
            self.active_read = Some(field);
            self.read_state = SdoExchangeState::Active;
        }
    }
}
