// crates/canopen-drive/src/node/driver.rs
use super::{commands, Configuration, DriveState, RunningTask, SdoExchangeState};
use crate::action::Action;
use crate::sdo::{ReadTarget, SdoField};
use crate::types::NmtState;
use log::{debug, warn};

/// State machine for a single motor-drive node on a CAN channel.
///
/// All mutation happens from the owning channel's ticking context; operator
/// request methods only set flags and pending values that the next tick
/// observes.
pub struct NodeDriver {
    pub(super) node_id: u8,
    pub(super) present: bool,
    pub(super) last_known_nmt: NmtState,

    pub(super) state: DriveState,
    pub(super) configuration: Configuration,
    pub(super) setup_cursor: usize,

    pub(super) running_task: Option<RunningTask>,
    pub(super) task_cursor: usize,

    // Operator request flags and their pending values.
    pub(super) fault_reset_requested: bool,
    pub(super) desired_angle_requested: bool,
    pub(super) new_desired_angle: i32,
    pub(super) profile_velocity_requested: bool,
    pub(super) new_profile_velocity: u32,
    pub(super) max_following_error_requested: bool,
    pub(super) new_max_following_error: u32,

    // SDO sub-state, one slot per direction.
    pub(super) read_state: SdoExchangeState,
    pub(super) write_state: SdoExchangeState,
    pub(super) active_read: Option<SdoField>,
    pub(super) write_dispatch_frame: u32,

    // Cached telemetry.
    pub(super) angle: i32,
    pub(super) angle_valid: bool,
    pub(super) status_word: u16,
    pub(super) status_valid: bool,
    pub(super) last_status_poll: u32,
    /// Target last handed to the node; used to drop duplicate requests.
    pub(super) desired_angle: Option<i32>,

    // Pre-built command buffers for the one-shot tasks. Stamped with the
    // pending value when the task is selected, then walked by the cursor.
    pub(super) desired_angle_commands: [Action; 3],
    pub(super) fault_reset_commands: [Action; 4],
    pub(super) profile_velocity_commands: [Action; 2],
    pub(super) max_following_error_commands: [Action; 2],
}

impl NodeDriver {
    pub(crate) fn new(node_id: u8) -> Self {
        Self {
            node_id,
            present: false,
            last_known_nmt: NmtState::Unknown,
            state: DriveState::Inactive,
            configuration: Configuration::None,
            setup_cursor: 0,
            running_task: None,
            task_cursor: 0,
            fault_reset_requested: false,
            desired_angle_requested: false,
            new_desired_angle: 0,
            profile_velocity_requested: false,
            new_profile_velocity: 0,
            max_following_error_requested: false,
            new_max_following_error: 0,
            read_state: SdoExchangeState::Inactive,
            write_state: SdoExchangeState::Inactive,
            active_read: None,
            write_dispatch_frame: 0,
            angle: 0,
            angle_valid: false,
            status_word: 0,
            status_valid: false,
            last_status_poll: 0,
            desired_angle: None,
            desired_angle_commands: commands::desired_angle_commands(0),
            fault_reset_commands: commands::fault_reset_commands(),
            profile_velocity_commands: commands::profile_velocity_commands(0),
            max_following_error_commands: commands::max_following_error_commands(0),
        }
    }

    /// Drops all state for channel teardown.
    pub(crate) fn reset(&mut self) {
        *self = NodeDriver::new(self.node_id);
    }

    // --- NMT notifications ---

    /// Lets the driver know the physical node was observed in an NMT state.
    /// The first notification latches presence for the channel's lifetime.
    pub fn tell_nmt(&mut self, state: NmtState) {
        self.last_known_nmt = state;
        if state != NmtState::Unknown && !self.present {
            debug!("[Node {}] now present ({:?})", self.node_id, state);
            self.present = true;
        }
    }

    // --- SDO completion plumbing (called by the channel's event routing) ---

    pub(crate) fn on_write_complete(&mut self) {
        if self.write_state != SdoExchangeState::Active {
            warn!(
                "[Node {}] SDO write completion with no write in flight",
                self.node_id
            );
            return;
        }
        self.write_state = SdoExchangeState::Inactive;
    }

    pub(crate) fn on_write_failed(&mut self, abort_code: u32) {
        warn!(
            "[Node {}] SDO write aborted with code {:#010X}",
            self.node_id, abort_code
        );
        // Release the slot so the pipeline does not stall; recovery is
        // operator-driven via a fault reset.
        self.write_state = SdoExchangeState::Inactive;
    }

    pub(crate) fn on_read_complete(&mut self, reply: &[u8]) {
        if self.read_state != SdoExchangeState::Active {
            warn!(
                "[Node {}] SDO read completion with no read in flight",
                self.node_id
            );
            return;
        }
        if let Some(mut field) = self.active_read.take() {
            field.store_reply(reply);
            match field.read_target {
                Some(ReadTarget::StatusWord) => {
                    self.status_word = field.value_u16();
                    self.status_valid = true;
                }
                Some(ReadTarget::PositionActual) => {
                    self.angle = field.value_s32();
                    self.angle_valid = true;
                }
                None => warn!(
                    "[Node {}] completed read field has no target: {}",
                    self.node_id, field
                ),
            }
        }
        self.read_state = SdoExchangeState::Inactive;
    }

    pub(crate) fn on_read_failed(&mut self, abort_code: u32) {
        warn!(
            "[Node {}] SDO read aborted with code {:#010X}",
            self.node_id, abort_code
        );
        self.active_read = None;
        self.read_state = SdoExchangeState::Inactive;
    }

    // --- Operator requests ---

    /// Requests a move to `angle` (encoder ticks). Dropped if the same
    /// target is already requested or being executed.
    pub fn set_desired_angle(&mut self, angle: i32) {
        let duplicate = self.desired_angle == Some(angle)
            && (self.desired_angle_requested
                || self.running_task == Some(RunningTask::SetDesiredAngle));
        if duplicate {
            return;
        }
        self.desired_angle = Some(angle);
        self.new_desired_angle = angle;
        self.desired_angle_requested = true;
    }

    /// Requests a profile-velocity change. Duplicate values are dropped.
    pub fn set_profile_velocity(&mut self, velocity: u32) {
        let duplicate = self.new_profile_velocity == velocity
            && (self.profile_velocity_requested
                || self.running_task == Some(RunningTask::SetProfileVelocity));
        if duplicate {
            return;
        }
        self.new_profile_velocity = velocity;
        self.profile_velocity_requested = true;
    }

    /// Requests a maximum-following-error change. Negative values are
    /// coerced to zero; duplicate values are dropped.
    pub fn set_maximum_following_error(&mut self, error: i32) {
        let error = error.max(0) as u32;
        let duplicate = self.new_max_following_error == error
            && (self.max_following_error_requested
                || self.running_task == Some(RunningTask::SetMaximumFollowingError));
        if duplicate {
            return;
        }
        self.new_max_following_error = error;
        self.max_following_error_requested = true;
    }

    /// Requests a fault reset. Always honoured.
    pub fn send_fault_reset(&mut self) {
        self.fault_reset_requested = true;
    }

    /// Assigns a configuration to replay onto the node.
    ///
    /// Only meaningful while `Inactive` or `Running`, and only when the
    /// configuration actually changes. A running node drops back into
    /// `SettingUp` to replay the new command list.
    pub fn add_configuration(&mut self, configuration: Configuration) {
        if configuration == self.configuration {
            return;
        }
        match self.state {
            DriveState::Inactive | DriveState::Running => {}
            _ => {
                warn!(
                    "[Node {}] configuration change ignored in state {:?}",
                    self.node_id, self.state
                );
                return;
            }
        }
        self.configuration = configuration;
        self.setup_cursor = 0;
        if self.state == DriveState::Running {
            self.state = DriveState::SettingUp;
        }
    }

    /// Forgets the assigned configuration and rewinds the setup cursor.
    /// A node that already reached `Running` stays there.
    pub fn clear_configuration(&mut self) {
        self.configuration = Configuration::None;
        self.setup_cursor = 0;
        if self.state == DriveState::SettingUp {
            self.state = DriveState::Inactive;
        }
    }

    // --- Query accessors ---

    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    /// Starts returning true once evidence is received that the physical
    /// node exists; currently that evidence is the boot-up notification.
    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn configuration(&self) -> Configuration {
        self.configuration
    }

    pub fn last_known_nmt(&self) -> NmtState {
        self.last_known_nmt
    }

    pub fn is_angle_valid(&self) -> bool {
        self.angle_valid
    }

    /// Last position read back from the node, in encoder ticks. Only
    /// meaningful while [`Self::is_angle_valid`] holds.
    pub fn angle(&self) -> i32 {
        self.angle
    }

    pub fn is_status_valid(&self) -> bool {
        self.status_valid
    }

    pub fn status_word(&self) -> u16 {
        self.status_word
    }

    pub(crate) fn running_task(&self) -> Option<RunningTask> {
        self.running_task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_latches_on_first_nmt_notification() {
        let mut node = NodeDriver::new(9);
        assert!(!node.is_present());

        node.tell_nmt(NmtState::PreOperational);
        assert!(node.is_present());

        // Later notifications, including Unknown, never clear the latch.
        node.tell_nmt(NmtState::Operational);
        assert!(node.is_present());
        node.tell_nmt(NmtState::Stopped);
        assert!(node.is_present());
        node.tell_nmt(NmtState::Unknown);
        assert!(node.is_present());
    }

    #[test]
    fn duplicate_angle_requests_are_dropped_while_pending() {
        let mut node = NodeDriver::new(5);
        node.set_desired_angle(12345);
        assert!(node.desired_angle_requested);

        node.desired_angle_requested = false; // pretend the tick consumed it
        node.running_task = Some(RunningTask::SetDesiredAngle);
        node.set_desired_angle(12345);
        assert!(!node.desired_angle_requested);

        // A different target is a new request.
        node.set_desired_angle(-1);
        assert!(node.desired_angle_requested);
        assert_eq!(node.new_desired_angle, -1);
    }

    #[test]
    fn same_angle_can_be_recommanded_once_idle() {
        let mut node = NodeDriver::new(5);
        node.set_desired_angle(777);
        node.desired_angle_requested = false;
        node.running_task = None;

        node.set_desired_angle(777);
        assert!(node.desired_angle_requested);
    }

    #[test]
    fn following_error_is_coerced_to_non_negative() {
        let mut node = NodeDriver::new(3);
        node.set_maximum_following_error(-200);
        assert_eq!(node.new_max_following_error, 0);
    }

    #[test]
    fn configuration_changes_only_from_inactive_or_running() {
        let mut node = NodeDriver::new(2);
        node.add_configuration(Configuration::PositionControl);
        assert_eq!(node.configuration(), Configuration::PositionControl);

        node.state = DriveState::SettingUp;
        node.clear_configuration();
        assert_eq!(node.configuration(), Configuration::None);
        assert_eq!(node.state(), DriveState::Inactive);

        node.state = DriveState::Running;
        node.add_configuration(Configuration::PositionControl);
        assert_eq!(node.state(), DriveState::SettingUp);
    }

    #[test]
    fn clear_configuration_keeps_a_running_node_running() {
        let mut node = NodeDriver::new(2);
        node.state = DriveState::Running;
        node.clear_configuration();
        assert_eq!(node.state(), DriveState::Running);
    }
}
