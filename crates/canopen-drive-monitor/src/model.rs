// crates/canopen-drive-monitor/src/model.rs
//! Defines the core data structures for diagnostic monitoring.
//!
//! These structs are built from a channel's observable state on the ticking
//! thread and serialized (e.g. to JSON) elsewhere.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use canopen_drive::dictionary::{STATUS_BIT_FAULT, STATUS_BIT_TARGET_REACHED};
use canopen_drive::{Channel, DriveState, MotorControllerData, NmtState};
use serde::Serialize;

/// A serializable snapshot of a single motor controller, as seen by its
/// channel.
#[derive(Serialize, Clone, Debug)]
pub struct MotorInfo {
    pub node_id: u8,
    pub state: String,
    pub nmt_state: String,
    pub angle: i32,
    pub angle_valid: bool,
    pub status_valid: bool,
    /// Decoded from the cached statusword; false while it is invalid.
    pub fault: bool,
    pub target_reached: bool,
}

impl MotorInfo {
    /// Builds one row from a snapshot entry plus the node's cached
    /// statusword (when valid) and NMT state.
    pub fn from_parts(
        data: &MotorControllerData,
        status_word: Option<u16>,
        nmt_state: NmtState,
    ) -> Self {
        let (fault, target_reached) = match status_word {
            Some(word) => (
                word & STATUS_BIT_FAULT != 0,
                word & STATUS_BIT_TARGET_REACHED != 0,
            ),
            None => (false, false),
        };
        Self {
            node_id: data.node_id,
            state: Self::state_to_string(data.state),
            nmt_state: Self::nmt_to_string(nmt_state),
            angle: data.angle,
            angle_valid: data.angle_valid,
            status_valid: status_word.is_some(),
            fault,
            target_reached,
        }
    }

    /// Helper to convert the internal `DriveState` enum to a human-readable
    /// string.
    fn state_to_string(state: DriveState) -> String {
        match state {
            DriveState::Inactive => "Inactive",
            DriveState::SettingUp => "SettingUp",
            DriveState::Running => "Running",
            DriveState::Homing => "Homing",
        }
        .to_string()
    }

    fn nmt_to_string(state: NmtState) -> String {
        match state {
            NmtState::Unknown => "Unknown",
            NmtState::Initialisation => "Initialisation",
            NmtState::PreOperational => "PreOperational",
            NmtState::Operational => "Operational",
            NmtState::Stopped => "Stopped",
        }
        .to_string()
    }
}

/// A serializable snapshot of one channel and all present drives on it.
#[derive(Serialize, Clone, Debug)]
pub struct ChannelSnapshot {
    pub channel_idx: usize,
    pub frame_idx: u32,
    pub motors: Vec<MotorInfo>,
}

impl ChannelSnapshot {
    /// Captures the channel's present nodes in ascending node-id order.
    pub fn from_channel(channel: &Channel) -> Self {
        let motors = channel
            .snapshot()
            .iter()
            .map(|data| {
                let node = channel.node(data.node_id);
                let status_word = node
                    .filter(|node| node.is_status_valid())
                    .map(|node| node.status_word());
                let nmt_state = node
                    .map(|node| node.last_known_nmt())
                    .unwrap_or(NmtState::Unknown);
                MotorInfo::from_parts(data, status_word, nmt_state)
            })
            .collect();
        Self {
            channel_idx: channel.channel_idx(),
            frame_idx: channel.frame_idx(),
            motors,
        }
    }
}
