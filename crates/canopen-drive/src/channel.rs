// crates/canopen-drive/src/channel.rs
//! The per-bus scheduler that owns one node driver per CAN address.

use crate::emergency;
use crate::hal::{CanOpenDriver, DriveError, DriverEvent};
use crate::node::{Configuration, DriveState, NodeDriver};
use crate::types::{BaudRate, NmtState, NodeId, INTEGER32, MAX_NODE_COUNT};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::TryFrom;
use log::{error, info, trace, warn};

/// Everything needed to bring a bus up: the dynamically loaded CAN driver,
/// the device it should attach to, and the bit rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub driver_library: String,
    pub device: String,
    pub baud: BaudRate,
}

impl ChannelConfig {
    pub fn new(driver_library: &str, device: &str, baud: BaudRate) -> Self {
        Self {
            driver_library: String::from(driver_library),
            device: String::from(device),
            baud,
        }
    }
}

/// One row of a channel snapshot: the observable state of a present node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorControllerData {
    pub node_id: u8,
    pub state: DriveState,
    pub angle: INTEGER32,
    pub angle_valid: bool,
}

/// A single CAN bus and the drives attached to it.
///
/// The channel owns its transport and its 128 node drivers. One call to
/// [`Channel::update`] drains the transport's pending events, then gives
/// every node driver one frame of work, rotating which node goes first so
/// that all present nodes get a fair share of the transport's limited SDO
/// queue slots.
pub struct Channel {
    driver: Box<dyn CanOpenDriver>,
    nodes: [NodeDriver; MAX_NODE_COUNT],
    frame_idx: u32,
    starting_node_id: u8,
    channel_idx: usize,
}

impl Channel {
    /// Opens the transport and builds the node table. Fails with
    /// [`DriveError::TransportOpenFailed`] if the named driver cannot be
    /// loaded or the bus cannot be opened; there are no retries.
    pub fn open(
        mut driver: Box<dyn CanOpenDriver>,
        config: &ChannelConfig,
        channel_idx: usize,
    ) -> Result<Self, DriveError> {
        driver.open(&config.driver_library, &config.device, config.baud)?;
        info!(
            "[CH{}] opened {} via {} at {}",
            channel_idx, config.device, config.driver_library, config.baud
        );
        Ok(Self {
            driver,
            nodes: core::array::from_fn(|node_id| NodeDriver::new(node_id as u8)),
            frame_idx: 0,
            starting_node_id: 0,
            channel_idx,
        })
    }

    /// Tears down every node driver, then the transport. Idempotent.
    pub fn close(&mut self) {
        for node in self.nodes.iter_mut() {
            node.reset();
        }
        self.driver.close();
        info!("[CH{}] closed", self.channel_idx);
    }

    /// Drives one channel round: route pending transport events, then tick
    /// all 128 node drivers starting from the rotating cursor.
    pub fn update(&mut self) {
        loop {
            let event = self.driver.poll_event();
            match event {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }

        self.frame_idx = self.frame_idx.wrapping_add(1);
        let start = self.starting_node_id as usize;
        let mut node_id = start;
        let mut next_start = None;

        for _ in 0..MAX_NODE_COUNT {
            self.nodes[node_id].tick(self.driver.as_mut(), self.frame_idx);

            // There is only a limited number of per-tick slots for SDO
            // messages. Rotating the starting node gives every known node
            // a turn at dispatching first.
            if next_start.is_none()
                && node_id != start
                && self.nodes[node_id].last_known_nmt() != NmtState::Unknown
            {
                next_start = Some(node_id as u8);
            }

            node_id = (node_id + 1) % MAX_NODE_COUNT;
        }

        if let Some(id) = next_start {
            self.starting_node_id = id;
        }
    }

    /// Routes one asynchronous transport notification to the right node
    /// driver. Normally invoked from `update`; embedders whose stack
    /// delivers callbacks directly may call it from the same context.
    pub fn handle_event(&mut self, event: DriverEvent) {
        match event {
            DriverEvent::HeartbeatError { error } => {
                warn!("[CH{}] heartbeat error {:#04X}", self.channel_idx, error);
            }
            DriverEvent::PostSync => trace!("[CH{}] sync", self.channel_idx),
            DriverEvent::PostTpdo => trace!("[CH{}] TPDO sent", self.channel_idx),
            DriverEvent::Emergency {
                node_id,
                error_code,
                error_register,
            } => {
                error!(
                    "[CH{}] emergency from node {}: {}",
                    self.channel_idx,
                    node_id,
                    emergency::describe(error_code, error_register)
                );
            }
            DriverEvent::SlaveBootup { node_id } => {
                info!("[CH{}] slave boot-up from node {}", self.channel_idx, node_id);
                if let Some(node) = self.node_driver_mut(node_id) {
                    node.tell_nmt(NmtState::PreOperational);
                }
            }
            DriverEvent::SdoWriteComplete { node_id } => {
                if let Some(node) = self.node_driver_mut(node_id) {
                    node.on_write_complete();
                }
            }
            DriverEvent::SdoWriteFailed {
                node_id,
                abort_code,
            } => {
                if let Some(node) = self.node_driver_mut(node_id) {
                    node.on_write_failed(abort_code);
                }
            }
            DriverEvent::SdoReadComplete { node_id, data, len } => {
                let len = (len as usize).min(data.len());
                if let Some(node) = self.node_driver_mut(node_id) {
                    node.on_read_complete(&data[..len]);
                }
            }
            DriverEvent::SdoReadFailed {
                node_id,
                abort_code,
            } => {
                if let Some(node) = self.node_driver_mut(node_id) {
                    node.on_read_failed(abort_code);
                }
            }
        }
    }

    // --- Bulk operations and operator forwards ---

    /// Assigns the position-control configuration to every node driver.
    /// Nodes that appear later replay it as soon as they boot.
    pub fn configure_all_motor_controllers_for_position_control(&mut self) {
        for node in self.nodes.iter_mut() {
            node.add_configuration(Configuration::PositionControl);
        }
    }

    pub fn set_motor_angle(&mut self, node_id: u8, angle: i32) {
        if let Some(node) = self.checked_node_mut(node_id) {
            node.set_desired_angle(angle);
        }
    }

    pub fn set_profile_velocity(&mut self, node_id: u8, velocity: u32) {
        if let Some(node) = self.checked_node_mut(node_id) {
            node.set_profile_velocity(velocity);
        }
    }

    pub fn set_maximum_following_error(&mut self, node_id: u8, error: i32) {
        if let Some(node) = self.checked_node_mut(node_id) {
            node.set_maximum_following_error(error);
        }
    }

    pub fn send_fault_reset(&mut self, node_id: u8) {
        if let Some(node) = self.checked_node_mut(node_id) {
            node.send_fault_reset();
        }
    }

    /// Collects `(node id, state, angle, angle valid)` for every present
    /// node, in ascending node-id order.
    pub fn snapshot(&self) -> Vec<MotorControllerData> {
        self.nodes
            .iter()
            .filter(|node| node.is_present())
            .map(|node| MotorControllerData {
                node_id: node.node_id(),
                state: node.state(),
                angle: node.angle(),
                angle_valid: node.is_angle_valid(),
            })
            .collect()
    }

    /// Read-only access to a node driver, for queries.
    pub fn node(&self, node_id: u8) -> Option<&NodeDriver> {
        self.nodes.get(node_id as usize)
    }

    pub fn frame_idx(&self) -> u32 {
        self.frame_idx
    }

    pub fn channel_idx(&self) -> usize {
        self.channel_idx
    }

    /// Demultiplexes a transport event by node id. Out-of-table ids are
    /// logged and dropped.
    fn node_driver_mut(&mut self, node_id: u8) -> Option<&mut NodeDriver> {
        let idx = node_id as usize;
        if idx >= MAX_NODE_COUNT {
            warn!(
                "[CH{}] event for node {} outside the node table",
                self.channel_idx, node_id
            );
            return None;
        }
        Some(&mut self.nodes[idx])
    }

    /// Validates an operator-supplied node id. Out-of-range ids are a
    /// logged no-op.
    fn checked_node_mut(&mut self, node_id: u8) -> Option<&mut NodeDriver> {
        match NodeId::try_from(node_id) {
            Ok(id) => Some(&mut self.nodes[id.index()]),
            Err(err) => {
                warn!("[CH{}] {}", self.channel_idx, err);
                None
            }
        }
    }
}
