// crates/canopen-drive/tests/simulator/mod.rs
#![allow(dead_code)] // each test binary uses a different slice of the harness

pub mod interface;

pub use interface::{FakeCanOpen, FakeTransportState, SdoRequest};

use canopen_drive::{BaudRate, Channel, ChannelConfig, DriveState, DriverEvent};
use std::cell::RefCell;
use std::rc::Rc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Opens a channel over a fresh simulated transport and hands back the
/// shared transport state for steering and inspection.
pub fn open_channel() -> (Channel, Rc<RefCell<FakeTransportState>>) {
    let (driver, state) = FakeCanOpen::new();
    let config = ChannelConfig::new("libfake_can.so", "/dev/can0", BaudRate::Baud1M);
    let channel = Channel::open(Box::new(driver), &config, 0).expect("simulated open never fails");
    (channel, state)
}

/// Queues a boot-up notification; the channel picks it up on its next
/// update.
pub fn boot_node(state: &Rc<RefCell<FakeTransportState>>, node_id: u8) {
    state
        .borrow_mut()
        .events
        .push_back(DriverEvent::SlaveBootup { node_id });
}

pub fn run_ticks(channel: &mut Channel, ticks: u32) {
    for _ in 0..ticks {
        channel.update();
    }
}

/// Configures, boots and ticks `node_id` until it reaches `Running`.
pub fn bring_to_running(
    channel: &mut Channel,
    state: &Rc<RefCell<FakeTransportState>>,
    node_id: u8,
) {
    channel.configure_all_motor_controllers_for_position_control();
    boot_node(state, node_id);
    for _ in 0..50 {
        channel.update();
        if channel.node(node_id).unwrap().state() == DriveState::Running {
            return;
        }
    }
    panic!("node {} never reached Running", node_id);
}

/// All accepted writes for one node, as `(index, sub_index, payload)`.
pub fn writes_for(state: &Rc<RefCell<FakeTransportState>>, node_id: u8) -> Vec<(u16, u8, Vec<u8>)> {
    state
        .borrow()
        .requests
        .iter()
        .filter_map(|request| match request {
            SdoRequest::Write {
                node_id: id,
                index,
                sub_index,
                data,
            } if *id == node_id => Some((*index, *sub_index, data.clone())),
            _ => None,
        })
        .collect()
}

/// All accepted read indices for one node, in dispatch order.
pub fn reads_for(state: &Rc<RefCell<FakeTransportState>>, node_id: u8) -> Vec<u16> {
    state
        .borrow()
        .requests
        .iter()
        .filter_map(|request| match request {
            SdoRequest::Read {
                node_id: id, index, ..
            } if *id == node_id => Some(*index),
            _ => None,
        })
        .collect()
}
