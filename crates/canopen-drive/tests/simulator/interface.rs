// crates/canopen-drive/tests/simulator/interface.rs
use canopen_drive::{BaudRate, CanOpenDriver, DriveError, DriverEvent};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// One accepted transport request, recorded in global dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdoRequest {
    Read {
        node_id: u8,
        index: u16,
        sub_index: u8,
    },
    Write {
        node_id: u8,
        index: u16,
        sub_index: u8,
        data: Vec<u8>,
    },
}

impl SdoRequest {
    pub fn node_id(&self) -> u8 {
        match self {
            SdoRequest::Read { node_id, .. } | SdoRequest::Write { node_id, .. } => *node_id,
        }
    }
}

/// Shared state of the simulated transport, inspected and steered by the
/// tests while the channel owns the driver itself.
pub struct FakeTransportState {
    pub opened: Option<(String, String, BaudRate)>,
    pub closed: bool,
    pub fail_open: bool,
    pub accept_reads: bool,
    pub accept_writes: bool,
    /// When set, an accepted write is acknowledged on the next event drain.
    pub auto_complete_writes: bool,
    /// When set, an accepted read is answered on the next event drain with
    /// the canned replies below.
    pub auto_complete_reads: bool,
    pub status_reply: u16,
    pub position_reply: i32,
    pub requests: Vec<SdoRequest>,
    pub events: VecDeque<DriverEvent>,
}

impl FakeTransportState {
    fn new() -> Self {
        Self {
            opened: None,
            closed: false,
            fail_open: false,
            accept_reads: true,
            accept_writes: true,
            auto_complete_writes: true,
            auto_complete_reads: true,
            status_reply: 0x0237,
            position_reply: 0,
            requests: Vec::new(),
            events: VecDeque::new(),
        }
    }
}

/// A simulated CANopen transport that buffers requests and notifications
/// in memory.
pub struct FakeCanOpen {
    state: Rc<RefCell<FakeTransportState>>,
}

impl FakeCanOpen {
    /// Builds a driver plus the shared handle the test keeps.
    pub fn new() -> (Self, Rc<RefCell<FakeTransportState>>) {
        let state = Rc::new(RefCell::new(FakeTransportState::new()));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl CanOpenDriver for FakeCanOpen {
    fn open(&mut self, driver_library: &str, device: &str, baud: BaudRate) -> Result<(), DriveError> {
        let mut state = self.state.borrow_mut();
        if state.fail_open {
            return Err(DriveError::TransportOpenFailed);
        }
        state.opened = Some((driver_library.to_string(), device.to_string(), baud));
        Ok(())
    }

    fn close(&mut self) {
        self.state.borrow_mut().closed = true;
    }

    fn queue_sdo_read(&mut self, node_id: u8, index: u16, sub_index: u8) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.accept_reads {
            return false;
        }
        state.requests.push(SdoRequest::Read {
            node_id,
            index,
            sub_index,
        });
        if state.auto_complete_reads {
            let mut data = [0u8; 8];
            let len = match index {
                0x6041 => {
                    data[..2].copy_from_slice(&state.status_reply.to_le_bytes());
                    2
                }
                0x6064 => {
                    data[..4].copy_from_slice(&state.position_reply.to_le_bytes());
                    4
                }
                _ => 4,
            };
            state
                .events
                .push_back(DriverEvent::SdoReadComplete { node_id, data, len });
        }
        true
    }

    fn queue_sdo_write(&mut self, node_id: u8, index: u16, sub_index: u8, data: &[u8]) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.accept_writes {
            return false;
        }
        state.requests.push(SdoRequest::Write {
            node_id,
            index,
            sub_index,
            data: data.to_vec(),
        });
        if state.auto_complete_writes {
            state
                .events
                .push_back(DriverEvent::SdoWriteComplete { node_id });
        }
        true
    }

    fn poll_event(&mut self) -> Option<DriverEvent> {
        self.state.borrow_mut().events.pop_front()
    }
}
