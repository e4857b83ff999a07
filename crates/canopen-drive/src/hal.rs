// crates/canopen-drive/src/hal.rs
use crate::types::{BaudRate, NodeIdError};
use alloc::boxed::Box;
use core::fmt;

/// Defines a portable, descriptive Error type for the drive controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveError {
    /// The named CAN driver could not be loaded or the bus could not be
    /// opened. Not retried.
    TransportOpenFailed,
    /// No free channel slot is available (or the requested slot is taken).
    SlotExhausted,
    /// The requested channel slot index is outside the compiled-in table.
    SlotOutOfRange(usize),
    /// A value is not a valid drive NodeId.
    InvalidNodeId(u8),
    /// The library facade has not been initialised yet.
    NotInitialised,
}

impl fmt::Display for DriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportOpenFailed => write!(f, "Unable to set up CAN bus"),
            Self::SlotExhausted => write!(f, "No free CAN channel slot"),
            Self::SlotOutOfRange(idx) => write!(f, "Channel slot {} out of range", idx),
            Self::InvalidNodeId(v) => write!(f, "Invalid NodeId: {}", v),
            Self::NotInitialised => write!(f, "Drive library not initialised"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DriveError {}

impl From<NodeIdError> for DriveError {
    fn from(err: NodeIdError) -> Self {
        match err {
            NodeIdError::InvalidRange(val) => DriveError::InvalidNodeId(val),
        }
    }
}

/// An asynchronous notification produced by the CANopen transport.
///
/// The channel drains these from [`CanOpenDriver::poll_event`] at the start
/// of every `update`, so all node state is mutated from the ticking context
/// regardless of how the underlying stack delivers its callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    /// A heartbeat consumer timed out.
    HeartbeatError { error: u8 },
    /// A SYNC object passed on the bus.
    PostSync,
    /// A transmit PDO was sent.
    PostTpdo,
    /// An emergency object arrived from a node.
    Emergency {
        node_id: u8,
        error_code: u16,
        error_register: u8,
    },
    /// A slave signalled boot-up; it is now in NMT PreOperational.
    SlaveBootup { node_id: u8 },
    /// A previously queued SDO write was acknowledged by the node.
    SdoWriteComplete { node_id: u8 },
    /// A previously queued SDO write was aborted by the node or the stack.
    SdoWriteFailed { node_id: u8, abort_code: u32 },
    /// A previously queued SDO read delivered data (expedited, at most 8
    /// bytes).
    SdoReadComplete {
        node_id: u8,
        data: [u8; 8],
        len: u8,
    },
    /// A previously queued SDO read was aborted by the node or the stack.
    SdoReadFailed { node_id: u8, abort_code: u32 },
}

/// Abstraction over the concrete CANopen master stack.
///
/// This trait is the portability seam: any CANopen library can back it, and
/// the core never references the underlying stack's types, threading or
/// timers. All queueing calls are non-blocking; a `false` return means the
/// transport's queue was full and the caller retries on a later tick.
///
/// The transport must deliver exactly one completion event per accepted
/// SDO request.
pub trait CanOpenDriver {
    /// Loads the named dynamic CAN driver and opens the bus device.
    fn open(
        &mut self,
        driver_library: &str,
        device: &str,
        baud: BaudRate,
    ) -> Result<(), DriveError>;

    /// Shuts the bus down. Idempotent.
    fn close(&mut self);

    /// Queues an expedited SDO upload from `node_id`. Returns whether the
    /// request was accepted into the transport's queue.
    fn queue_sdo_read(&mut self, node_id: u8, index: u16, sub_index: u8) -> bool;

    /// Queues an expedited SDO download of `data` to `node_id`. Returns
    /// whether the request was accepted into the transport's queue.
    fn queue_sdo_write(&mut self, node_id: u8, index: u16, sub_index: u8, data: &[u8]) -> bool;

    /// Takes the next pending asynchronous notification, if any.
    fn poll_event(&mut self) -> Option<DriverEvent>;
}

/// Creates driver instances for newly opened channels.
///
/// Registered once with [`crate::ChannelManager::initialise`]; each call to
/// `open_channel` asks the factory for a fresh transport to own.
pub trait DriverFactory {
    fn create(&self) -> Box<dyn CanOpenDriver>;
}
