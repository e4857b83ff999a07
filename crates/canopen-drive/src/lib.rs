#![cfg_attr(not(feature = "std"), no_std)]

// 'alloc' is used for dynamic allocation (e.g., Vec<MotorControllerData>
// snapshots and boxed driver objects).
extern crate alloc;

// --- Foundation Modules ---
pub mod types;
pub mod hal;
pub mod dictionary;

// --- Protocol Value Types ---
pub mod sdo;
pub mod action;
pub mod emergency;

// --- Per-Node and Per-Bus State Machines ---
pub mod node;
pub mod channel;
pub mod library;

// Export core types and the driver abstraction
pub use types::{BaudRate, NmtState, NodeId, UNSIGNED8, UNSIGNED16, UNSIGNED32, INTEGER32};
pub use hal::{CanOpenDriver, DriveError, DriverEvent, DriverFactory};
pub use sdo::{ReadTarget, SdoDirection, SdoField};
pub use action::{Action, EnsureMode};
pub use node::{Configuration, DriveState, NodeDriver, RunningTask};
pub use channel::{Channel, ChannelConfig, MotorControllerData};
pub use library::{ChannelHandle, ChannelManager};
