// crates/canopen-drive-monitor/src/lib.rs
//! Diagnostic DTOs for embedders and monitoring frontends.
//!
//! The core crate keeps its state machines lean; this crate turns their
//! observable state into serializable snapshots (e.g. JSON for a web
//! monitor) without the core having to know about serde.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod model;

pub use model::{ChannelSnapshot, MotorInfo};
