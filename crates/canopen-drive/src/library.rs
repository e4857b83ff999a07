// crates/canopen-drive/src/library.rs
//! Process-wide lifecycle: a small, bounded, explicitly initialised table
//! of channel slots handed out as stable opaque handles.

use crate::channel::{Channel, ChannelConfig};
use crate::hal::{DriveError, DriverFactory};
use crate::types::MAX_CAN_CHANNELS;
use alloc::boxed::Box;
use log::{info, warn};

/// Stable, copyable handle to an open channel slot.
///
/// Handles stay valid for the lifetime of the channel they were issued
/// for; closing the channel frees the slot for reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(usize);

impl ChannelHandle {
    pub fn slot(&self) -> usize {
        self.0
    }
}

/// Owner of every channel a process may open.
///
/// Embedders build one of these, register the driver factory once with
/// [`ChannelManager::initialise`], and address channels through the
/// handles `open_channel` returns. Foreign-function shims that need a
/// process-global instance wrap this in a `static` behind their own lock.
pub struct ChannelManager {
    started: bool,
    factory: Option<Box<dyn DriverFactory>>,
    channels: [Option<Channel>; MAX_CAN_CHANNELS],
}

impl ChannelManager {
    pub fn new() -> Self {
        Self {
            started: false,
            factory: None,
            channels: core::array::from_fn(|_| None),
        }
    }

    /// Registers the transport factory. Idempotent: repeated calls keep
    /// the first factory and report success.
    pub fn initialise(&mut self, factory: Box<dyn DriverFactory>) -> bool {
        if self.started {
            return true;
        }
        self.factory = Some(factory);
        self.started = true;
        true
    }

    /// Closes every open channel and forgets the factory.
    pub fn deinitialise(&mut self) {
        for slot in self.channels.iter_mut() {
            if let Some(channel) = slot.as_mut() {
                channel.close();
            }
            *slot = None;
        }
        self.factory = None;
        self.started = false;
    }

    /// Opens a channel in the first free slot, or in `slot` if requested.
    ///
    /// Failures are logged and surfaced as an error; the slot table is
    /// left untouched.
    pub fn open_channel(
        &mut self,
        config: ChannelConfig,
        slot: Option<usize>,
    ) -> Result<ChannelHandle, DriveError> {
        let result = self.try_open_channel(config, slot);
        if let Err(err) = &result {
            warn!("open_channel failed: {}", err);
        }
        result
    }

    fn try_open_channel(
        &mut self,
        config: ChannelConfig,
        slot: Option<usize>,
    ) -> Result<ChannelHandle, DriveError> {
        if !self.started {
            return Err(DriveError::NotInitialised);
        }
        let slot_idx = match slot {
            Some(idx) if idx >= MAX_CAN_CHANNELS => return Err(DriveError::SlotOutOfRange(idx)),
            Some(idx) => {
                if self.channels[idx].is_some() {
                    return Err(DriveError::SlotExhausted);
                }
                idx
            }
            None => self
                .channels
                .iter()
                .position(Option::is_none)
                .ok_or(DriveError::SlotExhausted)?,
        };
        let factory = self.factory.as_ref().ok_or(DriveError::NotInitialised)?;
        let channel = Channel::open(factory.create(), &config, slot_idx)?;
        self.channels[slot_idx] = Some(channel);
        info!("channel slot {} opened", slot_idx);
        Ok(ChannelHandle(slot_idx))
    }

    /// Tears the channel down and frees its slot. Unknown or already
    /// closed handles are ignored.
    pub fn close_channel(&mut self, handle: ChannelHandle) {
        if let Some(slot) = self.channels.get_mut(handle.0) {
            if let Some(channel) = slot.as_mut() {
                channel.close();
            }
            *slot = None;
        }
    }

    pub fn channel(&self, handle: ChannelHandle) -> Option<&Channel> {
        self.channels.get(handle.0).and_then(Option::as_ref)
    }

    pub fn channel_mut(&mut self, handle: ChannelHandle) -> Option<&mut Channel> {
        self.channels.get_mut(handle.0).and_then(Option::as_mut)
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new()
    }
}
