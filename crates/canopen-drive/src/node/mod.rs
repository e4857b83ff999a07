// crates/canopen-drive/src/node/mod.rs
//! The per-node protocol driver.
//!
//! One `NodeDriver` exists for every address on a channel. Each holds a
//! small stack of state machines: the top-level lifecycle (inactive, setting
//! up, running), a prioritised one-shot task dispatcher, and one sub-state
//! machine per SDO direction so that at most one read and one write are in
//! flight per node at any tick.

pub mod commands;
mod driver;
mod tick;

pub use driver::NodeDriver;

/// Top-level lifecycle of a node driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveState {
    /// Nothing to do; no configuration assigned or node never seen.
    #[default]
    Inactive,
    /// Replaying the active configuration's command list onto the node.
    SettingUp,
    /// Configured; dispatching operator tasks and polling telemetry.
    Running,
    /// Reserved homing mode. No transition enters it yet; it polls like
    /// `Running`.
    Homing,
}

/// The configuration a node driver applies before it starts running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Configuration {
    #[default]
    None,
    /// CiA 402 profile-position mode with a sinusoidal motion profile.
    PositionControl,
}

impl Configuration {
    /// The sentinel-terminated command list replayed during setup.
    pub fn setup_commands(&self) -> &'static [crate::action::Action] {
        match self {
            Configuration::None => &commands::NO_SETUP,
            Configuration::PositionControl => &commands::POSITION_CONTROL_SETUP,
        }
    }
}

/// A one-shot operator task being executed by the running dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningTask {
    SetDesiredAngle,
    SendFaultReset,
    SetProfileVelocity,
    SetMaximumFollowingError,
}

/// State of one SDO direction's exchange with the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum SdoExchangeState {
    #[default]
    Inactive,
    Active,
}
