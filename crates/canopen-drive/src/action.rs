// crates/canopen-drive/src/action.rs
use crate::sdo::SdoField;
use crate::types::NmtState;

/// How an [`Action::EnsureNmtState`] step should reach the desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureMode {
    /// Wait for the node to report the state on its own.
    Passive,
    /// Command the state change if the node is not there yet. Reserved;
    /// currently degrades to waiting.
    Active,
}

/// One step of a node command list.
///
/// Command lists are fixed arrays terminated by the `Invalid` sentinel, so
/// they can be statically allocated and patched in place without heap
/// allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// End-of-list sentinel.
    #[default]
    Invalid,
    /// Hold this step until the node's last known NMT state matches.
    EnsureNmtState { mode: EnsureMode, desired: NmtState },
    /// Dispatch one SDO download.
    SdoWrite(SdoField),
}

impl Action {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Action::Invalid)
    }
}
