use core::convert::TryFrom;
use core::fmt;

// --- Primitive Types (Based on CiA 301 Section 7.1) ---
// These aliases ensure compatibility with object dictionary definitions
// (UNSIGNEDn / INTEGERn).

/// Alias for UNSIGNED8 (8-bit unsigned integer)
pub type UNSIGNED8 = u8;
/// Alias for UNSIGNED16 (16-bit unsigned integer)
pub type UNSIGNED16 = u16;
/// Alias for UNSIGNED32 (32-bit unsigned integer)
pub type UNSIGNED32 = u32;
/// Alias for INTEGER32 (32-bit signed integer)
pub type INTEGER32 = i32;

/// Represents a CANopen Node ID, wrapping a `u8` to ensure type safety.
///
/// Valid Node IDs are in the range 1-127. Node id 0 is the NMT broadcast
/// address and never identifies a drive. This newtype pattern prevents
/// accidental use of invalid `u8` values where a `NodeId` is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u8);

impl NodeId {
    /// Index of this node's driver slot in a channel's node table.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

// --- Protocol Constants ---

/// CANopen NMT broadcast address. Never polled.
pub const BROADCAST_NODE_ID: u8 = 0;

/// Number of node-driver slots owned by a channel (node ids 0-127).
pub const MAX_NODE_COUNT: usize = 128;

/// Maximum number of CAN channels a single process may hold open.
pub const MAX_CAN_CHANNELS: usize = 2;

/// Number of frames after which a cached statusword is considered stale
/// and re-read in preference to the position poll.
pub const STATUS_POLL_INTERVAL_FRAMES: u32 = 100;

/// Error type for invalid Node ID creation.
#[derive(Debug, PartialEq, Eq)]
pub enum NodeIdError {
    /// Node ID is outside the valid range (1-127).
    InvalidRange(u8),
}

impl fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeIdError::InvalidRange(value) => {
                write!(f, "Invalid NodeId value: {}. Valid range is 1-127.", value)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NodeIdError {}

impl TryFrom<u8> for NodeId {
    type Error = NodeIdError;

    /// Creates a `NodeId` from a `u8`, returning an error if the value is
    /// not a valid drive identifier (1-127).
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=127 => Ok(NodeId(value)),
            _ => Err(NodeIdError::InvalidRange(value)),
        }
    }
}

impl From<NodeId> for u8 {
    /// Converts a `NodeId` back into its underlying `u8` representation.
    /// This conversion is infallible.
    fn from(node_id: NodeId) -> Self {
        node_id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The last NMT state a node was observed in.
///
/// `Unknown` means no NMT notification has ever been received for the node;
/// a channel uses this to tell present nodes apart from empty bus addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NmtState {
    #[default]
    Unknown,
    Initialisation,
    PreOperational,
    Operational,
    Stopped,
}

/// Bit rates supported by the underlying CAN drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    Baud1M,
    Baud500K,
    Baud250K,
    Baud125K,
    Baud100K,
    Baud50K,
    Baud20K,
    Baud10K,
    Baud5K,
}

impl BaudRate {
    /// The rate string understood by dynamically loaded CAN drivers.
    pub fn as_str(&self) -> &'static str {
        match self {
            BaudRate::Baud1M => "1M",
            BaudRate::Baud500K => "500K",
            BaudRate::Baud250K => "250K",
            BaudRate::Baud125K => "125K",
            BaudRate::Baud100K => "100K",
            BaudRate::Baud50K => "50K",
            BaudRate::Baud20K => "20K",
            BaudRate::Baud10K => "10K",
            BaudRate::Baud5K => "5K",
        }
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_range_is_enforced() {
        assert_eq!(NodeId::try_from(0), Err(NodeIdError::InvalidRange(0)));
        assert_eq!(NodeId::try_from(1), Ok(NodeId(1)));
        assert_eq!(NodeId::try_from(127), Ok(NodeId(127)));
        assert_eq!(NodeId::try_from(128), Err(NodeIdError::InvalidRange(128)));
        assert_eq!(NodeId::try_from(255), Err(NodeIdError::InvalidRange(255)));
    }

    #[test]
    fn baud_rate_strings_match_driver_convention() {
        assert_eq!(BaudRate::Baud1M.as_str(), "1M");
        assert_eq!(BaudRate::Baud5K.as_str(), "5K");
    }
}
