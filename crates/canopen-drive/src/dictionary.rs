//! The slice of the CiA 402 object dictionary this library talks to.
//!
//! Only the SDO index/sub-index/value contracts are defined here; the
//! drive-side binary layout of the dictionary is the node's business.

use crate::types::{UNSIGNED16, UNSIGNED32, UNSIGNED8};

/// Controlword (u16). Drives the power-stage state machine.
pub const OD_CONTROLWORD: u16 = 0x6040;
/// Statusword (u16). Bit 10 = target reached, bit 3 = fault.
pub const OD_STATUSWORD: u16 = 0x6041;
/// Mode of operation (u8). 1 = profile position mode.
pub const OD_MODE_OF_OPERATION: u16 = 0x6060;
/// Position actual value (s32, encoder ticks).
pub const OD_POSITION_ACTUAL: u16 = 0x6064;
/// Maximum following error (u32).
pub const OD_MAX_FOLLOWING_ERROR: u16 = 0x6065;
/// Target position (s32, encoder ticks).
pub const OD_TARGET_POSITION: u16 = 0x607A;
/// Profile velocity (u32, encoder ticks per second).
pub const OD_PROFILE_VELOCITY: u16 = 0x6081;
/// Motion profile type (u16). 1 = sinusoidal.
pub const OD_MOTION_PROFILE_TYPE: u16 = 0x6086;

// --- Controlword commands ---

/// "Shutdown": ready the power stage.
pub const CTRL_SHUTDOWN: UNSIGNED16 = 0x0006;
/// "Switch On": enable operation.
pub const CTRL_SWITCH_ON: UNSIGNED16 = 0x000F;
/// "Start Positioning": new set-point, change set immediately.
pub const CTRL_START_POSITIONING: UNSIGNED16 = 0x003F;
/// "Fault Reset".
pub const CTRL_FAULT_RESET: UNSIGNED16 = 0x0080;

// --- Statusword bits ---

/// Set when the drive signals a fault.
pub const STATUS_BIT_FAULT: UNSIGNED16 = 1 << 3;
/// Set when the last commanded target position has been reached.
pub const STATUS_BIT_TARGET_REACHED: UNSIGNED16 = 1 << 10;

// --- Dictionary values ---

/// Mode-of-operation value selecting profile position mode.
pub const MODE_PROFILE_POSITION: UNSIGNED8 = 1;
/// Motion-profile-type value selecting a sinusoidal ramp.
pub const MOTION_PROFILE_SINUSOIDAL: UNSIGNED16 = 1;
/// Profile velocity applied during position-control setup.
pub const DEFAULT_PROFILE_VELOCITY: UNSIGNED32 = 500;
