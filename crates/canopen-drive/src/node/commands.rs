// crates/canopen-drive/src/node/commands.rs
//! Static command templates for node setup and one-shot tasks.
//!
//! Templates are plain arrays terminated by [`Action::Invalid`]. Task
//! builders stamp the operator's pending value into a fresh copy, so the
//! node driver never shares a mutable template.

use crate::action::Action;
use crate::dictionary::{
    CTRL_FAULT_RESET, CTRL_SHUTDOWN, CTRL_START_POSITIONING, CTRL_SWITCH_ON,
    DEFAULT_PROFILE_VELOCITY, MODE_PROFILE_POSITION, MOTION_PROFILE_SINUSOIDAL,
    OD_CONTROLWORD, OD_MAX_FOLLOWING_ERROR, OD_MODE_OF_OPERATION, OD_MOTION_PROFILE_TYPE,
    OD_PROFILE_VELOCITY, OD_TARGET_POSITION,
};
use crate::sdo::SdoField;

/// Setup list for [`super::Configuration::None`].
pub(crate) const NO_SETUP: [Action; 1] = [Action::Invalid];

/// Setup list for [`super::Configuration::PositionControl`]: select profile
/// position mode, apply the default profile velocity and motion profile,
/// then bring the power stage up through Shutdown and Switch On.
pub const POSITION_CONTROL_SETUP: [Action; 6] = [
    Action::SdoWrite(SdoField::write_u8(
        "Mode of Operation",
        OD_MODE_OF_OPERATION,
        0,
        MODE_PROFILE_POSITION,
    )),
    Action::SdoWrite(SdoField::write_u32(
        "Profile Velocity",
        OD_PROFILE_VELOCITY,
        0,
        DEFAULT_PROFILE_VELOCITY,
    )),
    Action::SdoWrite(SdoField::write_u16(
        "Motion Profile Type",
        OD_MOTION_PROFILE_TYPE,
        0,
        MOTION_PROFILE_SINUSOIDAL,
    )),
    Action::SdoWrite(SdoField::write_u16(
        "Controlword",
        OD_CONTROLWORD,
        0,
        CTRL_SHUTDOWN,
    )),
    Action::SdoWrite(SdoField::write_u16(
        "Controlword",
        OD_CONTROLWORD,
        0,
        CTRL_SWITCH_ON,
    )),
    Action::Invalid,
];

/// Target position followed by the start-positioning controlword.
pub(crate) const fn desired_angle_commands(angle: i32) -> [Action; 3] {
    [
        Action::SdoWrite(SdoField::write_s32(
            "Target Position",
            OD_TARGET_POSITION,
            0,
            angle,
        )),
        Action::SdoWrite(SdoField::write_u16(
            "Controlword",
            OD_CONTROLWORD,
            0,
            CTRL_START_POSITIONING,
        )),
        Action::Invalid,
    ]
}

/// Fault reset followed by re-enabling the power stage.
pub(crate) const fn fault_reset_commands() -> [Action; 4] {
    [
        Action::SdoWrite(SdoField::write_u16(
            "Controlword",
            OD_CONTROLWORD,
            0,
            CTRL_FAULT_RESET,
        )),
        Action::SdoWrite(SdoField::write_u16(
            "Controlword",
            OD_CONTROLWORD,
            0,
            CTRL_SHUTDOWN,
        )),
        Action::SdoWrite(SdoField::write_u16(
            "Controlword",
            OD_CONTROLWORD,
            0,
            CTRL_SWITCH_ON,
        )),
        Action::Invalid,
    ]
}

pub(crate) const fn profile_velocity_commands(velocity: u32) -> [Action; 2] {
    [
        Action::SdoWrite(SdoField::write_u32(
            "Profile Velocity",
            OD_PROFILE_VELOCITY,
            0,
            velocity,
        )),
        Action::Invalid,
    ]
}

pub(crate) const fn max_following_error_commands(error: u32) -> [Action; 2] {
    [
        Action::SdoWrite(SdoField::write_u32(
            "Max Following Error",
            OD_MAX_FOLLOWING_ERROR,
            0,
            error,
        )),
        Action::Invalid,
    ]
}
