// crates/canopen-drive/src/emergency.rs
//! Translation of drive emergency objects into readable diagnostics.

use alloc::borrow::Cow;
use alloc::format;

/// The `(error code, error register)` pairs a drive emits in emergency
/// objects, with the message each pair stands for.
const EMERGENCY_MESSAGES: [(u16, u8, &str); 26] = [
    (0x0000, 0x00, "No Error"),
    (0x1000, 0x01, "Generic Error"),
    (0x2310, 0x02, "Over Current"),
    (0x3210, 0x04, "Over Voltage"),
    (0x3220, 0x04, "Under Voltage"),
    (0x4210, 0x08, "Over Temperature"),
    (0x5113, 0x04, "+5V too low"),
    (0x6100, 0x20, "Internal Software Error"),
    (0x6320, 0x20, "Software Parameter Error"),
    (0x7320, 0x20, "Sensor Position Error"),
    (0x8110, 0x10, "CAN Overrun Error (Objects lost)"),
    (0x8111, 0x10, "CAN Overrun Error"),
    (0x8120, 0x10, "CAN Passive Mode Error"),
    (0x8130, 0x10, "CAN Life Guard Error"),
    (0x8150, 0x10, "CAN Transmit COB-ID Collision"),
    (0x81FD, 0x10, "CAN Bus Off"),
    (0x81FE, 0x10, "CAN Rx Queue Overrun"),
    (0x81FF, 0x10, "CAN Tx Queue Overrun"),
    (0x8210, 0x10, "CAN PDO Length Error"),
    (0x8611, 0x20, "Following Error"),
    (0xFF01, 0x80, "Hall Sensor Error"),
    (0xFF02, 0x80, "Index Processing Error"),
    (0xFF03, 0x80, "Encoder Resolution Error"),
    (0xFF04, 0x80, "Hall Sensor Not Found"),
    (0xFF06, 0x80, "Negative Limit Switch Error"),
    (0xFF0B, 0x20, "System Overloaded"),
];

/// Resolves an emergency `(error code, error register)` pair to a
/// human-readable message.
pub fn describe(error_code: u16, error_register: u8) -> Cow<'static, str> {
    for &(code, register, message) in EMERGENCY_MESSAGES.iter() {
        if code == error_code && register == error_register {
            return Cow::Borrowed(message);
        }
    }
    Cow::Owned(format!(
        "Unrecognised error message 0x{:X} - 0x{:X}",
        error_code, error_register
    ))
}
