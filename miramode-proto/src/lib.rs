//! Mira valve wire protocol - checksums, frame building and state parsing
//!
//! The valve speaks a small binary protocol over two GATT characteristics:
//! trigger and command frames are written to [`CHAR_WRITE`], and the valve
//! answers with state notifications on [`CHAR_READ`]. This crate is pure
//! bytes; the session crate owns sequencing and the BLE crate owns I/O.

mod crc;
mod frame;

pub use crc::crc16;
pub use frame::{Command, DecodeError, DeviceState, Trigger, celsius_to_raw, raw_to_celsius};

use uuid::Uuid;

/// Read/notify characteristic: the valve pushes state notifications here.
pub const CHAR_READ: Uuid = Uuid::from_u128(0xbccb0003_ca66_11e5_88a4_0002a5d5c51b);

/// Write characteristic: trigger and command frames go here.
pub const CHAR_WRITE: Uuid = Uuid::from_u128(0xbccb0002_ca66_11e5_88a4_0002a5d5c51b);

/// Command opcode: full-state write (temperature plus both outlet flags).
pub const COMMAND_OPCODE: [u8; 4] = [0x87, 0x05, 0x01, 0x01];

/// Trigger opcode: asks the valve to emit one state notification.
pub const TRIGGER_OPCODE: [u8; 4] = [0x07, 0x00, 0x45, 0x8A];

/// Flag byte the firmware uses for "outlet running".
pub const FLAG_ON: u8 = 0x64;

/// Wire length of a trigger frame.
pub const TRIGGER_LEN: usize = 5;

/// Wire length of a command frame, CRC included.
pub const COMMAND_LEN: usize = 10;

/// Wire length of a full state notification. The BLE stack sometimes drops
/// the leading byte and delivers one less.
pub const NOTIFICATION_LEN: usize = 14;
