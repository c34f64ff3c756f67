//! Protocol constants for the Alienware lighting controller
//!
//! The controller speaks a half-duplex request/response protocol over USB
//! class control transfers. Every request is a 9-byte packet:
//!
//! ```text
//! [0x02] [opcode] [arguments ...] [0x00 padding ...]
//! ```

/// USB control transfer parameters
pub mod usb {
    /// bmRequestType for host-to-device writes (class, interface)
    pub const SEND_REQUEST_TYPE: u8 = 0x21;
    /// bRequest for writes (SET_REPORT)
    pub const SEND_REQUEST: u8 = 0x09;
    pub const SEND_VALUE: u16 = 0x202;
    pub const SEND_INDEX: u16 = 0x00;

    /// bmRequestType for device-to-host reads (class, interface)
    pub const READ_REQUEST_TYPE: u8 = 0xA1;
    /// bRequest for reads (GET_REPORT)
    pub const READ_REQUEST: u8 = 0x01;
    pub const READ_VALUE: u16 = 0x101;
    pub const READ_INDEX: u16 = 0x00;

    /// Interface holding the lighting controller
    pub const INTERFACE: u8 = 0;
    /// Configuration selected during take-over
    pub const CONFIGURATION: u8 = 1;
}

/// Packet framing constants
pub mod packet {
    /// Every packet is exactly this long
    pub const DATA_LENGTH: usize = 9;
    pub const START_BYTE: u8 = 0x02;
    pub const FILL_BYTE: u8 = 0x00;
}

/// Controller opcodes
pub mod cmd {
    pub const END_STORAGE: u8 = 0x00;
    pub const SET_MORPH: u8 = 0x01;
    pub const SET_PULSE: u8 = 0x02;
    pub const SET_COLOR: u8 = 0x03;
    pub const END_LOOP: u8 = 0x04;
    pub const TRANSMIT_EXECUTE: u8 = 0x05;
    pub const GET_STATUS: u8 = 0x06;
    pub const RESET: u8 = 0x07;
    pub const SET_MODE: u8 = 0x08;
    pub const SAVE: u8 = 0x09;
    pub const SET_SPEED: u8 = 0x0E;
    pub const BATTERY_STATE: u8 = 0x0F;

    /// Opcode ↔ name table, used for log messages in both directions
    const NAMES: &[(u8, &str)] = &[
        (END_STORAGE, "END_STORAGE"),
        (SET_MORPH, "SET_MORPH"),
        (SET_PULSE, "SET_PULSE"),
        (SET_COLOR, "SET_COLOR"),
        (END_LOOP, "END_LOOP"),
        (TRANSMIT_EXECUTE, "TRANSMIT_EXECUTE"),
        (GET_STATUS, "GET_STATUS"),
        (RESET, "RESET"),
        (SET_MODE, "SET_MODE"),
        (SAVE, "SAVE"),
        (SET_SPEED, "SET_SPEED"),
        (BATTERY_STATE, "BATTERY_STATE"),
    ];

    /// Get human-readable name for an opcode
    pub fn name(cmd: u8) -> &'static str {
        NAMES
            .iter()
            .find(|(c, _)| *c == cmd)
            .map(|(_, n)| *n)
            .unwrap_or("UNKNOWN")
    }
}

/// Reset types carried by the RESET opcode
pub mod reset {
    pub const TOUCH_CONTROLS: u8 = 0x01;
    pub const SLEEP_LIGHTS_ON: u8 = 0x02;
    pub const ALL_LIGHTS_OFF: u8 = 0x03;
    pub const ALL_LIGHTS_ON: u8 = 0x04;
}

/// Status bytes returned in reply to GET_STATUS
pub mod status {
    pub const READY: u8 = 0x10;
    pub const BUSY: u8 = 0x11;
    pub const UNKNOWN_COMMAND: u8 = 0x12;

    /// Controller is ready for the next request
    pub const OK: u8 = READY;

    pub fn name(status: u8) -> &'static str {
        match status {
            READY => "READY",
            BUSY => "BUSY",
            UNKNOWN_COMMAND => "UNKNOWN_COMMAND",
            _ => "UNKNOWN",
        }
    }
}

/// Timing and retry budgets
pub mod timing {
    /// Timeout for a single control transfer (ms)
    pub const TRANSFER_TIMEOUT_MS: u64 = 1000;
    /// Sleep between readiness polls (ms)
    pub const WAIT_FOR_OK_SLEEP_MS: u64 = 10;
    /// Readiness polls before giving up (~5 seconds)
    pub const WAIT_FOR_OK_MAX_TRIES: usize = 500;
}

/// Limits imposed by the controller firmware
pub mod limits {
    /// Maximum theme tempo
    pub const MAX_SPEED: u16 = 0xFFFF;
    /// Maximum command count inside one zone loop
    pub const ZONE_MAX_CONFIGURATIONS: usize = 0x0F;
    /// Zone loops per mode; the loop index is one byte and 0 is reserved
    pub const MAX_ZONE_LOOPS: usize = 0xFF;
    /// Zone masks are 24-bit
    pub const MAX_ZONE_MASK: u32 = 0xFF_FFFF;
}

/// Device identification constants
pub mod device {
    /// Dell / Alienware vendor ID
    pub const VENDOR_ID: u16 = 0x187C;
}
