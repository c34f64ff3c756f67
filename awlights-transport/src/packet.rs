//! Type-safe packet builders for the lighting controller
//!
//! Each opcode gets a small struct implementing [`LightCommand`]. The
//! framing (start byte, opcode, zero padding to nine bytes) lives in
//! [`define_packet`] so the per-opcode code only deals with arguments.

use std::fmt;

use thiserror::Error;

use crate::protocol::{cmd, limits, packet, reset};
use crate::types::{PackedColor, ZoneMask};

/// A complete request, always exactly [`packet::DATA_LENGTH`] bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet([u8; packet::DATA_LENGTH]);

impl Packet {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn opcode(&self) -> u8 {
        self.0[1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet({} {:02x?})", cmd::name(self.opcode()), self.0)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Packet construction errors
///
/// These only fire when a caller hands in values the fixed argument shapes
/// cannot carry; the builders in this module never produce them for valid
/// inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Packet too long: {len} bytes (max {max})", max = packet::DATA_LENGTH)]
    TooLong { len: usize },

    #[error("Zone mask 0x{0:x} does not fit in 24 bits")]
    ZoneOutOfRange(u32),

    #[error("Value for {field} out of byte range: {value}")]
    ByteOutOfRange { field: &'static str, value: u32 },
}

/// Split a zone mask into the three bytes carried by color packets
///
/// Computed by successive division so that out-of-range masks keep the
/// truncation behaviour of the controller's reference tooling:
///
/// ```
/// use awlights_transport::packet::bytes_zone;
///
/// assert_eq!(bytes_zone(0x0008), (0, 0, 8));
/// assert_eq!(bytes_zone(0x0200), (0, 2, 0));
/// assert_eq!(bytes_zone(0x0800_0000), (2048, 0, 0));
/// assert_eq!(bytes_zone([1, 2, 4]), (0, 0, 7));
/// ```
pub fn bytes_zone(zones: impl Into<ZoneMask>) -> (u32, u32, u32) {
    let zones = zones.into().value();
    let first = zones / 65536;
    let next = zones / 256 - first * 256;
    let last = zones - first * 65536 - next * 256;
    (first, next, last)
}

/// Zone bytes as they appear on the wire
fn zone_bytes(zones: ZoneMask) -> Result<[u8; 3], PacketError> {
    if zones.value() > limits::MAX_ZONE_MASK {
        return Err(PacketError::ZoneOutOfRange(zones.value()));
    }
    let (a, b, c) = bytes_zone(zones);
    Ok([a as u8, b as u8, c as u8])
}

/// Build a packet from an opcode and its arguments
///
/// Arguments are concatenated in order and the rest of the packet is padded
/// with [`packet::FILL_BYTE`].
pub fn define_packet(opcode: u8, args: &[&[u8]]) -> Result<Packet, PacketError> {
    let len = 2 + args.iter().map(|a| a.len()).sum::<usize>();
    if len > packet::DATA_LENGTH {
        return Err(PacketError::TooLong { len });
    }

    let mut buf = [packet::FILL_BYTE; packet::DATA_LENGTH];
    buf[0] = packet::START_BYTE;
    buf[1] = opcode;
    let mut pos = 2;
    for arg in args {
        buf[pos..pos + arg.len()].copy_from_slice(arg);
        pos += arg.len();
    }
    Ok(Packet(buf))
}

// =============================================================================
// Core Trait
// =============================================================================

/// A request that can be serialized to a controller packet
pub trait LightCommand {
    /// Opcode byte (e.g., 0x03 for SET_COLOR)
    const OPCODE: u8;

    /// Serialize the arguments (excluding start byte and opcode)
    fn args(&self) -> Result<Vec<u8>, PacketError>;

    /// Build the complete 9-byte packet
    fn build(&self) -> Result<Packet, PacketError> {
        define_packet(Self::OPCODE, &[&self.args()?])
    }
}

// =============================================================================
// Zone commands
// =============================================================================

/// SET_COLOR (0x03): static color on the given zones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetColor {
    /// Zone loop index (starts at 1)
    pub idx: u8,
    pub zones: ZoneMask,
    pub color: PackedColor,
}

impl SetColor {
    pub fn new(idx: u8, zones: impl Into<ZoneMask>, color: PackedColor) -> Self {
        Self {
            idx,
            zones: zones.into(),
            color,
        }
    }
}

impl LightCommand for SetColor {
    const OPCODE: u8 = cmd::SET_COLOR;

    fn args(&self) -> Result<Vec<u8>, PacketError> {
        let mut data = vec![self.idx];
        data.extend_from_slice(&zone_bytes(self.zones)?);
        data.extend_from_slice(&self.color.bytes());
        Ok(data)
    }
}

/// SET_MORPH (0x01): transition from one color to another
///
/// `from` must be packed in first position and `to` in second position;
/// the low byte of `from` and the high byte of `to` share one wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetMorph {
    pub idx: u8,
    pub zones: ZoneMask,
    pub from: PackedColor,
    pub to: PackedColor,
}

impl SetMorph {
    pub fn new(idx: u8, zones: impl Into<ZoneMask>, from: PackedColor, to: PackedColor) -> Self {
        Self {
            idx,
            zones: zones.into(),
            from,
            to,
        }
    }
}

impl LightCommand for SetMorph {
    const OPCODE: u8 = cmd::SET_MORPH;

    fn args(&self) -> Result<Vec<u8>, PacketError> {
        let middle = self
            .from
            .1
            .checked_add(self.to.0)
            .ok_or(PacketError::ByteOutOfRange {
                field: "morph color",
                value: self.from.1 as u32 + self.to.0 as u32,
            })?;
        let mut data = vec![self.idx];
        data.extend_from_slice(&zone_bytes(self.zones)?);
        data.extend_from_slice(&[self.from.0, middle, self.to.1]);
        Ok(data)
    }
}

/// SET_PULSE (0x02): fade a color in and out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPulse {
    pub idx: u8,
    pub zones: ZoneMask,
    pub color: PackedColor,
}

impl SetPulse {
    pub fn new(idx: u8, zones: impl Into<ZoneMask>, color: PackedColor) -> Self {
        Self {
            idx,
            zones: zones.into(),
            color,
        }
    }
}

impl LightCommand for SetPulse {
    const OPCODE: u8 = cmd::SET_PULSE;

    fn args(&self) -> Result<Vec<u8>, PacketError> {
        let mut data = vec![self.idx];
        data.extend_from_slice(&zone_bytes(self.zones)?);
        data.extend_from_slice(&self.color.bytes());
        Ok(data)
    }
}

// =============================================================================
// Session commands
// =============================================================================

/// GET_STATUS (0x06)
#[derive(Debug, Clone, Copy, Default)]
pub struct GetStatus;

impl LightCommand for GetStatus {
    const OPCODE: u8 = cmd::GET_STATUS;

    fn args(&self) -> Result<Vec<u8>, PacketError> {
        Ok(vec![])
    }
}

/// END_LOOP (0x04): close the current zone loop
#[derive(Debug, Clone, Copy, Default)]
pub struct EndLoop;

impl LightCommand for EndLoop {
    const OPCODE: u8 = cmd::END_LOOP;

    fn args(&self) -> Result<Vec<u8>, PacketError> {
        Ok(vec![])
    }
}

/// SET_SPEED (0x0E): theme tempo, big-endian after one fill byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetSpeed {
    pub speed: u16,
}

impl SetSpeed {
    pub fn new(speed: u16) -> Self {
        Self { speed }
    }
}

impl LightCommand for SetSpeed {
    const OPCODE: u8 = cmd::SET_SPEED;

    fn args(&self) -> Result<Vec<u8>, PacketError> {
        let hi = (self.speed / 256) as u8;
        let lo = (self.speed % 256) as u8;
        Ok(vec![packet::FILL_BYTE, hi, lo])
    }
}

/// RESET (0x07)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reset {
    pub kind: u8,
}

impl Reset {
    pub fn new(kind: u8) -> Self {
        Self { kind }
    }
}

impl Default for Reset {
    fn default() -> Self {
        Self {
            kind: reset::ALL_LIGHTS_ON,
        }
    }
}

impl LightCommand for Reset {
    const OPCODE: u8 = cmd::RESET;

    fn args(&self) -> Result<Vec<u8>, PacketError> {
        Ok(vec![self.kind])
    }
}

/// SAVE (0x09): persist the commands sent for the stored modes
#[derive(Debug, Clone, Copy, Default)]
pub struct Save;

impl LightCommand for Save {
    const OPCODE: u8 = cmd::SAVE;

    fn args(&self) -> Result<Vec<u8>, PacketError> {
        Ok(vec![])
    }
}

/// SET_MODE (0x08): select the mode following commands apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetMode {
    pub mode: u8,
}

impl SetMode {
    pub fn new(mode: u8) -> Self {
        Self { mode }
    }
}

impl LightCommand for SetMode {
    const OPCODE: u8 = cmd::SET_MODE;

    fn args(&self) -> Result<Vec<u8>, PacketError> {
        Ok(vec![self.mode])
    }
}

/// TRANSMIT_EXECUTE (0x05): commit the session
#[derive(Debug, Clone, Copy, Default)]
pub struct TransmitExecute;

impl LightCommand for TransmitExecute {
    const OPCODE: u8 = cmd::TRANSMIT_EXECUTE;

    fn args(&self) -> Result<Vec<u8>, PacketError> {
        Ok(vec![])
    }
}
