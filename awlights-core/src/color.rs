//! RGB colors and their packed wire form

use std::fmt;
use std::str::FromStr;

use awlights_transport::PackedColor;

use crate::error::ParseError;

/// Where a color sits inside a packet
///
/// Single colors, pulses and the source of a morph use `First`; the
/// destination of a morph uses `Second` so that it can share a byte with
/// the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    First,
    Second,
}

/// RGB color value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Create a new RGB color
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a 6 hex digit color such as `ff00cc`
    pub fn from_hex(hex: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidColorFormat(hex.to_string());
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Pack into the controller's two-byte form
    ///
    /// Each channel keeps only its high nibble; the controller has 4 bits of
    /// depth per channel.
    pub fn pack(&self, position: Position) -> PackedColor {
        let (r, g, b) = (self.r / 16, self.g / 16, self.b / 16);
        match position {
            Position::First => PackedColor(r * 16 + g, b * 16),
            Position::Second => PackedColor(r, g * 16 + b),
        }
    }
}

impl FromStr for RgbColor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Encode a 6 hex digit color string at the given position
pub fn encode(hex: &str, position: Position) -> Result<PackedColor, ParseError> {
    Ok(RgbColor::from_hex(hex)?.pack(position))
}
