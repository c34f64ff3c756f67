//! Common types for transport layer

use serde::{Deserialize, Serialize};

/// A color in the controller's packed two-byte form
///
/// Each channel is reduced to its high nibble. Where the nibbles land depends
/// on whether the color is the first or second color of a packet; see
/// `awlights_core::color` for the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PackedColor(pub u8, pub u8);

impl PackedColor {
    pub const fn new(hi: u8, lo: u8) -> Self {
        Self(hi, lo)
    }

    pub fn bytes(&self) -> [u8; 2] {
        [self.0, self.1]
    }
}

/// Sum of one or more zone uids
///
/// The controller addresses several zones at once by adding their bit flags,
/// so a group and a single zone go through the same arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ZoneMask(pub u32);

impl ZoneMask {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for ZoneMask {
    fn from(uid: u32) -> Self {
        Self(uid)
    }
}

impl From<&[u32]> for ZoneMask {
    fn from(uids: &[u32]) -> Self {
        uids.iter().copied().collect()
    }
}

impl<const N: usize> From<[u32; N]> for ZoneMask {
    fn from(uids: [u32; N]) -> Self {
        uids.into_iter().collect()
    }
}

impl From<Vec<u32>> for ZoneMask {
    fn from(uids: Vec<u32>) -> Self {
        uids.into_iter().collect()
    }
}

impl FromIterator<u32> for ZoneMask {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0u32, |acc, uid| acc.saturating_add(uid)))
    }
}

/// USB identification of an opened controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// Bus number, if known
    pub bus: Option<u8>,
    /// Device address on the bus, if known
    pub address: Option<u8>,
}

impl DeviceInfo {
    pub fn new(vid: u16, pid: u16) -> Self {
        Self {
            vid,
            pid,
            bus: None,
            address: None,
        }
    }
}
