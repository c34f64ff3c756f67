//! Machine, zone and mode descriptors

use std::fmt;

use awlights_transport::ZoneMask;

use crate::command::CommandKind;

/// Address of a zone: one bit flag or a fixed group of them
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ZoneRef {
    Single(u32),
    Group(Vec<u32>),
}

impl ZoneRef {
    /// Member uids in order (a single zone is its own only member)
    pub fn members(&self) -> &[u32] {
        match self {
            ZoneRef::Single(uid) => std::slice::from_ref(uid),
            ZoneRef::Group(uids) => uids,
        }
    }

    pub fn contains(&self, uid: u32) -> bool {
        self.members().contains(&uid)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ZoneRef::Group(_))
    }

    /// Sum of member uids, as sent on the wire
    pub fn mask(&self) -> ZoneMask {
        self.members().iter().copied().collect()
    }
}

impl From<u32> for ZoneRef {
    fn from(uid: u32) -> Self {
        ZoneRef::Single(uid)
    }
}

impl fmt::Display for ZoneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneRef::Single(uid) => write!(f, "0x{uid:04x}"),
            ZoneRef::Group(uids) => {
                for (i, uid) in uids.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "0x{uid:04x}")?;
                }
                Ok(())
            }
        }
    }
}

/// One addressable lighting zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub uid: ZoneRef,
    pub name: &'static str,
    pub alias: &'static str,
    pub can_morph: bool,
    pub can_pulse: bool,
    /// Informational only
    pub is_power: bool,
}

impl Zone {
    pub fn new(uid: impl Into<ZoneRef>, name: &'static str, alias: &'static str) -> Self {
        Self {
            uid: uid.into(),
            name,
            alias,
            can_morph: true,
            can_pulse: true,
            is_power: false,
        }
    }

    pub fn group(uids: &[u32], name: &'static str, alias: &'static str) -> Self {
        Self::new(ZoneRef::Group(uids.to_vec()), name, alias)
    }

    pub fn static_only(mut self) -> Self {
        self.can_morph = false;
        self.can_pulse = false;
        self
    }

    pub fn power(mut self) -> Self {
        self.is_power = true;
        self
    }

    /// Whether the zone accepts commands of this kind (color always works)
    pub fn supports(&self, kind: CommandKind) -> bool {
        match kind {
            CommandKind::Color => true,
            CommandKind::Morph => self.can_morph,
            CommandKind::Pulse => self.can_pulse,
        }
    }
}

/// A lighting mode the controller can store commands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub uid: u8,
    pub name: &'static str,
    pub alias: &'static str,
}

impl Mode {
    const fn new(uid: u8, name: &'static str, alias: &'static str) -> Self {
        Self { uid, name, alias }
    }
}

/// Mode table revision used by a machine's firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeVersion {
    V1,
    V2,
}

impl ModeVersion {
    const V1_MODES: &'static [Mode] = &[
        Mode::new(0x01, "Load on boot", "boot"),
        Mode::new(0x02, "Stand By", "standby"),
        Mode::new(0x05, "AC Power", "ac"),
        Mode::new(0x06, "charging", "charging"),
        Mode::new(0x07, "Sleeping on battery", "batsleep"),
        Mode::new(0x08, "Battery Power", "batpower"),
        Mode::new(0x09, "Low Battery", "batlow"),
    ];

    const V2_MODES: &'static [Mode] = &[
        Mode::new(0x01, "Load on boot", "boot"),
        Mode::new(0x02, "Stand By", "standby"),
        Mode::new(0x05, "AC Power", "ac"),
        Mode::new(0x06, "charging", "charging"),
        Mode::new(0x07, "Low Battery", "batlow"),
        Mode::new(0x08, "Battery Power", "batpower"),
    ];

    pub fn modes(self) -> &'static [Mode] {
        match self {
            ModeVersion::V1 => Self::V1_MODES,
            ModeVersion::V2 => Self::V2_MODES,
        }
    }
}

/// Static description of one laptop model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: &'static str,
    pub zones: Vec<Zone>,
    pub mode_version: ModeVersion,
}

impl Machine {
    pub fn modes(&self) -> &'static [Mode] {
        self.mode_version.modes()
    }

    /// Zone whose uid (single or group) equals `uid`
    pub fn zone(&self, uid: &ZoneRef) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.uid == uid)
    }

    /// Single zone with this bit flag
    pub fn single_zone(&self, uid: u32) -> Option<&Zone> {
        self.zone(&ZoneRef::Single(uid))
    }

    pub fn zone_by_alias(&self, alias: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.alias == alias)
    }

    pub fn mode_by_alias(&self, alias: &str) -> Option<&'static Mode> {
        self.modes().iter().find(|m| m.alias == alias)
    }
}
