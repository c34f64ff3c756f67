//! Recovered anomalies reported alongside results

use std::fmt;

use tracing::warn;

use crate::command::CommandKind;
use crate::machine::ZoneRef;

/// Something was skipped or adjusted, but processing went on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Zone reference not present in the machine's catalog
    UnknownZone(ZoneRef),

    /// Zone lacks the capability the command needs
    UnsupportedCommand {
        alias: &'static str,
        zone: ZoneRef,
        kind: CommandKind,
    },

    /// Speed above the controller maximum was clamped
    SpeedClamped { requested: u32, sent: u16 },

    /// Zone loop longer than the controller accepts was truncated
    TooManyCommands { uid: u32, given: usize, max: usize },

    /// More zone loops than the one-byte loop index can number
    TooManyZones { skipped: usize, max: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownZone(zone) => write!(f, "Unrecognized zone {zone}, skipping"),
            Warning::UnsupportedCommand { alias, zone, kind } => {
                write!(f, "Zone \"{alias}\" (uid: {zone}) cannot {kind}, skipping")
            }
            Warning::SpeedClamped { requested, sent } => {
                write!(f, "Invalid speed {requested}, setting to {sent} (0x{sent:x})")
            }
            Warning::TooManyCommands { uid, given, max } => write!(
                f,
                "Max zone 0x{uid:x} configs is {max}, got {given}, truncating"
            ),
            Warning::TooManyZones { skipped, max } => {
                write!(f, "Max zone loops is {max}, skipping {skipped} more")
            }
        }
    }
}

/// Log a warning and keep it for the caller
pub(crate) fn record(warnings: &mut Vec<Warning>, warning: Warning) {
    warn!("{}", warning);
    warnings.push(warning);
}
