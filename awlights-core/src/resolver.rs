//! Zone command resolution
//!
//! Turns `(zone, "cmd cmd ...")` pairs into one ordered command list per
//! single zone uid, in three order-preserving stages:
//!
//! 1. [`parse_zones`]: look zones up, parse commands, drop what a zone
//!    cannot do
//! 2. [`expand`]: replace groups by their members, optionally letting later
//!    entries override earlier groups
//! 3. [`merge`]: combine entries for the same uid at its first position

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::{parse_command, Command};
use crate::error::ParseError;
use crate::machine::{Machine, ZoneRef};
use crate::warning::{record, Warning};

/// Commands for a zone reference that may still be a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEntry {
    pub zone: ZoneRef,
    pub commands: Vec<Command>,
}

/// Commands for one single zone, ready to be dispatched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedZone {
    pub uid: u32,
    pub commands: Vec<Command>,
}

impl ResolvedZone {
    pub fn new(uid: u32, commands: Vec<Command>) -> Self {
        Self { uid, commands }
    }
}

/// Result of a full resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub zones: Vec<ResolvedZone>,
    pub warnings: Vec<Warning>,
}

/// Parse stage
///
/// Unknown zones and unsupported commands are skipped with a warning;
/// malformed commands fail the whole stage.
pub fn parse_zones<S: AsRef<str>>(
    machine: &Machine,
    input: &[(ZoneRef, S)],
    warnings: &mut Vec<Warning>,
) -> Result<Vec<ZoneEntry>, ParseError> {
    let mut parsed = Vec::with_capacity(input.len());

    for (zone_ref, text) in input {
        let Some(zone) = machine.zone(zone_ref) else {
            record(warnings, Warning::UnknownZone(zone_ref.clone()));
            continue;
        };

        let mut commands = Vec::new();
        for token in text.as_ref().split_whitespace() {
            let command = parse_command(token)?;
            if !zone.supports(command.kind()) {
                record(
                    warnings,
                    Warning::UnsupportedCommand {
                        alias: zone.alias,
                        zone: zone.uid.clone(),
                        kind: command.kind(),
                    },
                );
                continue;
            }
            commands.push(command);
        }

        parsed.push(ZoneEntry {
            zone: zone_ref.clone(),
            commands,
        });
    }

    Ok(parsed)
}

/// Expand stage
///
/// With `override_groups`, a group member is left out of the group's
/// expansion when any later entry targets it, directly or through another
/// group.
pub fn expand(entries: &[ZoneEntry], override_groups: bool) -> Vec<ResolvedZone> {
    let mut flat = Vec::new();

    for (pos, entry) in entries.iter().enumerate() {
        match &entry.zone {
            ZoneRef::Single(uid) => flat.push(ResolvedZone::new(*uid, entry.commands.clone())),
            ZoneRef::Group(members) => {
                for &uid in members {
                    let overridden = override_groups
                        && entries[pos + 1..].iter().any(|later| later.zone.contains(uid));
                    if overridden {
                        debug!("Group member 0x{:x} overridden by a later entry", uid);
                        continue;
                    }
                    flat.push(ResolvedZone::new(uid, entry.commands.clone()));
                }
            }
        }
    }

    flat
}

/// Merge stage
///
/// Each uid keeps the position of its first occurrence and accumulates the
/// commands of every later occurrence. Merging twice changes nothing.
pub fn merge(zones: Vec<ResolvedZone>) -> Vec<ResolvedZone> {
    let mut merged: Vec<ResolvedZone> = Vec::with_capacity(zones.len());
    let mut index: HashMap<u32, usize> = HashMap::new();

    for zone in zones {
        match index.get(&zone.uid) {
            Some(&i) => merged[i].commands.extend(zone.commands),
            None => {
                index.insert(zone.uid, merged.len());
                merged.push(zone);
            }
        }
    }

    merged
}

/// Run all three stages
pub fn resolve<S: AsRef<str>>(
    machine: &Machine,
    input: &[(ZoneRef, S)],
    override_groups: bool,
) -> Result<Resolution, ParseError> {
    let mut warnings = Vec::new();
    let parsed = parse_zones(machine, input, &mut warnings)?;
    let zones = merge(expand(&parsed, override_groups));
    debug!(
        "Resolved {} input entries into {} zones",
        input.len(),
        zones.len()
    );
    Ok(Resolution { zones, warnings })
}
