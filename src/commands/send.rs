//! `awlights send`

use std::time::Duration;

use awlights::config::DaemonConfig;
use awlights::daemon::{Client, Response};
use awlights_core::{
    resolve, Driver, Machine, RecordingOpener, SendRequest, StatusCode, UsbOpener, ZoneRef,
};
use awlights_transport::protocol::cmd;
use awlights_transport::PacketLog;
use tracing::{error, info, warn};

use super::{blocking, find_machine, status_of, CommandResult};

/// Send options after config defaults were applied
#[derive(Debug, Clone)]
pub struct SendArgs {
    pub zones: Vec<String>,
    pub modes: Vec<String>,
    pub speed: u32,
    pub save: bool,
    pub override_groups: bool,
    pub product: Option<u16>,
}

/// Where resolved zones go
#[derive(Debug, Clone)]
pub enum Target {
    Direct,
    Daemon(DaemonConfig),
    DryRun,
}

pub async fn send(args: SendArgs, target: Target) -> CommandResult {
    let machine = match find_machine(args.product).await? {
        Ok(machine) => machine,
        Err(status) => return Ok(status),
    };

    let input = zone_input(machine, &args.zones)?;
    let modes = mode_uids(machine, &args.modes);

    let resolution = match resolve(machine, &input, args.override_groups) {
        Ok(resolution) => resolution,
        Err(e) => {
            error!("{}", e);
            return Ok(e.status());
        }
    };

    let request = SendRequest {
        zones: resolution.zones,
        modes: (!modes.is_empty()).then_some(modes),
        speed: args.speed,
        save: args.save,
    };

    match target {
        Target::Direct => {
            info!("Not using daemon, executing commands directly.");
            // Drive the machine the zones were resolved against
            let driver = Driver::new(UsbOpener::product(machine.product_id));
            Ok(status_of(blocking(move || driver.send(&request)).await?))
        }
        Target::Daemon(daemon) => via_daemon(&daemon, &request).await,
        Target::DryRun => dry_run(machine, request).await,
    }
}

/// Split `ZONE=COMMANDS` arguments and look the zones up
///
/// Zones are aliases or hex uids. Unknown aliases are skipped with a
/// warning, like unknown uids are during resolution.
pub fn zone_input(machine: &Machine, zones: &[String]) -> anyhow::Result<Vec<(ZoneRef, String)>> {
    let mut input = Vec::with_capacity(zones.len());
    for arg in zones {
        let (name, commands) = arg
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected ZONE=COMMANDS, got {arg:?}"))?;

        let zone = match machine.zone_by_alias(name) {
            Some(zone) => zone.uid.clone(),
            None => match parse_uid(name) {
                Some(uid) => ZoneRef::Single(uid),
                None => {
                    warn!("Unknown zone alias {:?} for {}, skipping", name, machine.name);
                    continue;
                }
            },
        };
        input.push((zone, commands.to_string()));
    }
    Ok(input)
}

/// Mode aliases or hex uids to mode uids; unknown names are skipped
pub fn mode_uids(machine: &Machine, modes: &[String]) -> Vec<u8> {
    modes
        .iter()
        .filter_map(|name| {
            let uid = machine
                .mode_by_alias(name)
                .map(|m| m.uid)
                .or_else(|| parse_uid(name).and_then(|uid| u8::try_from(uid).ok()));
            if uid.is_none() {
                warn!("Unknown mode {:?} for {}, skipping", name, machine.name);
            }
            uid
        })
        .collect()
}

fn parse_uid(s: &str) -> Option<u32> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    u32::from_str_radix(digits, 16).ok()
}

async fn via_daemon(daemon: &DaemonConfig, request: &SendRequest) -> CommandResult {
    let client = Client::new(&daemon.host, daemon.port).with_encoding(daemon.encoding);

    let ping = match client.ping().await {
        Ok(response) => response,
        Err(e) => {
            error!("{}", e);
            return Ok(e.status());
        }
    };
    if !ping.success {
        return Ok(response_status(&ping));
    }

    info!("Using daemon at port: {}", daemon.port);
    match client.send(request).await {
        Ok(response) => {
            if !response.success {
                error!("{}", response.message);
            }
            Ok(response_status(&response))
        }
        Err(e) => {
            error!("{}", e);
            Ok(e.status())
        }
    }
}

fn response_status(response: &Response) -> StatusCode {
    response.status().unwrap_or(StatusCode::BadResponseJson)
}

async fn dry_run(machine: &'static Machine, request: SendRequest) -> CommandResult {
    let log = PacketLog::default();
    let driver = Driver::new(RecordingOpener::new(machine.product_id, log.clone()))
        .with_poll_interval(Duration::ZERO);
    let result = blocking(move || driver.send(&request)).await?;

    println!(
        "{} ({:04X}:{:04X})",
        machine.name, machine.vendor_id, machine.product_id
    );
    for (i, packet) in log.packets().iter().enumerate() {
        println!("{:>4}  {:<17} {}", i, cmd::name(packet.opcode()), packet);
    }
    Ok(status_of(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use awlights_core::find_machine;
    use awlights_transport::protocol::device::VENDOR_ID;

    fn aw14() -> &'static Machine {
        find_machine(VENDOR_ID, 0x0525).unwrap()
    }

    #[test]
    fn test_zone_input() {
        let input = zone_input(
            aw14(),
            &[
                "kbd=color:ff0000".to_string(),
                "0x0020=c:00ff00 p:0000ff".to_string(),
                "nosuchzone=c:ffffff".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(input.len(), 2);
        assert!(input[0].0.is_group());
        assert_eq!(input[1], (ZoneRef::Single(0x20), "c:00ff00 p:0000ff".to_string()));
    }

    #[test]
    fn test_zone_input_needs_equals() {
        assert!(zone_input(aw14(), &["kbd".to_string()]).is_err());
    }

    #[test]
    fn test_mode_uids() {
        let modes = ["boot", "0x05", "nap"].map(String::from);
        assert_eq!(mode_uids(aw14(), &modes), vec![0x01, 0x05]);
    }

    #[tokio::test]
    async fn test_dry_run_resolves_and_succeeds() {
        let args = SendArgs {
            zones: vec!["touchpad=color:ffffff".to_string()],
            modes: vec![],
            speed: 0,
            save: false,
            override_groups: false,
            product: Some(0x0525),
        };
        assert_eq!(send(args, Target::DryRun).await.unwrap(), StatusCode::Success);
    }

    #[tokio::test]
    async fn test_bad_color_status() {
        let args = SendArgs {
            zones: vec!["touchpad=color:fff".to_string()],
            modes: vec![],
            speed: 0,
            save: false,
            override_groups: false,
            product: Some(0x0525),
        };
        assert_eq!(send(args, Target::DryRun).await.unwrap(), StatusCode::BadColor);
    }

    #[tokio::test]
    async fn test_uncatalogued_product() {
        let args = SendArgs {
            zones: vec![],
            modes: vec![],
            speed: 0,
            save: false,
            override_groups: false,
            product: Some(0x9999),
        };
        assert_eq!(
            send(args, Target::DryRun).await.unwrap(),
            StatusCode::DeviceNotFound
        );
    }
}
