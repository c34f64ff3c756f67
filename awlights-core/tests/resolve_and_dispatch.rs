//! End-to-end tests: catalog aliases through resolution to packets.
//!
//! Most tests run against the recording transport. The hardware test needs a
//! supported laptop.
//! Run with: cargo test -p awlights-core --test resolve_and_dispatch -- --ignored --nocapture

use std::time::Duration;

use awlights_core::{find_machine, resolve, Driver, RecordingOpener, SendRequest, ZoneRef};
use awlights_transport::protocol::{cmd, device::VENDOR_ID};
use awlights_transport::PacketLog;

const AW14: u16 = 0x0525;

fn zone(alias: &str) -> ZoneRef {
    find_machine(VENDOR_ID, AW14)
        .and_then(|m| m.zone_by_alias(alias))
        .map(|z| z.uid.clone())
        .unwrap_or_else(|| panic!("no zone {alias}"))
}

#[test]
fn keyboard_group_with_override_sends_expected_packets() {
    let machine = find_machine(VENDOR_ID, AW14).unwrap();
    let input = [
        (zone("kbd"), "color:ff0000".to_string()),
        (zone("kbd-left"), "morph:00ff00:0000ff".to_string()),
    ];
    let resolution = resolve(machine, &input, true).unwrap();
    let uids: Vec<u32> = resolution.zones.iter().map(|z| z.uid).collect();
    assert_eq!(uids, vec![0x0002, 0x0004, 0x0008, 0x0001]);

    let log = PacketLog::default();
    let driver =
        Driver::new(RecordingOpener::new(AW14, log.clone())).with_poll_interval(Duration::ZERO);
    driver
        .send(&SendRequest {
            zones: resolution.zones,
            ..Default::default()
        })
        .unwrap();

    let packets = log.packets();
    let morph = packets
        .iter()
        .find(|p| p.opcode() == cmd::SET_MORPH)
        .unwrap();
    // idx 4, zone 0x000001, green (first) into blue (second)
    assert_eq!(
        morph.as_bytes(),
        &[0x02, 0x01, 0x04, 0x00, 0x00, 0x01, 0x0F, 0x00, 0x0F]
    );

    let colors: Vec<_> = packets
        .iter()
        .filter(|p| p.opcode() == cmd::SET_COLOR)
        .map(|p| (p.as_bytes()[2], p.as_bytes()[5], p.as_bytes()[6]))
        .collect();
    assert_eq!(colors, vec![(1, 0x02, 0xF0), (2, 0x04, 0xF0), (3, 0x08, 0xF0)]);
}

#[test]
fn indicators_group_cannot_pulse() {
    let machine = find_machine(VENDOR_ID, 0x0512).unwrap();
    let indicators = machine.zone_by_alias("indicators").unwrap().uid.clone();
    let resolution = resolve(machine, &[(indicators, "pulse:ffffff color:ffffff")], false).unwrap();
    assert_eq!(resolution.zones.len(), 1);
    assert_eq!(resolution.zones[0].commands.len(), 1);
    assert_eq!(resolution.warnings.len(), 1);
}

#[test]
fn every_mode_is_programmed_before_live_session() {
    let machine = find_machine(VENDOR_ID, AW14).unwrap();
    let modes: Vec<u8> = ["boot", "ac"]
        .iter()
        .map(|a| machine.mode_by_alias(a).unwrap().uid)
        .collect();
    let resolution = resolve(machine, &[(zone("touchpad"), "c:ffffff")], false).unwrap();

    let log = PacketLog::default();
    let driver =
        Driver::new(RecordingOpener::new(AW14, log.clone())).with_poll_interval(Duration::ZERO);
    driver
        .send(&SendRequest {
            zones: resolution.zones,
            modes: Some(modes),
            speed: 0,
            save: true,
        })
        .unwrap();

    let set_modes: Vec<u8> = log
        .packets()
        .iter()
        .filter(|p| p.opcode() == cmd::SET_MODE)
        .map(|p| p.as_bytes()[2])
        .collect();
    assert_eq!(set_modes, vec![0x01, 0x01, 0x05, 0x05]);

    let ops = log.opcodes();
    assert_eq!(&ops[ops.len() - 2..], &[cmd::SAVE, cmd::TRANSMIT_EXECUTE]);
}

#[test]
#[ignore] // requires hardware
fn attached_machine_is_catalogued() {
    let machine = Driver::usb()
        .machine()
        .expect("No supported laptop found");
    println!(
        "{} ({:04X}:{:04X}), {} zones",
        machine.name,
        machine.vendor_id,
        machine.product_id,
        machine.zones.len()
    );
}
