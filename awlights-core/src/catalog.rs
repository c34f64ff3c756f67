//! Built-in catalog of supported machines
//!
//! All machines share the Dell vendor id; the product id selects the zone
//! layout and mode table.

use std::sync::OnceLock;

use awlights_transport::protocol::device::VENDOR_ID;

use crate::machine::{Machine, ModeVersion, Zone};

fn m11xr1_zones() -> Vec<Zone> {
    vec![
        Zone::new(0x6000, "Power Button", "power").power(),
        Zone::new(0x0001, "Keyboard: Right", "kbd-right"),
        Zone::new(0x0020, "Speaker: Right", "speaker-right"),
        Zone::new(0x0040, "Speaker: Left", "speaker-left"),
        Zone::group(&[0x0020, 0x0040], "Speakers", "speakers"),
        Zone::new(0x0100, "Alien Name", "name"),
        Zone::new(0x0800, "Media Bar", "media"),
    ]
}

fn m15xr2_zones() -> Vec<Zone> {
    vec![
        Zone::new(0x2000, "Power Button", "power").power(),
        Zone::new(0x0010, "Power Button 2", "power2").power(),
        Zone::new(0x4000, "Indicators", "indicators").static_only(),
        Zone::new(0x0004, "Keyboard: Left", "kbd-left"),
        Zone::new(0x0008, "Keyboard: Middle Left", "kbd-middle-left"),
        Zone::new(0x0002, "Keyboard: Middle Right", "kbd-middle-right"),
        Zone::new(0x0001, "Keyboard: Right", "kbd-right"),
        Zone::group(&[0x0001, 0x0002, 0x0004, 0x0008], "Keyboard", "kbd"),
        Zone::new(0x0020, "Speaker: Right", "speaker-right"),
        Zone::new(0x0040, "Speaker: Left", "speaker-left"),
        Zone::group(&[0x0020, 0x0040], "Speakers", "speakers"),
        Zone::new(0x0080, "Alien Logo", "alien"),
        Zone::new(0x0100, "Alien Name", "name"),
        Zone::new(0x0200, "Touchpad", "touchpad"),
        Zone::new(0x1c00, "Media Bar", "media"),
    ]
}

fn m15x_area51_zones() -> Vec<Zone> {
    vec![
        Zone::new(0x8000, "Power Button", "power")
            .static_only()
            .power(),
        Zone::new(0x0400, "Keyboard", "kbd"),
        Zone::new(0x0001, "Touchpad", "touchpad"),
        Zone::new(0x0020, "Lightpipe", "lightpipe"),
        Zone::new(0x0100, "Alien Logo", "alien"),
        Zone::new(0x0080, "Alien Name", "name"),
        Zone::new(0x10000, "Media Bar", "media"),
    ]
}

fn aw14_2013_zones() -> Vec<Zone> {
    vec![
        Zone::new(0x2000, "Power Button", "power").power(),
        Zone::new(0x0001, "Keyboard: Left", "kbd-left"),
        Zone::new(0x0002, "Keyboard: Middle Left", "kbd-middle-left"),
        Zone::new(0x0004, "Keyboard: Middle Right", "kbd-middle-right"),
        Zone::new(0x0008, "Keyboard: Right", "kbd-right"),
        Zone::group(&[0x0002, 0x0004], "Keyboard Middle", "kbd-middle"),
        Zone::group(&[0x0001, 0x0002, 0x0004, 0x0008], "Keyboard", "kbd"),
        Zone::new(0x0020, "Side: Left", "side-left"),
        Zone::new(0x0040, "Side: Right", "side-right"),
        Zone::group(&[0x0020, 0x0040], "Sides", "sides"),
        Zone::new(0x0080, "Alien Logo and Lid Stripes", "alien"),
        Zone::new(0x0100, "Alien Name", "name"),
        Zone::new(0x0200, "Touchpad", "touchpad"),
        Zone::new(0x0800, "Wifi Led", "wifi"),
        Zone::new(0x4000, "HD Led", "hd"),
        Zone::group(&[0x0800, 0x4000], "Indicators", "indicators"),
    ]
}

fn machine(
    product_id: u16,
    name: &'static str,
    zones: Vec<Zone>,
    mode_version: ModeVersion,
) -> Machine {
    Machine {
        vendor_id: VENDOR_ID,
        product_id,
        name,
        zones,
        mode_version,
    }
}

/// Every supported machine
pub fn machines() -> &'static [Machine] {
    static MACHINES: OnceLock<Vec<Machine>> = OnceLock::new();
    MACHINES.get_or_init(|| {
        use ModeVersion::{V1, V2};
        vec![
            machine(0x0511, "M15XArea51", m15x_area51_zones(), V2),
            machine(0x0512, "M15XAllPowerful", m15xr2_zones(), V2),
            machine(0x0514, "M11XR1", m11xr1_zones(), V1),
            machine(0x0515, "M11XR2", m11xr1_zones(), V1),
            machine(0x0516, "M11XR25", m11xr1_zones(), V1),
            machine(0x0518, "M18XR2", m15xr2_zones(), V1),
            machine(0x0520, "M17XR3", m15xr2_zones(), V2),
            machine(0x0521, "M14XR1", m15xr2_zones(), V2),
            machine(0x0522, "M11XR3", m11xr1_zones(), V1),
            machine(0x0525, "Alienware 14 2013", aw14_2013_zones(), V2),
        ]
    })
}

/// Look up a machine by USB vendor and product id
pub fn find_machine(vendor_id: u16, product_id: u16) -> Option<&'static Machine> {
    machines()
        .iter()
        .find(|m| m.vendor_id == vendor_id && m.product_id == product_id)
}
