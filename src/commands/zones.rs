//! `awlights zones`

use awlights_core::{Machine, StatusCode};

use super::{find_machine, CommandResult};

pub async fn list(product: Option<u16>) -> CommandResult {
    let machine = match find_machine(product).await? {
        Ok(machine) => machine,
        Err(status) => return Ok(status),
    };
    print!("{}", describe(machine));
    Ok(StatusCode::Success)
}

/// Human-readable zone and mode tables
pub fn describe(machine: &Machine) -> String {
    let mut out = format!(
        "{} ({:04X}:{:04X})\n\nZones:\n",
        machine.name, machine.vendor_id, machine.product_id
    );

    for zone in &machine.zones {
        let mut caps = vec!["color"];
        if zone.can_morph {
            caps.push("morph");
        }
        if zone.can_pulse {
            caps.push("pulse");
        }
        if zone.is_power {
            caps.push("power");
        }
        out.push_str(&format!(
            "  {:<18} {:<32} {:<28} {}\n",
            zone.alias,
            zone.uid.to_string(),
            zone.name,
            caps.join(",")
        ));
    }

    out.push_str("\nModes:\n");
    for mode in machine.modes() {
        out.push_str(&format!(
            "  {:<18} 0x{:02x}  {}\n",
            mode.alias, mode.uid, mode.name
        ));
    }
    out
}
