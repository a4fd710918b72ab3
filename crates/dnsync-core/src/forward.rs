//! Forwarding configuration rendering
//!
//! Forward zones are published as one BIND configuration fragment that the
//! nameserver includes. It is regenerated from all active rows on every
//! change.

use std::fmt::Write as _;

use crate::model::ForwardZone;

/// First line of every rendered file
pub const FORWARD_CONFIG_HEADER: &str =
    "// Generated by dnsync from the forward-zone table. Manual edits are overwritten.";

/// Render the forwarding configuration for the active forward zones
///
/// Zones are emitted sorted by name so the output is stable.
pub fn render_forward_config(zones: &[ForwardZone]) -> String {
    let mut active: Vec<&ForwardZone> = zones.iter().filter(|z| z.active).collect();
    active.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = String::new();
    out.push_str(FORWARD_CONFIG_HEADER);
    out.push('\n');

    for zone in active {
        let forwarders: String = zone
            .forwarders
            .iter()
            .map(|addr| format!("{}; ", addr))
            .collect();

        out.push('\n');
        if !zone.description.is_empty() {
            let _ = writeln!(out, "// {}", zone.description.replace(['\n', '\r'], " "));
        }
        let _ = writeln!(out, "zone \"{}\" {{", zone.name);
        out.push_str("    type forward;\n");
        let _ = writeln!(out, "    forward {};", zone.forward_policy.as_str());
        let _ = writeln!(out, "    forwarders {{ {}}};", forwarders);
        out.push_str("};\n");
    }

    out
}
