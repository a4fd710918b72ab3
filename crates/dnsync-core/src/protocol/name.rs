//! Absolute name construction

use crate::model::normalize_zone_name;

/// Build the absolute, dot-terminated owner name of a record
///
/// - `@` (or an empty name) resolves to the zone apex
/// - a name already ending in a dot is absolute and passed through
/// - a name equal to or under the zone only gets the trailing dot
/// - anything else is qualified with the zone
pub fn fqdn(name: &str, zone: &str) -> String {
    let zone = normalize_zone_name(zone);
    let name = name.trim();

    if name.is_empty() || name == "@" {
        return format!("{}.", zone);
    }

    if name.ends_with('.') {
        return name.to_string();
    }

    let lower = name.to_ascii_lowercase();
    if lower == zone || lower.ends_with(&format!(".{}", zone)) {
        return format!("{}.", name);
    }

    format!("{}.{}.", name, zone)
}

/// Canonicalize a host name appearing in rdata (CNAME target, MX exchange)
///
/// Uses the same rules as [`fqdn`], so bare host names get the zone suffix.
pub fn absolute_target(target: &str, zone: &str) -> String {
    fqdn(target, zone)
}
