//! Name validation shared by zones, records and forward zones
//!
//! These are basic RFC 1035 checks. They are not comprehensive but reject
//! anything that could break the line-oriented update script.

use crate::error::{Error, Result};

/// Maximum length of a domain name in presentation format
const MAX_NAME_LEN: usize = 253;

/// Maximum length of a single label
const MAX_LABEL_LEN: usize = 63;

/// Normalize a zone name: strip trailing dots and lowercase
///
/// Applying this twice yields the same result as applying it once.
pub fn normalize_zone_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Validate a host name such as a zone name or a CNAME target
///
/// A single trailing dot is accepted.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() {
        return Err(Error::validation("Domain name cannot be empty"));
    }

    if domain.len() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "Domain name too long: {} chars (max {}). Got: {}",
            domain.len(),
            MAX_NAME_LEN,
            domain
        )));
    }

    for label in domain.split('.') {
        validate_host_label(label, domain)?;
    }

    Ok(())
}

/// Validate a record owner name relative to its zone
///
/// Accepts `@`, `*`, or dot-separated labels of letters, digits, hyphen and
/// underscore. Only the first label may be the `*` wildcard. A trailing dot
/// marks the name as absolute.
pub fn validate_record_name(name: &str) -> Result<()> {
    if name == "@" || name == "*" {
        return Ok(());
    }

    let relative = name.strip_suffix('.').unwrap_or(name);
    if relative.is_empty() {
        return Err(Error::validation("Record name cannot be empty"));
    }

    if relative.len() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "Record name too long: {} chars (max {})",
            relative.len(),
            MAX_NAME_LEN
        )));
    }

    for (index, label) in relative.split('.').enumerate() {
        if label == "*" && index == 0 {
            continue;
        }

        if label.is_empty() {
            return Err(Error::validation(format!(
                "Record name has empty label: '{}'",
                name
            )));
        }

        if label.len() > MAX_LABEL_LEN {
            return Err(Error::validation(format!(
                "Record label too long: {} chars (max {}). Label: '{}'",
                label.len(),
                MAX_LABEL_LEN,
                label
            )));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::validation(format!(
                "Record label contains invalid characters. Label: '{}'. \
                Valid: letters, digits, hyphen and underscore.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::validation(format!(
                "Record label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn validate_host_label(label: &str, domain: &str) -> Result<()> {
    if label.is_empty() {
        return Err(Error::validation(format!(
            "Domain name has empty label: '{}'",
            domain
        )));
    }

    if label.len() > MAX_LABEL_LEN {
        return Err(Error::validation(format!(
            "Domain label too long: {} chars (max {}). Label: '{}'",
            label.len(),
            MAX_LABEL_LEN,
            label
        )));
    }

    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(Error::validation(format!(
            "Domain label contains invalid characters. Label: '{}'. \
            Valid: alphanumeric and hyphen only.",
            label
        )));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(Error::validation(format!(
            "Domain label cannot start or end with hyphen. Label: '{}'",
            label
        )));
    }

    Ok(())
}

/// Reject values that would split or corrupt an update script line
pub fn reject_control_chars(field: &str, value: &str) -> Result<()> {
    if value.chars().any(|c| c.is_control()) {
        return Err(Error::validation(format!(
            "{} must not contain control characters",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_dots_and_lowercases() {
        assert_eq!(normalize_zone_name("Example.COM."), "example.com");
        assert_eq!(normalize_zone_name("example.com.."), "example.com");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in ["Example.COM.", "a.b.c", "ZONE..", "x"] {
            let once = normalize_zone_name(name);
            assert_eq!(normalize_zone_name(&once), once);
        }
    }

    #[test]
    fn test_domain_name_rules() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("mail.example.com.").is_ok());
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("bad..name").is_err());
        assert!(validate_domain_name("-bad.com").is_err());
        assert!(validate_domain_name("under_score.com").is_err());
        assert!(validate_domain_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_record_name_rules() {
        for ok in ["@", "*", "www", "*.dev", "_dmarc", "a.b", "www.example.com."] {
            assert!(validate_record_name(ok).is_ok(), "{ok} should be valid");
        }
        for bad in ["", "a..b", "dev.*", "sp ace", "-www", "semi;colon"] {
            assert!(validate_record_name(bad).is_err(), "{bad} should be invalid");
        }
    }

    #[test]
    fn test_control_chars_rejected() {
        assert!(reject_control_chars("value", "10.0.0.1").is_ok());
        assert!(reject_control_chars("value", "x\nsend").is_err());
    }
}
