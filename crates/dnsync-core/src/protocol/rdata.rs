//! Presentation-format rdata encoding

use super::name::absolute_target;
use super::RecordTuple;
use crate::model::RecordType;

/// MX preference used when a tuple carries none
pub const DEFAULT_MX_PRIORITY: u16 = 10;

/// Longest DNS character-string, in bytes
pub const TXT_CHUNK_LEN: usize = 255;

/// Encode the rdata of a record for an update directive
pub fn encode_rdata(tuple: &RecordTuple, zone: &str) -> String {
    match tuple.record_type {
        RecordType::A | RecordType::Aaaa => tuple.value.clone(),
        RecordType::Cname => absolute_target(&tuple.value, zone),
        RecordType::Txt => txt_rdata(&tuple.value),
        RecordType::Mx => format!(
            "{} {}",
            tuple.priority.unwrap_or(DEFAULT_MX_PRIORITY),
            absolute_target(&tuple.value, zone)
        ),
    }
}

/// Split a TXT value into quoted character-strings of at most 255 bytes
///
/// Splits fall on character boundaries; resolvers concatenate the pieces.
pub fn txt_rdata(value: &str) -> String {
    let mut pieces = Vec::new();
    let mut start = 0;
    while start < value.len() {
        let mut end = (start + TXT_CHUNK_LEN).min(value.len());
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        pieces.push(quote_txt(&value[start..end]));
        start = end;
    }
    if pieces.is_empty() {
        pieces.push(quote_txt(""));
    }
    pieces.join(" ")
}

/// Wrap a TXT value in quotes, escaping backslashes and quotes
pub fn quote_txt(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
