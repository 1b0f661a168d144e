// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Log Line Codec
//!
//! # Format
//! ```text
//! <sequence:u64>\t<kind:u8>\t<key>\t<value>\n
//! ```
//! Kind is `1` (Delete) or `2` (Put). Keys and values never contain the
//! delimiters; callers check with [`validate_field`] before accepting input.

use crate::error::RecordError;
use crate::event::{Event, EventKind};

pub const FIELD_SEPARATOR: char = '\t';
pub const LINE_TERMINATOR: char = '\n';

/// Encode an event as one log line, terminator included.
pub fn encode(event: &Event) -> String {
    format!(
        "{}{sep}{}{sep}{}{sep}{}{term}",
        event.sequence,
        event.kind.as_u8(),
        event.key,
        event.value,
        sep = FIELD_SEPARATOR,
        term = LINE_TERMINATOR,
    )
}

/// Decode one log line. The terminator must already be stripped.
pub fn decode(line: &str) -> Result<Event, RecordError> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() != 4 {
        return Err(RecordError::FieldCount(fields.len()));
    }

    let sequence = parse_decimal::<u64>(fields[0])
        .ok_or_else(|| RecordError::InvalidSequence(fields[0].to_string()))?;

    let raw_kind = parse_decimal::<u8>(fields[1])
        .ok_or_else(|| RecordError::InvalidKind(fields[1].to_string()))?;
    let kind = EventKind::from_u8(raw_kind).ok_or(RecordError::UnknownKind(raw_kind))?;

    let key = fields[2];
    if key.is_empty() {
        return Err(RecordError::EmptyKey);
    }

    let value = match kind {
        EventKind::Put => fields[3].to_string(),
        // Ignored for deletes, whatever was written.
        EventKind::Delete => String::new(),
    };

    Ok(Event {
        sequence,
        kind,
        key: key.to_string(),
        value,
    })
}

/// Reject a key or value that would break the line format.
pub fn validate_field(field: &'static str, s: &str) -> Result<(), RecordError> {
    if s.contains(FIELD_SEPARATOR) || s.contains(LINE_TERMINATOR) {
        return Err(RecordError::Delimiter { field });
    }
    Ok(())
}

/// Check a key before it is stored: non-empty and delimiter-free.
pub fn validate_key(key: &str) -> Result<(), RecordError> {
    if key.is_empty() {
        return Err(RecordError::EmptyKey);
    }
    validate_field("key", key)
}

// `str::parse` accepts a leading '+', the line format does not.
fn parse_decimal<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let line = encode(&Event::put(3, "a", "1"));
        assert_eq!(line, "3\t2\ta\t1\n");

        let line = encode(&Event::delete(4, "a"));
        assert_eq!(line, "4\t1\ta\t\n");
    }

    #[test]
    fn test_decode_put_and_delete() {
        assert_eq!(decode("1\t2\tk\tv").unwrap(), Event::put(1, "k", "v"));
        assert_eq!(decode("2\t1\tk\t").unwrap(), Event::delete(2, "k"));
    }

    #[test]
    fn test_decode_rejects_plus_sign() {
        assert_eq!(
            decode("+1\t2\tk\tv"),
            Err(RecordError::InvalidSequence("+1".into()))
        );
    }

    #[test]
    fn test_decode_rejects_zero_kind() {
        assert_eq!(decode("1\t0\tk\tv"), Err(RecordError::UnknownKind(0)));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("user:1").is_ok());
        assert_eq!(validate_key(""), Err(RecordError::EmptyKey));
        assert_eq!(
            validate_key("a\tb"),
            Err(RecordError::Delimiter { field: "key" })
        );
        assert!(validate_field("value", "line\nbreak").is_err());
    }
}
