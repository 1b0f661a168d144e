// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::RecordError;
use crate::event::Event;
use crate::record::{decode, encode};
use crate::sequence::SequenceCheck;

fn strip(line: &str) -> &str {
    line.strip_suffix('\n').unwrap()
}

#[test]
fn test_encoded_line_decodes_to_same_event() {
    let event = Event::put(42, "user:7", "hello world");
    assert_eq!(decode(strip(&encode(&event))).unwrap(), event);
}

#[test]
fn test_missing_field() {
    assert_eq!(decode("1\t2\tkey"), Err(RecordError::FieldCount(3)));
    assert_eq!(decode(""), Err(RecordError::FieldCount(1)));
}

#[test]
fn test_extra_field() {
    assert_eq!(decode("1\t2\tk\tv\tw"), Err(RecordError::FieldCount(5)));
}

#[test]
fn test_non_numeric_sequence() {
    assert_eq!(
        decode("one\t2\tk\tv"),
        Err(RecordError::InvalidSequence("one".into()))
    );
    assert_eq!(
        decode("\t2\tk\tv"),
        Err(RecordError::InvalidSequence(String::new()))
    );
}

#[test]
fn test_sequence_overflow_rejected() {
    assert!(matches!(
        decode("18446744073709551616\t2\tk\tv"),
        Err(RecordError::InvalidSequence(_))
    ));
}

#[test]
fn test_bad_kind() {
    assert_eq!(decode("1\tput\tk\tv"), Err(RecordError::InvalidKind("put".into())));
    assert_eq!(decode("1\t9\tk\tv"), Err(RecordError::UnknownKind(9)));
}

#[test]
fn test_empty_key() {
    assert_eq!(decode("1\t2\t\tv"), Err(RecordError::EmptyKey));
}

#[test]
fn test_delete_value_ignored() {
    let e = decode("5\t1\tk\tleftover").unwrap();
    assert_eq!(e, Event::delete(5, "k"));
}

#[test]
fn test_scan_detects_reordered_lines() {
    let lines = ["1\t2\ta\t1", "3\t2\tb\t2", "2\t1\ta\t"];
    let mut check = SequenceCheck::new();
    let mut accepted = 0;
    let mut violation = None;
    for line in lines {
        let event = decode(line).unwrap();
        match check.admit(event.sequence) {
            Ok(()) => accepted += 1,
            Err(v) => {
                violation = Some(v);
                break;
            }
        }
    }
    assert_eq!(accepted, 2);
    let v = violation.unwrap();
    assert_eq!((v.previous, v.found), (3, 2));
}
