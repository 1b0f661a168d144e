// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Mutation Events
//!
//! Every change to the store is expressed as an `Event`. Producers build a
//! `Mutation` (no sequence yet); the log writer turns it into an `Event` by
//! assigning the next sequence number at append time.
//!
//! # Invariants
//! - Sequences are assigned by the writer only
//! - A Delete carries no value
//! - Events are immutable once written

use serde::{Deserialize, Serialize};

/// Kind of mutation. The discriminant is the on-disk byte.
///
/// `0` is reserved and never decodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    Delete = 1,
    Put = 2,
}

impl EventKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(EventKind::Delete),
            2 => Some(EventKind::Put),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Delete => "Delete",
            EventKind::Put => "Put",
        }
    }
}

/// A requested mutation, before the writer has numbered it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub kind: EventKind,
    pub key: String,
    pub value: String,
}

impl Mutation {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Delete,
            key: key.into(),
            value: String::new(),
        }
    }

    /// Attach the writer-assigned sequence number.
    pub fn into_event(self, sequence: u64) -> Event {
        let value = match self.kind {
            EventKind::Put => self.value,
            EventKind::Delete => String::new(),
        };
        Event {
            sequence,
            kind: self.kind,
            key: self.key,
            value,
        }
    }
}

/// One durable mutation record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub sequence: u64,
    pub kind: EventKind,
    pub key: String,
    pub value: String,
}

impl Event {
    pub fn put(sequence: u64, key: impl Into<String>, value: impl Into<String>) -> Self {
        Mutation::put(key, value).into_event(sequence)
    }

    pub fn delete(sequence: u64, key: impl Into<String>) -> Self {
        Mutation::delete(key).into_event(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_bytes() {
        assert_eq!(EventKind::Delete.as_u8(), 1);
        assert_eq!(EventKind::Put.as_u8(), 2);
        assert_eq!(EventKind::from_u8(0), None);
        assert_eq!(EventKind::from_u8(2), Some(EventKind::Put));
        assert_eq!(EventKind::from_u8(3), None);
    }

    #[test]
    fn test_delete_drops_value() {
        let m = Mutation {
            kind: EventKind::Delete,
            key: "a".into(),
            value: "stale".into(),
        };
        let e = m.into_event(7);
        assert_eq!(e.sequence, 7);
        assert!(e.value.is_empty());
    }
}
