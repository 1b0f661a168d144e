// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

/// Failures of the in-memory store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Key is absent. An expected result, not a fault.
    #[error("no such key: {0}")]
    NotFound(String),
    /// A thread panicked while holding the map lock.
    #[error("store lock poisoned")]
    Poisoned,
}

/// A log line that does not match `<seq>\t<kind>\t<key>\t<value>`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected 4 tab-separated fields, found {0}")]
    FieldCount(usize),

    #[error("invalid sequence number {0:?}")]
    InvalidSequence(String),

    #[error("invalid event kind {0:?}")]
    InvalidKind(String),

    #[error("unknown event kind {0}")]
    UnknownKind(u8),

    #[error("empty key")]
    EmptyKey,

    #[error("{field} contains a tab or newline")]
    Delimiter { field: &'static str },
}

pub type StoreResult<T> = Result<T, StoreError>;
