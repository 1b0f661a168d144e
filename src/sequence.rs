// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Sequence integrity check applied while scanning a log front-to-back.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("transaction numbers out of sequence: {found} follows {previous}")]
pub struct OrderViolation {
    pub previous: u64,
    pub found: u64,
}

/// Running maximum of the sequences seen in one pass.
///
/// Starts at zero, so a record numbered `0` is always rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceCheck {
    last: u64,
    admitted: u64,
}

impl SequenceCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `sequence` if it is strictly greater than everything before it.
    pub fn admit(&mut self, sequence: u64) -> Result<(), OrderViolation> {
        if sequence <= self.last {
            return Err(OrderViolation {
                previous: self.last,
                found: sequence,
            });
        }
        self.last = sequence;
        self.admitted += 1;
        Ok(())
    }

    /// Highest sequence admitted so far (0 if none).
    pub fn last(&self) -> u64 {
        self.last
    }

    pub fn admitted(&self) -> u64 {
        self.admitted
    }
}
