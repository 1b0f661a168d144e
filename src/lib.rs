// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! kvlog-kernel: the event model, line codec and guarded map behind kvlog.
//!
//! Nothing in this crate touches a runtime or a file. The node crate owns
//! the log writer and replayer; this crate defines what they move around.

pub mod error;
pub mod event;
pub mod record;
pub mod sequence;
pub mod store;

pub use error::{RecordError, StoreError};
pub use event::{Event, EventKind, Mutation};
pub use sequence::{OrderViolation, SequenceCheck};
pub use store::KeyValueStore;

#[cfg(test)]
mod tests;
