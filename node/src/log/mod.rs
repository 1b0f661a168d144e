// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Transaction Log
//!
//! The log file is the only durable state. In-memory state is rebuilt from
//! it at startup and kept in step with it afterwards.
//!
//! # Architecture
//! - `LogReplayer` = startup scan, validates sequence order
//! - `ReplayCoordinator` = applies the scan to the store, then activates the writer
//! - `LogWriter` = single drain task, sole appender to the file
//!
//! # Guarantees
//! - Durable order equals submission order
//! - Sequence numbers continue across restarts, never restart
//! - Corrupt or reordered log → startup fails closed
//! - Failed write → writer stops, error surfaced to the owner

pub mod coordinator;
pub mod replayer;
pub mod writer;

pub use coordinator::{bootstrap, Phase, ReadyLog, ReplayCoordinator, StartupError};
pub use replayer::{LogReplayer, ReplayError, ReplayStream};
pub use writer::{LogHandle, LogSink, LogWriter, WriteError, WriterConfig, WriterMonitor};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("cannot open transaction log {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log writer has stopped; mutation was not recorded")]
    WriterStopped,

    #[error("log writer task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Write(#[from] WriteError),
}
