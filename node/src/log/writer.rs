// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-Only Log Writer
//!
//! Producers hand `Mutation`s to a bounded queue through a `LogHandle`. A
//! single drain task numbers them in arrival order and appends one line per
//! event. A full queue makes `submit` wait; it never waits on disk I/O.
//!
//! A failed write is fatal to the writer: the error is pushed to the
//! `WriterMonitor`, the drain task exits, and every later `submit` returns
//! `LogError::WriterStopped`. Events already queued behind the failed one
//! are not written.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use kvlog_kernel::{record, Event, EventKind, Mutation};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::LogError;

pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Durable write failure. Fatal to the writer that reported it.
#[derive(Error, Debug)]
#[error("failed to write event {sequence}: {source}")]
pub struct WriteError {
    pub sequence: u64,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// In-flight events before `submit` blocks.
    pub queue_capacity: usize,
    /// fsync after every line.
    pub sync_on_write: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sync_on_write: true,
        }
    }
}

/// Destination of log lines. `sync` makes written lines durable.
pub trait LogSink: Write + Send + 'static {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogSink for BufWriter<File> {
    fn sync(&mut self) -> io::Result<()> {
        self.get_ref().sync_data()
    }
}

/// Inactive writer: owns the sink and the numbering until `activate`.
pub struct LogWriter<S: LogSink = BufWriter<File>> {
    sink: S,
    last_sequence: u64,
    config: WriterConfig,
}

impl LogWriter {
    /// Open or create the log file for appending.
    pub fn open(path: impl AsRef<Path>, config: &WriterConfig) -> Result<Self, LogError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LogError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        info!(path = %path.display(), "Opened transaction log for append");
        Ok(Self::from_sink(BufWriter::new(file), config))
    }
}

impl<S: LogSink> LogWriter<S> {
    pub fn from_sink(sink: S, config: &WriterConfig) -> Self {
        Self {
            sink,
            last_sequence: 0,
            config: config.clone(),
        }
    }

    /// Continue numbering after `last_sequence` (the highest replayed one).
    pub fn resume_after(&mut self, last_sequence: u64) {
        self.last_sequence = last_sequence;
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Start the drain task. Must only be called once replay has finished.
    pub fn activate(self) -> (LogHandle, WriterMonitor) {
        let capacity = self.config.queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let (err_tx, err_rx) = mpsc::channel(1);

        let Self {
            sink,
            last_sequence,
            config,
        } = self;

        info!(last_sequence, capacity, "Log writer activated");

        let task = tokio::task::spawn_blocking(move || {
            drain(sink, rx, last_sequence, config.sync_on_write, err_tx)
        });

        (
            LogHandle { tx },
            WriterMonitor {
                errors: err_rx,
                task,
            },
        )
    }
}

fn drain<S: LogSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Mutation>,
    mut last_sequence: u64,
    sync_on_write: bool,
    errors: mpsc::Sender<WriteError>,
) -> u64 {
    while let Some(mutation) = rx.blocking_recv() {
        let start = Instant::now();
        let sequence = last_sequence.wrapping_add(1);

        let result = if sequence == 0 {
            Err(io::Error::new(
                io::ErrorKind::Other,
                "sequence numbers exhausted",
            ))
        } else {
            append(&mut sink, &mutation.into_event(sequence), sync_on_write)
        };

        if let Err(source) = result {
            error!(sequence, error = %source, "Durable write failed; log writer stopping");
            metrics::counter!("kvlog_write_failures_total", 1);
            // Capacity 1 and a single send: only fails if the monitor is gone.
            if errors.try_send(WriteError { sequence, source }).is_err() {
                error!(sequence, "Writer monitor dropped; write failure unobserved");
            }
            return last_sequence;
        }

        last_sequence = sequence;
        metrics::counter!("kvlog_events_written_total", 1);
        metrics::histogram!(
            "kvlog_event_write_duration_seconds",
            start.elapsed().as_secs_f64()
        );
    }

    debug!(last_sequence, "All log handles dropped; writer drained");
    last_sequence
}

fn append<S: LogSink>(sink: &mut S, event: &Event, sync_on_write: bool) -> io::Result<()> {
    sink.write_all(record::encode(event).as_bytes())?;
    sink.flush()?;
    if sync_on_write {
        sink.sync()?;
    }
    debug!(sequence = event.sequence, kind = event.kind.name(), key = %event.key, "Appended event");
    Ok(())
}

/// Producer side of an active writer. Cheap to clone.
#[derive(Clone, Debug)]
pub struct LogHandle {
    tx: mpsc::Sender<Mutation>,
}

impl LogHandle {
    /// Queue a mutation. Waits only while the queue is full.
    ///
    /// `Ok` means queued, not durable.
    pub async fn submit(
        &self,
        kind: EventKind,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), LogError> {
        let mutation = Mutation {
            kind,
            key: key.into(),
            value: value.into(),
        };
        self.tx
            .send(mutation)
            .await
            .map_err(|_| LogError::WriterStopped)
    }

    pub async fn put(&self, key: impl Into<String>, value: impl Into<String>) -> Result<(), LogError> {
        self.submit(EventKind::Put, key, value).await
    }

    pub async fn delete(&self, key: impl Into<String>) -> Result<(), LogError> {
        self.submit(EventKind::Delete, key, String::new()).await
    }

    /// True once the drain task has exited.
    pub fn is_stopped(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Owner side of an active writer.
pub struct WriterMonitor {
    errors: mpsc::Receiver<WriteError>,
    task: JoinHandle<u64>,
}

impl WriterMonitor {
    /// Resolves with the writer's fatal error, or `None` once it has exited
    /// cleanly (every `LogHandle` dropped and the queue drained).
    pub async fn error(&mut self) -> Option<WriteError> {
        self.errors.recv().await
    }

    /// Wait for the drain task to finish and return the last durable sequence.
    ///
    /// Only returns once every `LogHandle` has been dropped.
    pub async fn join(mut self) -> Result<u64, LogError> {
        let last_sequence = self
            .task
            .await
            .map_err(|e| LogError::Task(e.to_string()))?;

        if let Ok(err) = self.errors.try_recv() {
            return Err(err.into());
        }
        Ok(last_sequence)
    }
}
