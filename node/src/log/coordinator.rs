// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Startup Replay
//!
//! Drives `Idle → Replaying → Ready` (or `→ Failed`). Every replayed event
//! is applied to the store, in log order, before the writer is activated,
//! so the first live event is numbered after every replayed one.
//!
//! Fail-closed: the first replay or apply error aborts the rest of the
//! replay and the writer is never activated.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use kvlog_kernel::{KeyValueStore, StoreError};
use thiserror::Error;
use tracing::{error, info};

use super::replayer::{LogReplayer, ReplayError, ReplayStream};
use super::writer::{LogHandle, LogSink, LogWriter, WriterMonitor};
use super::LogError;
use crate::config::NodeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Replaying,
    Ready,
    Failed,
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Log(#[from] LogError),

    #[error("replay failed: {0}")]
    Replay(#[from] ReplayError),

    #[error("failed to apply event {sequence}: {source}")]
    Apply {
        sequence: u64,
        #[source]
        source: StoreError,
    },

    #[error("replay already ran (phase {0:?})")]
    AlreadyRan(Phase),
}

/// An activated writer plus what replay found.
pub struct ReadyLog {
    pub handle: LogHandle,
    pub monitor: WriterMonitor,
    pub replayed: u64,
    pub last_sequence: u64,
}

pub struct ReplayCoordinator {
    store: Arc<KeyValueStore>,
    phase: Phase,
}

impl ReplayCoordinator {
    pub fn new(store: Arc<KeyValueStore>) -> Self {
        Self {
            store,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Replay into the store, then activate `writer` after the last sequence.
    pub async fn run<R, S>(
        &mut self,
        replayer: LogReplayer<R>,
        mut writer: LogWriter<S>,
    ) -> Result<ReadyLog, StartupError>
    where
        R: BufRead + Send + 'static,
        S: LogSink,
    {
        if self.phase != Phase::Idle {
            return Err(StartupError::AlreadyRan(self.phase));
        }

        self.phase = Phase::Replaying;
        let start = Instant::now();
        let mut stream = replayer.replay();

        if let Err(err) = self.apply_all(&mut stream).await {
            self.phase = Phase::Failed;
            error!(
                error = %err,
                applied = stream.delivered(),
                "Replay failed; refusing to start"
            );
            return Err(err);
        }

        let replayed = stream.delivered();
        let last_sequence = stream.last_sequence();
        metrics::counter!("kvlog_events_replayed_total", replayed);
        metrics::histogram!(
            "kvlog_replay_duration_seconds",
            start.elapsed().as_secs_f64()
        );

        writer.resume_after(last_sequence);
        let (handle, monitor) = writer.activate();
        self.phase = Phase::Ready;

        info!(replayed, last_sequence, "Replay complete; accepting new events");

        Ok(ReadyLog {
            handle,
            monitor,
            replayed,
            last_sequence,
        })
    }

    async fn apply_all(&self, stream: &mut ReplayStream) -> Result<(), StartupError> {
        while let Some(item) = stream.next().await {
            let event = item?;
            self.store
                .apply(&event)
                .map_err(|source| StartupError::Apply {
                    sequence: event.sequence,
                    source,
                })?;
        }
        Ok(())
    }
}

/// Open the configured log, replay it into `store` and activate the writer.
pub async fn bootstrap(
    config: &NodeConfig,
    store: Arc<KeyValueStore>,
) -> Result<ReadyLog, StartupError> {
    // Writer first: it creates the file if this is a fresh start.
    let writer = LogWriter::open(&config.log_path, &config.writer_config())?;
    let replayer = LogReplayer::open(&config.log_path)?;
    ReplayCoordinator::new(store).run(replayer, writer).await
}
