// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Log Replay
//!
//! Reads the log front-to-back on a blocking task and yields events through
//! a single tagged stream: `Ok(event)` items, then either the end of the
//! stream (clean exhaustion) or exactly one `Err` (terminal).
//!
//! # Invariants
//! - Every sequence is strictly greater than all sequences before it
//! - Malformed, reordered or torn lines stop the scan; nothing is skipped
//! - The scan reads at most one line ahead of the consumer

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::Stream;
use kvlog_kernel::{record, Event, OrderViolation, RecordError, SequenceCheck};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::LogError;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("transaction log read failure at line {line}: {source}")]
    Read {
        line: u64,
        #[source]
        source: io::Error,
    },

    #[error("input parse error at line {line}: {source}")]
    Parse {
        line: u64,
        #[source]
        source: RecordError,
    },

    #[error("line {line}: {source}")]
    OutOfSequence {
        line: u64,
        #[source]
        source: OrderViolation,
    },

    #[error("line {line} is not newline-terminated")]
    Truncated { line: u64 },

    #[error("replay scan ended without reaching the end of the log")]
    Interrupted,
}

enum Scanned {
    Event(Event),
    Failed(ReplayError),
    Exhausted,
}

pub struct LogReplayer<R = BufReader<File>> {
    reader: R,
}

impl LogReplayer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LogError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Replaying transaction log");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead + Send + 'static> LogReplayer<R> {
    pub fn from_reader(reader: R) -> Self {
        Self { reader }
    }

    /// Start the scan. Dropping the returned stream stops it.
    pub fn replay(self) -> ReplayStream {
        let (tx, rx) = mpsc::channel(1);
        let reader = self.reader;
        let runtime = Handle::current();
        tokio::task::spawn_blocking(move || scan(reader, tx, runtime));

        ReplayStream {
            rx,
            last_sequence: 0,
            delivered: 0,
            finished: false,
        }
    }
}

fn scan<R: BufRead>(mut reader: R, tx: mpsc::Sender<Scanned>, runtime: Handle) {
    let mut check = SequenceCheck::new();
    let mut line = 0u64;
    let mut buf = String::new();

    loop {
        // A line is only read once the channel has room for it.
        let Ok(permit) = runtime.block_on(tx.reserve()) else {
            debug!(line, "Replay consumer dropped; stopping scan");
            return;
        };

        buf.clear();
        line += 1;

        let item = match reader.read_line(&mut buf) {
            Ok(0) => Scanned::Exhausted,
            Ok(_) => match parse_line(&buf, line, &mut check) {
                Ok(event) => Scanned::Event(event),
                Err(e) => Scanned::Failed(e),
            },
            Err(source) => Scanned::Failed(ReplayError::Read { line, source }),
        };

        let terminal = !matches!(item, Scanned::Event(_));
        permit.send(item);
        if terminal {
            return;
        }
    }
}

fn parse_line(raw: &str, line: u64, check: &mut SequenceCheck) -> Result<Event, ReplayError> {
    let text = raw
        .strip_suffix(record::LINE_TERMINATOR)
        .ok_or(ReplayError::Truncated { line })?;
    let event = record::decode(text).map_err(|source| ReplayError::Parse { line, source })?;
    check
        .admit(event.sequence)
        .map_err(|source| ReplayError::OutOfSequence { line, source })?;
    Ok(event)
}

/// Replayed events in log order, ending in either `None` or one `Err`.
pub struct ReplayStream {
    rx: mpsc::Receiver<Scanned>,
    last_sequence: u64,
    delivered: u64,
    finished: bool,
}

impl ReplayStream {
    /// Highest sequence delivered so far (0 for an empty log).
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl Stream for ReplayStream {
    type Item = Result<Event, ReplayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        let item = match ready!(this.rx.poll_recv(cx)) {
            Some(Scanned::Event(event)) => {
                this.last_sequence = event.sequence;
                this.delivered += 1;
                return Poll::Ready(Some(Ok(event)));
            }
            Some(Scanned::Exhausted) => None,
            Some(Scanned::Failed(err)) => Some(Err(err)),
            // Scan task died (panicked) before reporting an outcome.
            None => Some(Err(ReplayError::Interrupted)),
        };

        this.finished = true;
        Poll::Ready(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use kvlog_kernel::EventKind;
    use std::io::{Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn replay(text: &str) -> ReplayStream {
        LogReplayer::from_reader(Cursor::new(text.as_bytes().to_vec())).replay()
    }

    async fn collect(mut stream: ReplayStream) -> (Vec<Event>, Vec<ReplayError>) {
        let mut events = Vec::new();
        let mut errors = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(e) => events.push(e),
                Err(e) => errors.push(e),
            }
        }
        (events, errors)
    }

    #[tokio::test]
    async fn test_empty_log() {
        let mut stream = replay("");
        assert!(stream.next().await.is_none());
        assert_eq!(stream.last_sequence(), 0);
        assert_eq!(stream.delivered(), 0);
    }

    #[tokio::test]
    async fn test_clean_log() {
        let mut stream = replay("1\t2\ta\t1\n2\t2\tb\t2\n5\t1\ta\t\n");
        let mut seen = Vec::new();
        while let Some(item) = stream.next().await {
            seen.push(item.unwrap());
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].kind, EventKind::Delete);
        assert_eq!(stream.last_sequence(), 5);
        assert_eq!(stream.delivered(), 3);
        // Stays finished.
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_second_line_out_of_sequence() {
        let (events, errors) = collect(replay("2\t2\ta\t1\n2\t2\tb\t2\n3\t2\tc\t3\n")).await;
        assert!(events.len() <= 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ReplayError::OutOfSequence { line: 2, source } if source.previous == 2 && source.found == 2
        ));
    }

    #[tokio::test]
    async fn test_missing_field_stops_stream() {
        let (events, errors) = collect(replay("1\t2\ta\t1\n2\t2\tb\n3\t2\tc\t3\n")).await;
        assert_eq!(events.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ReplayError::Parse { line: 2, source: RecordError::FieldCount(3) }
        ));
    }

    #[tokio::test]
    async fn test_non_numeric_sequence_stops_stream() {
        let (events, errors) = collect(replay("x\t2\ta\t1\n1\t2\tb\t2\n")).await;
        assert!(events.is_empty());
        assert!(matches!(
            &errors[..],
            [ReplayError::Parse { line: 1, source: RecordError::InvalidSequence(_) }]
        ));
    }

    #[tokio::test]
    async fn test_torn_final_line() {
        let (events, errors) = collect(replay("1\t2\ta\t1\n2\t2\tb\t")).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(&errors[..], [ReplayError::Truncated { line: 2 }]));
    }

    #[tokio::test]
    async fn test_zero_sequence_rejected() {
        let (events, errors) = collect(replay("0\t2\ta\t1\n")).await;
        assert!(events.is_empty());
        assert!(matches!(&errors[..], [ReplayError::OutOfSequence { line: 1, .. }]));
    }

    /// Counts `read_line` calls made by the scan.
    struct CountingReader {
        inner: Cursor<Vec<u8>>,
        reads: Arc<AtomicUsize>,
    }

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl BufRead for CountingReader {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            self.inner.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.inner.consume(amt)
        }

        fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_line(buf)
        }
    }

    #[tokio::test]
    async fn test_scan_stays_one_line_ahead_and_stops_on_drop() {
        let mut text = String::new();
        for i in 1..=1000 {
            text.push_str(&format!("{i}\t2\tk{i}\tv\n"));
        }
        let reads = Arc::new(AtomicUsize::new(0));
        let reader = CountingReader {
            inner: Cursor::new(text.into_bytes()),
            reads: reads.clone(),
        };

        let mut stream = LogReplayer::from_reader(reader).replay();
        assert_eq!(stream.next().await.unwrap().unwrap().sequence, 1);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // One consumed, at most one waiting in the channel.
        let before = reads.load(Ordering::SeqCst);
        assert!(before <= 2, "scan read {before} lines for 1 consumed");

        drop(stream);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(reads.load(Ordering::SeqCst), before);
    }
}
