// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Offline, synchronous read of a transaction log.
//!
//! Same acceptance rules as node startup: every line must decode and every
//! sequence must be strictly greater than the one before it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context};
use kvlog_kernel::{record, Event, SequenceCheck};

pub struct LogScan<R> {
    reader: R,
    check: SequenceCheck,
    line: u64,
    buf: String,
    done: bool,
}

impl LogScan<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("cannot open transaction log {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LogScan<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            check: SequenceCheck::new(),
            line: 0,
            buf: String::new(),
            done: false,
        }
    }

    /// Line number of the last line read (1-based).
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn last_sequence(&self) -> u64 {
        self.check.last()
    }

    fn read_next(&mut self) -> anyhow::Result<Option<Event>> {
        self.buf.clear();
        self.line += 1;
        if self.reader.read_line(&mut self.buf)? == 0 {
            self.line -= 1;
            return Ok(None);
        }

        let text = self
            .buf
            .strip_suffix(record::LINE_TERMINATOR)
            .ok_or_else(|| anyhow!("line is not newline-terminated"))?;
        let event = record::decode(text)?;
        self.check.admit(event.sequence)?;
        Ok(Some(event))
    }
}

impl<R: BufRead> Iterator for LogScan<R> {
    type Item = anyhow::Result<Event>;

    /// Yields events until the end of the log or the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_next() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.context(format!("line {}", self.line))))
            }
        }
    }
}
