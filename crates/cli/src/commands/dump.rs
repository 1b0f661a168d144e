// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::io::Write;
use std::path::Path;

use crate::scan::LogScan;

/// Writes one JSON object per event. Stops with an error at the first bad line,
/// after everything before it has been written.
pub fn run<W: Write>(path: &Path, out: &mut W) -> anyhow::Result<u64> {
    let mut written = 0u64;
    for item in LogScan::open(path)? {
        let event = item?;
        serde_json::to_writer(&mut *out, &event)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}
