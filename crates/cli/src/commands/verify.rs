// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::Path;

use crate::scan::LogScan;

/// Full integrity pass. Returns the last sequence of a clean log.
pub fn run(path: &Path) -> anyhow::Result<u64> {
    let mut scan = LogScan::open(path)?;
    let mut events = 0u64;

    for item in scan.by_ref() {
        if let Err(e) = item {
            println!("\n❌ CORRUPTED\n");
            println!("Valid events: {events}");
            println!("Problem:      {e:#}\n");
            return Err(e.context(format!("{} failed verification", path.display())));
        }
        events += 1;
    }

    println!("\n✅ VERIFIED\n");
    println!("Events:        {events}");
    println!("Last sequence: {}\n", scan.last_sequence());
    Ok(scan.last_sequence())
}
