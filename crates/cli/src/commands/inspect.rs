// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use kvlog_kernel::{EventKind, KeyValueStore};

use crate::scan::LogScan;

/// Counts gathered from one pass over a log.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LogSummary {
    pub events: u64,
    pub puts: u64,
    pub deletes: u64,
    pub first_sequence: Option<u64>,
    pub last_sequence: Option<u64>,
    pub live_keys: usize,
    /// First problem found, if the log is not clean.
    pub problem: Option<String>,
}

pub fn summarize(path: &Path) -> anyhow::Result<LogSummary> {
    let mut summary = LogSummary::default();
    let store = KeyValueStore::new();

    for item in LogScan::open(path)? {
        let event = match item {
            Ok(event) => event,
            Err(e) => {
                summary.problem = Some(format!("{e:#}"));
                break;
            }
        };
        match event.kind {
            EventKind::Put => summary.puts += 1,
            EventKind::Delete => summary.deletes += 1,
        }
        summary.events += 1;
        summary.first_sequence.get_or_insert(event.sequence);
        summary.last_sequence = Some(event.sequence);
        store.apply(&event)?;
    }

    summary.live_keys = store.len()?;
    Ok(summary)
}

pub fn run(path: &Path) -> anyhow::Result<()> {
    let summary = summarize(path)?;

    println!("\nTransaction Log Report");
    println!("----------------------");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Value"]);

    let seq = |s: Option<u64>| s.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
    table.add_row(vec!["File".to_string(), path.display().to_string()]);
    table.add_row(vec!["Events".to_string(), summary.events.to_string()]);
    table.add_row(vec!["Puts".to_string(), summary.puts.to_string()]);
    table.add_row(vec!["Deletes".to_string(), summary.deletes.to_string()]);
    table.add_row(vec!["First sequence".to_string(), seq(summary.first_sequence)]);
    table.add_row(vec!["Last sequence".to_string(), seq(summary.last_sequence)]);
    table.add_row(vec!["Live keys".to_string(), summary.live_keys.to_string()]);
    table.add_row(vec![
        "Status".to_string(),
        match &summary.problem {
            None => "CLEAN".to_string(),
            Some(p) => format!("CORRUPT ({p})"),
        },
    ]);

    println!("{table}\n");
    Ok(())
}
