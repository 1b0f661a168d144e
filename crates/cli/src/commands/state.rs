// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::collections::BTreeMap;
use std::path::Path;

use kvlog_kernel::KeyValueStore;

use crate::scan::LogScan;

/// Store contents after replaying every event with sequence <= `at`
/// (the whole log when `at` is `None`).
///
/// A line must decode before its sequence can be compared with `at`, so a
/// corrupt line just past `at` still fails the rebuild.
pub fn rebuild(path: &Path, at: Option<u64>) -> anyhow::Result<BTreeMap<String, String>> {
    let store = KeyValueStore::new();
    let limit = at.unwrap_or(u64::MAX);

    for item in LogScan::open(path)? {
        let event = item?;
        if event.sequence > limit {
            break;
        }
        store.apply(&event)?;
    }

    Ok(store.snapshot()?)
}

pub fn run(path: &Path, at: Option<u64>) -> anyhow::Result<()> {
    let state = rebuild(path, at)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Key", "Value"]);
    for (key, value) in &state {
        table.add_row(vec![key, value]);
    }

    match at {
        Some(seq) => println!("\nState at sequence {seq} ({} keys)\n", state.len()),
        None => println!("\nCurrent state ({} keys)\n", state.len()),
    }
    println!("{table}\n");
    Ok(())
}
