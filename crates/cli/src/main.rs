// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use kvlog_cli::commands::{dump, inspect, state, verify};

#[derive(Parser)]
#[command(name = "kvlog")]
#[command(about = "Offline tools for kvlog transaction logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a transaction log
    Inspect {
        log: PathBuf,
    },
    /// Check every line and the sequence order; non-zero exit on failure
    Verify {
        log: PathBuf,
    },
    /// Print events as JSON lines
    Dump {
        log: PathBuf,
    },
    /// Rebuild the store from the log and print it.
    /// Fails on any unreadable line up to the one after --at
    State {
        log: PathBuf,

        /// Stop after this sequence number
        #[arg(long, short)]
        at: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { log } => inspect::run(&log),
        Commands::Verify { log } => verify::run(&log).map(|_| ()),
        Commands::Dump { log } => {
            let stdout = std::io::stdout();
            dump::run(&log, &mut stdout.lock()).map(|_| ())
        }
        Commands::State { log, at } => state::run(&log, at),
    }
}
