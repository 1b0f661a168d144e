// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::log::writer::{WriterConfig, DEFAULT_QUEUE_CAPACITY};

pub struct NodeConfig {
    pub log_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub queue_capacity: usize,
    pub sync_on_write: bool,
    pub auth_token: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("transaction.log"),
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sync_on_write: true,
            auth_token: None,
        }
    }
}

impl NodeConfig {
    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            queue_capacity: self.queue_capacity,
            sync_on_write: self.sync_on_write,
        }
    }
}

// Token is redacted; this is printed at startup.
impl std::fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConfig")
            .field("log_path", &self.log_path)
            .field("bind_addr", &self.bind_addr)
            .field("queue_capacity", &self.queue_capacity)
            .field("sync_on_write", &self.sync_on_write)
            .field("auth", &self.auth_token.is_some())
            .finish()
    }
}

/// Command-line overrides for `NodeConfig`. Unset flags keep the defaults.
#[derive(Parser, Debug, Default)]
#[command(name = "kvlog-node")]
#[command(about = "Key-value store with a durable transaction log", long_about = None)]
pub struct NodeArgs {
    /// Transaction log file (created if missing)
    #[arg(long, env = "KVLOG_LOG_PATH")]
    pub log_path: Option<PathBuf>,

    /// HTTP listen address
    #[arg(long, env = "KVLOG_BIND")]
    pub bind: Option<SocketAddr>,

    /// Events queued before writers block
    #[arg(long, env = "KVLOG_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// fsync after every event
    #[arg(long, env = "KVLOG_SYNC")]
    pub sync_on_write: Option<bool>,

    /// Require `Authorization: Bearer <token>` on every request
    #[arg(long, env = "KVLOG_AUTH_TOKEN")]
    pub auth_token: Option<String>,
}

impl NodeArgs {
    pub fn into_config(self) -> NodeConfig {
        let mut cfg = NodeConfig::default();
        if let Some(path) = self.log_path {
            cfg.log_path = path;
        }
        if let Some(addr) = self.bind {
            cfg.bind_addr = addr;
        }
        if let Some(capacity) = self.queue_capacity {
            cfg.queue_capacity = capacity;
        }
        if let Some(sync) = self.sync_on_write {
            cfg.sync_on_write = sync;
        }
        cfg.auth_token = self.auth_token;
        cfg
    }
}
