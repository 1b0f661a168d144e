// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod config;
pub mod errors;
pub mod log;
pub mod server;
pub mod service;
pub mod telemetry;
