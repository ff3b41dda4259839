// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # nef-observability
//!
//! Logging setup shared by every NEF crate: a `tracing-subscriber` registry
//! with an `EnvFilter` built from a base level plus per-crate debug flags.
//!
//! ## Features
//! - `file-logging`: also write a combined log file into a timestamped run
//!   folder and prune old runs by age and count (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known NEF crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "nef",
    "nef-config",
    "nef-npu-neural",
    "nef-npu-runtime",
    "nef-npu-engine",
];

/// Observability errors
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Log directory {path}: {source}")]
    LogDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File logging requested but the `file-logging` feature is disabled")]
    FileLoggingDisabled,
}

pub type Result<T> = std::result::Result<T, ObservabilityError>;
