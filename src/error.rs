// src/error.rs
use std::io;
use thiserror::Error;

use crate::process::ProcessError;
use crate::registry::RegistryError;
use crate::source::QueryError;

// Re-export anyhow's Result type
pub use anyhow::Result;

/// Why a single collector contributed nothing to a scrape
#[derive(Error, Debug)]
pub enum CollectError {
    /// The structured query could not be executed or decoded
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// The external command failed, timed out or produced unusable output
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("Scrape cancelled")]
    Cancelled,

    #[error("Scrape deadline exceeded")]
    DeadlineExceeded,

    /// The orchestrator stopped reading samples
    #[error("Sample output closed")]
    OutputClosed,
}

impl CollectError {
    /// Whether the collector gave up because of a timeout of any kind
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            CollectError::DeadlineExceeded
                | CollectError::Process(ProcessError::Timeout(_))
                | CollectError::Query(QueryError::Timeout(_))
        )
    }
}

/// Top-level error type for the exporter
#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Collection error: {0}")]
    Collection(#[from] CollectError),
}
