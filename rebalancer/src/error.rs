//! Error types for the rebalancer front end.

use std::path::PathBuf;

/// All errors that can occur while loading inputs or planning a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] toml::de::Error),

    #[error("failed to read weights file {path}: {source}")]
    WeightsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse weights file: {0}")]
    WeightsParse(#[source] toml::de::Error),

    #[error("market snapshot error: {0}")]
    Snapshot(String),

    #[error("failed to read market snapshot {path}: {source}")]
    SnapshotRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse market snapshot: {0}")]
    SnapshotParse(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] restonks::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl Error {
    /// True for problems with the user's configuration or input files, as
    /// opposed to market data.
    pub fn is_config(&self) -> bool {
        match self {
            Error::Engine(e) => e.is_config(),
            Error::Snapshot(_)
            | Error::SnapshotRead { .. }
            | Error::SnapshotParse(_)
            | Error::Output(_) => false,
            _ => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
