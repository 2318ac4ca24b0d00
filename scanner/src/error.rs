use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a whole scan run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to fetch version catalog: {0}")]
    Catalog(String),
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
    #[error("probe helper could not be started: {0}")]
    Helper(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store is corrupt: {0}")]
    Codec(#[from] bincode::Error),
}
