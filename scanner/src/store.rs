//! Record persistence and the deferred deletion filter
//!
//! Deletions found during a scan are collected in a [`DeletionSet`] and applied
//! once, after both passes, by filtering the full record list. Nothing is
//! removed from the list while a pass may still be iterating it.

use crate::error::StoreError;
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use shared::Record;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Record>, StoreError>;

    /// Replaces the stored list with `records`.
    async fn save(&self, records: &[Record]) -> Result<(), StoreError>;
}

const STORE_FORMAT: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoreFile {
    format: u32,
    records: Vec<Record>,
}

/// File-backed store holding the bincode encoding of the record list.
#[derive(Debug, Clone)]
pub struct BincodeStore {
    path: PathBuf,
}

impl BincodeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordStore for BincodeStore {
    async fn load(&self) -> Result<Vec<Record>, StoreError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let file: StoreFile = bincode::deserialize(&bytes)?;

        if file.format != STORE_FORMAT {
            return Err(StoreError::Codec(Box::new(bincode::ErrorKind::Custom(
                format!("unsupported store format {}", file.format),
            ))));
        }

        info!(
            "Loaded {} records from {}",
            file.records.len(),
            self.path.display()
        );
        Ok(file.records)
    }

    async fn save(&self, records: &[Record]) -> Result<(), StoreError> {
        let file = StoreFile {
            format: STORE_FORMAT,
            records: records.to_vec(),
        };
        let bytes = bincode::serialize(&file)?;

        // Write beside the target, then swap it in
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        info!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Indices into the loaded record list that are to be dropped on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionSet {
    indices: BTreeSet<usize>,
}

impl DeletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the record was already marked.
    pub fn mark(&mut self, index: usize) -> bool {
        self.indices.insert(index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Keeps every record not in `deletions`, in their original order.
pub fn apply_deletions(records: Vec<Record>, deletions: &DeletionSet) -> Vec<Record> {
    records
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !deletions.contains(*index))
        .map(|(_, record)| record)
        .collect()
}
