//! Protocol number to client version resolution
//!
//! The catalog is fetched exactly once per run. A failed fetch aborts the run,
//! since a partial catalog would silently skip servers.

use crate::error::ScanError;
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://raw.githubusercontent.com/PrismarineJS/minecraft-data/master/data/pc/common/protocolVersions.json";

/// One row of the published protocol catalog.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub minecraft_version: String,
    /// Protocol number
    pub version: i32,
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CatalogEntry>, ScanError>;
}

pub struct HttpCatalog {
    url: String,
    client: reqwest::Client,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch(&self) -> Result<Vec<CatalogEntry>, ScanError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ScanError::Catalog(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScanError::Catalog(format!(
                "{} returned {}",
                self.url,
                response.status()
            )));
        }

        response
            .json::<Vec<CatalogEntry>>()
            .await
            .map_err(|e| ScanError::Catalog(e.to_string()))
    }
}

/// Immutable protocol number lookup for one run.
#[derive(Debug, Clone, Default)]
pub struct VersionCatalog {
    versions: HashMap<i32, String>,
}

impl VersionCatalog {
    /// Builds the lookup; the first entry listed for a protocol number wins.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut versions = HashMap::new();
        for entry in entries {
            versions
                .entry(entry.version)
                .or_insert(entry.minecraft_version);
        }
        Self { versions }
    }

    pub async fn fetch(source: &dyn CatalogSource) -> Result<Self, ScanError> {
        let catalog = Self::from_entries(source.fetch().await?);
        if catalog.is_empty() {
            return Err(ScanError::Catalog("catalog is empty".to_string()));
        }
        info!("Loaded {} protocol versions", catalog.len());
        Ok(catalog)
    }

    pub fn resolve(&self, protocol: i32) -> Option<&str> {
        self.versions.get(&protocol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
