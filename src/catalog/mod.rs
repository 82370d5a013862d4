//! Remote game catalog integration

pub mod client;

pub use client::CatalogClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Game metadata as returned by the remote catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteGameInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RemoteGameInfo {
    /// One-line label used when presenting candidates to the user
    pub fn display_label(&self) -> String {
        let mut label = self.name.clone();
        if !self.author.is_empty() {
            label.push_str(&format!(" by {}", self.author));
        }
        if !self.version.is_empty() {
            label.push_str(&format!(" ({})", self.version));
        }
        label
    }

    /// Reject entries the catalog should never have sent
    pub fn validate(&self) -> Result<()> {
        if self.id <= 0 {
            anyhow::bail!("Catalog entry '{}' has invalid id {}", self.name, self.id);
        }
        if self.name.trim().is_empty() {
            anyhow::bail!("Catalog entry {} has an empty name", self.id);
        }
        Ok(())
    }
}

/// Lookup capability against the remote catalog.
///
/// Failures are transport failures; "nothing found" is `Ok(None)` or an
/// empty list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Resolve a thread/game URL to exactly one catalog entry
    async fn fetch_by_url(&self, url: &str) -> Result<Option<RemoteGameInfo>>;

    /// Search by cleaned name, restricted to mods or to games.
    ///
    /// Results keep the catalog's ordering.
    async fn search_by_name(&self, name: &str, is_mod: bool) -> Result<Vec<RemoteGameInfo>>;
}
