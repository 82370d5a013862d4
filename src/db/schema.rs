//! Database record types

use anyhow::{bail, Result};
use rusqlite::Row;

/// Watched remote thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRecord {
    /// Row id assigned by the store; `None` until inserted
    pub id: Option<i64>,
    pub remote_id: i64,
    pub url: String,
    pub name: String,
    pub update_available: bool,
    pub marked_as_read: bool,
}

impl ThreadRecord {
    /// A freshly observed thread: never flagged as updated on first sight.
    pub fn new(remote_id: i64, url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            remote_id,
            url: url.into(),
            name: name.into(),
            update_available: false,
            marked_as_read: false,
        }
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            remote_id: row.get(1)?,
            url: row.get(2)?,
            name: row.get(3)?,
            update_available: row.get::<_, i32>(4)? != 0,
            marked_as_read: row.get::<_, i32>(5)? != 0,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.remote_id <= 0 {
            bail!("Thread remote id must be positive, got {}", self.remote_id);
        }
        if self.url.trim().is_empty() {
            bail!("Thread {} has an empty URL", self.remote_id);
        }
        Ok(())
    }
}

/// Installed game in the local library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub id: Option<i64>,
    pub remote_id: i64,
    pub name: String,
    /// Locally installed version, parsed from the directory name
    pub version: String,
    pub game_directory: String,
    pub is_mod: bool,
    pub author: Option<String>,
    /// Latest version advertised by the catalog at ingestion time
    pub remote_version: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub added_at: String,
}

impl GameRecord {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            remote_id: row.get(1)?,
            name: row.get(2)?,
            version: row.get(3)?,
            game_directory: row.get(4)?,
            is_mod: row.get::<_, i32>(5)? != 0,
            author: row.get(6)?,
            remote_version: row.get(7)?,
            url: row.get(8)?,
            summary: row.get(9)?,
            added_at: row.get(10)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.remote_id <= 0 {
            bail!("Game remote id must be positive, got {}", self.remote_id);
        }
        if self.name.trim().is_empty() {
            bail!("Game {} has an empty name", self.remote_id);
        }
        Ok(())
    }
}
