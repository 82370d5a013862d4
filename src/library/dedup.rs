//! Library deduplication
//!
//! Splits candidate directories into ones not yet in the library and ones
//! whose normalized name is already listed, and classifies catalog hits.

use super::dirname::{normalize_name, parse_dir_name};
use crate::catalog::RemoteGameInfo;
use crate::db::GameRecord;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Result of checking candidate directories against the library
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LibraryPartition {
    /// Paths with no name match in the library
    pub unlisted: Vec<PathBuf>,
    /// Display names of paths already in the library
    pub duplicates: Vec<String>,
}

/// Partition `paths` by normalized-name membership in `library`.
///
/// Independent of remote ids; this is the pre-insert check.
pub fn partition_unlisted(paths: &[PathBuf], library: &[GameRecord]) -> LibraryPartition {
    let listed: HashSet<String> = library.iter().map(|g| normalize_name(&g.name)).collect();

    let mut partition = LibraryPartition::default();
    for path in paths {
        let info = parse_dir_name(path);
        if listed.contains(&normalize_name(&info.name)) {
            partition.duplicates.push(display_name(&info.name, path));
        } else {
            partition.unlisted.push(path.clone());
        }
    }

    tracing::debug!(
        "Library check: {} unlisted, {} already listed",
        partition.unlisted.len(),
        partition.duplicates.len()
    );

    partition
}

fn display_name(clean: &str, path: &Path) -> String {
    if !clean.is_empty() {
        return clean.to_string();
    }
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// How many catalog entries matched a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchClass {
    Zero,
    Single(RemoteGameInfo),
    Multiple(Vec<RemoteGameInfo>),
}

pub fn classify_matches(mut results: Vec<RemoteGameInfo>) -> MatchClass {
    match results.len() {
        0 => MatchClass::Zero,
        1 => MatchClass::Single(results.remove(0)),
        _ => MatchClass::Multiple(results),
    }
}

/// Itemized notices up to `itemize_limit` duplicates, one aggregate above it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateNoticePolicy {
    pub itemize_limit: usize,
}

impl Default for DuplicateNoticePolicy {
    fn default() -> Self {
        Self { itemize_limit: 5 }
    }
}

impl DuplicateNoticePolicy {
    pub fn notices(&self, duplicates: &[String]) -> Vec<String> {
        if duplicates.is_empty() {
            return Vec::new();
        }
        if duplicates.len() <= self.itemize_limit {
            duplicates
                .iter()
                .map(|name| format!("'{}' is already in the library", name))
                .collect()
        } else {
            vec![format!(
                "{} games are already in the library",
                duplicates.len()
            )]
        }
    }
}
