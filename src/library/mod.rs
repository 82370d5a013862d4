//! Local game library
//!
//! Parses game directory names, checks candidates against the library,
//! resolves ambiguous catalog matches and persists new games.

pub mod dedup;
pub mod dirname;
pub mod ingest;
pub mod resolver;

pub use dedup::{classify_matches, partition_unlisted, DuplicateNoticePolicy, LibraryPartition, MatchClass};
pub use dirname::{clean_name, normalize_name, parse_dir_name, DirInfo, UNKNOWN_VERSION};
pub use ingest::{merge_game_record, GameIngestionPipeline, IngestItem, IngestOutcome, IngestReport};
pub use resolver::ConflictResolver;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Immediate subdirectories of `root`, sorted, as candidate game folders
pub fn discover_game_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to scan {}", root.display()))?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }

    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_lists_only_direct_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Game B [v.1]")).unwrap();
        std::fs::create_dir_all(dir.path().join("Game A").join("nested")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let found = discover_game_dirs(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("Game A"), dir.path().join("Game B [v.1]")]
        );
    }

    #[test]
    fn discover_fails_on_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_game_dirs(&dir.path().join("missing")).is_err());
    }
}
