//! CLI command action handlers

use super::App;
use crate::db::{GameStore, ThreadStore};
use crate::library::discover_game_dirs;
use crate::threads::{read_watch_list, SyncReport};
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

impl App {
    // ========== Watch Commands ==========

    /// Sync the watch list: explicit URLs win, then `--file`, then the
    /// configured watch list file
    pub async fn cmd_sync(&self, file: Option<&Path>, urls: Vec<String>) -> Result<SyncReport> {
        let urls = if !urls.is_empty() {
            urls
        } else if let Some(path) = file.or(self.config.watch.watch_list_file.as_deref()) {
            read_watch_list(path).await?
        } else {
            bail!("No watch URLs given. Pass URLs, --file, or set watch.watch_list_file in the config.");
        };

        let report = self.synchronizer().sync(&urls).await?;

        println!(
            "Synced {} URL(s): {} new, {} updated, {} unchanged, {} removed",
            urls.len(),
            report.inserted.len(),
            report.updated.len(),
            report.unchanged,
            report.removed.len()
        );
        for url in &report.skipped_urls {
            println!("  Skipped (no thread id): {}", url);
        }
        for (remote_id, error) in &report.failed {
            println!("  Failed thread {}: {}", remote_id, error);
        }

        Ok(report)
    }

    pub async fn cmd_updated(&self) -> Result<()> {
        let threads = self.synchronizer().updated_threads()?;

        if threads.is_empty() {
            println!("No updated threads.");
            return Ok(());
        }

        println!("Updated threads:");
        println!("{:-<60}", "");
        for thread in &threads {
            println!("  [{}] {}\n    {}", thread.remote_id, thread.name, thread.url);
        }
        Ok(())
    }

    pub async fn cmd_read(&self, remote_id: i64) -> Result<()> {
        if self.synchronizer().mark_read(remote_id).await? {
            println!("Marked thread {} as read", remote_id);
        } else {
            bail!("Thread {} is not being watched", remote_id);
        }
        Ok(())
    }

    pub async fn cmd_threads(&self) -> Result<()> {
        let threads = self.db.list_threads()?;

        if threads.is_empty() {
            println!("No watched threads. Run 'gamewatch sync' first.");
            return Ok(());
        }

        println!("Watched threads ({}):", threads.len());
        println!("{:-<60}", "");
        for thread in &threads {
            let marker = match (thread.update_available, thread.marked_as_read) {
                (true, false) => " [updated]",
                (true, true) => " [read]",
                _ => "",
            };
            println!("  [{}] {}{}", thread.remote_id, thread.name, marker);
        }
        Ok(())
    }

    // ========== Library Commands ==========

    pub async fn cmd_import_dirs(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            bail!("No directories given");
        }

        let report = self.pipeline().ingest_directories(paths).await?;
        println!(
            "Processed {} director{}: {} added, {} already listed",
            report.items.len(),
            if report.items.len() == 1 { "y" } else { "ies" },
            report.inserted().count(),
            report.duplicates().len()
        );
        Ok(())
    }

    /// Ingest every immediate subdirectory of `root`
    pub async fn cmd_import_scan(&self, root: &Path) -> Result<()> {
        let dirs = discover_game_dirs(root)?;
        if dirs.is_empty() {
            println!("No game directories found in {}", root.display());
            return Ok(());
        }

        println!("Found {} game director(ies) in {}", dirs.len(), root.display());
        self.cmd_import_dirs(&dirs).await
    }

    pub async fn cmd_import_url(&self, url: &str, directory: Option<&Path>) -> Result<()> {
        let report = self.pipeline().ingest_url(url, directory).await;

        // Notices already told the user what happened; only real faults
        // change the exit status
        if let Some((_, error)) = report.failures().next() {
            bail!("Failed to add {}: {}", url, error);
        }
        Ok(())
    }

    pub async fn cmd_games(&self) -> Result<()> {
        let games = self.db.list_games()?;

        if games.is_empty() {
            println!("Library is empty. Run 'gamewatch import' to add games.");
            return Ok(());
        }

        println!("Library ({} games):", games.len());
        println!("{:-<60}", "");
        for game in &games {
            let kind = if game.is_mod { " [mod]" } else { "" };
            println!(
                "  {} {}{} (remote id {})",
                game.name, game.version, kind, game.remote_id
            );
            if !game.game_directory.is_empty() {
                println!("    Path: {}", game.game_directory);
            }
        }
        Ok(())
    }
}
