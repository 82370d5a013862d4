//! Watched thread synchronization
//!
//! Reconciles the externally supplied watch list against the local thread
//! store: new ids are inserted, ids whose URL changed are flagged as
//! updated, and ids no longer on the list are removed.

mod watchlist;

pub use watchlist::{extract_remote_id, read_watch_list};

use crate::catalog::RemoteCatalog;
use crate::db::{GameStore, ThreadRecord, ThreadStore, WriteGuard};
use crate::error::{WatchError, WatchResult};
use std::collections::HashSet;
use std::sync::Arc;

/// What one sync pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: Vec<i64>,
    pub updated: Vec<i64>,
    pub unchanged: usize,
    pub removed: Vec<i64>,
    /// URLs without a usable thread id
    pub skipped_urls: Vec<String>,
    /// Remote ids whose fetch failed, with the error text
    pub failed: Vec<(i64, String)>,
}

impl SyncReport {
    pub fn has_changes(&self) -> bool {
        !(self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty())
    }
}

/// Keeps the thread store in line with the watch list
pub struct ThreadWatchSynchronizer {
    catalog: Arc<dyn RemoteCatalog>,
    threads: Arc<dyn ThreadStore>,
    games: Arc<dyn GameStore>,
    guard: WriteGuard,
    abort_on_fetch_error: bool,
}

impl ThreadWatchSynchronizer {
    pub fn new(
        catalog: Arc<dyn RemoteCatalog>,
        threads: Arc<dyn ThreadStore>,
        games: Arc<dyn GameStore>,
        guard: WriteGuard,
    ) -> Self {
        Self {
            catalog,
            threads,
            games,
            guard,
            abort_on_fetch_error: false,
        }
    }

    /// Abort the pass on the first failed remote fetch instead of
    /// recording it and moving on. An aborted pass skips the unsubscribe
    /// step.
    pub fn abort_on_fetch_error(mut self, abort: bool) -> Self {
        self.abort_on_fetch_error = abort;
        self
    }

    /// Run one sync pass over `urls`.
    ///
    /// Store failures are fatal. Fetch failures follow the
    /// `abort_on_fetch_error` policy.
    pub async fn sync(&self, urls: &[String]) -> WatchResult<SyncReport> {
        let _lock = self.guard.lock().await;
        let mut report = SyncReport::default();
        let mut seen_ids = HashSet::new();

        for url in urls {
            let Some(remote_id) = extract_remote_id(url) else {
                tracing::warn!("{}", WatchError::Parse { url: url.clone() });
                report.skipped_urls.push(url.clone());
                continue;
            };

            if !seen_ids.insert(remote_id) {
                tracing::warn!("Thread {} listed more than once, ignoring {}", remote_id, url);
                continue;
            }

            match self.sync_thread(remote_id, url, &mut report).await {
                Ok(()) => {}
                Err(e @ (WatchError::Transport(_) | WatchError::NotFound { .. })) => {
                    if self.abort_on_fetch_error {
                        tracing::error!("Sync aborted at thread {}: {}", remote_id, e);
                        return Err(e);
                    }
                    tracing::warn!("Failed to refresh thread {}: {}", remote_id, e);
                    report.failed.push((remote_id, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        // Unsubscribe pass
        let stored = self.threads.list_threads().map_err(WatchError::Store)?;
        for thread in stored {
            if seen_ids.contains(&thread.remote_id) {
                continue;
            }
            if let Some(id) = thread.id {
                self.threads.delete_thread(id).map_err(WatchError::Store)?;
                tracing::debug!("Removed unwatched thread {} ({})", thread.remote_id, thread.name);
                report.removed.push(thread.remote_id);
            }
        }

        tracing::info!(
            "Sync complete: {} new, {} updated, {} unchanged, {} removed, {} skipped, {} failed",
            report.inserted.len(),
            report.updated.len(),
            report.unchanged,
            report.removed.len(),
            report.skipped_urls.len(),
            report.failed.len()
        );

        Ok(report)
    }

    async fn sync_thread(
        &self,
        remote_id: i64,
        url: &str,
        report: &mut SyncReport,
    ) -> WatchResult<()> {
        let existing = self
            .threads
            .find_thread(remote_id)
            .map_err(WatchError::Store)?;

        match existing {
            None => {
                let info = self.fetch(url).await?;
                let record = ThreadRecord::new(remote_id, url, info.name);
                self.threads
                    .insert_thread(&record)
                    .map_err(WatchError::Store)?;
                tracing::debug!("Watching new thread {} ({})", remote_id, record.name);
                report.inserted.push(remote_id);
            }
            // An unchanged URL is the only "nothing happened upstream" signal
            Some(thread) if thread.url == url => {
                report.unchanged += 1;
            }
            Some(mut thread) => {
                let info = self.fetch(url).await?;
                thread.url = url.to_string();
                thread.name = info.name;
                thread.update_available = true;
                thread.marked_as_read = false;
                self.threads
                    .update_thread(&thread)
                    .map_err(WatchError::Store)?;
                tracing::debug!("Thread {} has an update ({})", remote_id, thread.name);
                report.updated.push(remote_id);
            }
        }

        Ok(())
    }

    async fn fetch(&self, url: &str) -> WatchResult<crate::catalog::RemoteGameInfo> {
        self.catalog
            .fetch_by_url(url)
            .await
            .map_err(WatchError::Transport)?
            .ok_or_else(|| WatchError::NotFound {
                query: url.to_string(),
            })
    }

    /// Updated, unread threads for games that are not installed, by name
    pub fn updated_threads(&self) -> WatchResult<Vec<ThreadRecord>> {
        let installed = self.games.remote_ids().map_err(WatchError::Store)?;
        let mut threads: Vec<ThreadRecord> = self
            .threads
            .find_updated_unread()
            .map_err(WatchError::Store)?
            .into_iter()
            .filter(|t| !installed.contains(&t.remote_id))
            .collect();

        threads.sort_by_cached_key(|t| t.name.to_lowercase());
        Ok(threads)
    }

    /// Acknowledge a thread's update. Returns false if it is not watched.
    pub async fn mark_read(&self, remote_id: i64) -> WatchResult<bool> {
        let _lock = self.guard.lock().await;
        self.threads
            .set_thread_read(remote_id, true)
            .map_err(WatchError::Store)
    }
}
