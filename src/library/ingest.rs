//! Game ingestion pipeline
//!
//! Each directory or URL runs parse -> query -> classify -> (resolve) ->
//! check -> insert independently. One item failing never aborts a batch;
//! every item ends up as a `Result` in the [`IngestReport`].

use super::dedup::{classify_matches, partition_unlisted, DuplicateNoticePolicy, MatchClass};
use super::dirname::{normalize_name, parse_dir_name, DirInfo, UNKNOWN_VERSION};
use super::resolver::ConflictResolver;
use crate::catalog::{RemoteCatalog, RemoteGameInfo};
use crate::db::{GameRecord, GameStore, WriteGuard};
use crate::error::{WatchError, WatchResult};
use crate::notify::{NoticeLevel, Notifier};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Terminal non-error outcome of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted(GameRecord),
    /// User declined to pick among several catalog matches
    Cancelled { name: String },
}

/// One processed directory or URL
#[derive(Debug)]
pub struct IngestItem {
    /// Directory path or URL as given
    pub source: String,
    pub result: WatchResult<IngestOutcome>,
}

/// Per-item results of a batch, in input order
#[derive(Debug, Default)]
pub struct IngestReport {
    pub items: Vec<IngestItem>,
}

impl IngestReport {
    pub fn inserted(&self) -> impl Iterator<Item = &GameRecord> {
        self.items.iter().filter_map(|item| match &item.result {
            Ok(IngestOutcome::Inserted(record)) => Some(record),
            _ => None,
        })
    }

    /// Display names of items skipped as already listed
    pub fn duplicates(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| match &item.result {
                Err(WatchError::AlreadyListed { name, .. }) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn not_found(&self) -> impl Iterator<Item = &IngestItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.result, Err(WatchError::NotFound { .. })))
    }

    pub fn cancelled(&self) -> impl Iterator<Item = &IngestItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.result, Ok(IngestOutcome::Cancelled { .. })))
    }

    /// Items that failed for reasons other than duplicates or missing matches
    pub fn failures(&self) -> impl Iterator<Item = (&str, &WatchError)> {
        self.items.iter().filter_map(|item| match &item.result {
            Err(e) if !e.is_benign() => Some((item.source.as_str(), e)),
            _ => None,
        })
    }

    /// User-facing notices for the whole batch
    pub fn summary_notices(&self, policy: &DuplicateNoticePolicy) -> Vec<(NoticeLevel, String)> {
        let mut notices = Vec::new();

        for item in &self.items {
            match &item.result {
                Ok(IngestOutcome::Inserted(record)) => notices.push((
                    NoticeLevel::Success,
                    format!("Added '{}' ({})", record.name, record.version),
                )),
                Ok(IngestOutcome::Cancelled { name }) => {
                    notices.push((NoticeLevel::Info, format!("Skipped '{}'", name)))
                }
                Err(WatchError::AlreadyListed { .. }) => {}
                Err(e @ WatchError::NotFound { .. }) => {
                    notices.push((NoticeLevel::Warning, e.to_string()))
                }
                Err(e) => notices.push((
                    NoticeLevel::Error,
                    format!("Failed to add '{}': {}", item.source, e),
                )),
            }
        }

        notices.extend(
            policy
                .notices(&self.duplicates())
                .into_iter()
                .map(|n| (NoticeLevel::Warning, n)),
        );

        notices
    }
}

/// Orchestrates catalog lookup, deduplication and persistence of games
pub struct GameIngestionPipeline {
    catalog: Arc<dyn RemoteCatalog>,
    games: Arc<dyn GameStore>,
    resolver: ConflictResolver,
    notifier: Arc<dyn Notifier>,
    notice_policy: DuplicateNoticePolicy,
    guard: WriteGuard,
}

impl GameIngestionPipeline {
    pub fn new(
        catalog: Arc<dyn RemoteCatalog>,
        games: Arc<dyn GameStore>,
        resolver: ConflictResolver,
        notifier: Arc<dyn Notifier>,
        guard: WriteGuard,
    ) -> Self {
        Self {
            catalog,
            games,
            resolver,
            notifier,
            notice_policy: DuplicateNoticePolicy::default(),
            guard,
        }
    }

    pub fn with_notice_policy(mut self, policy: DuplicateNoticePolicy) -> Self {
        self.notice_policy = policy;
        self
    }

    /// Ingest a batch of local game directories.
    ///
    /// Only failing to read the library up front is fatal; everything else
    /// is recorded per item.
    pub async fn ingest_directories(&self, paths: &[PathBuf]) -> WatchResult<IngestReport> {
        let _lock = self.guard.lock().await;

        let library = self.games.list_games().map_err(WatchError::Store)?;
        let partition = partition_unlisted(paths, &library);

        let mut listed: HashSet<String> =
            library.iter().map(|g| normalize_name(&g.name)).collect();

        let mut report = IngestReport::default();
        let mut duplicates = partition.duplicates.into_iter();

        tracing::info!(
            "Ingesting {} directories ({} new by name)",
            paths.len(),
            partition.unlisted.len()
        );

        // Keep input order in the report
        let unlisted: HashSet<&PathBuf> = partition.unlisted.iter().collect();
        for path in paths {
            let source = path.display().to_string();

            if !unlisted.contains(path) {
                let name = duplicates.next().unwrap_or_else(|| source.clone());
                report.items.push(IngestItem {
                    source,
                    result: Err(WatchError::AlreadyListed {
                        name,
                        remote_id: None,
                    }),
                });
                continue;
            }

            let result = self.ingest_directory(path, &mut listed).await;
            match &result {
                Ok(IngestOutcome::Inserted(record)) => {
                    tracing::info!("Added {} (remote id {})", record.name, record.remote_id)
                }
                Err(e) if !e.is_benign() => tracing::warn!("Failed to ingest {}: {}", source, e),
                Err(e) => tracing::debug!("Skipped {}: {}", source, e),
                Ok(IngestOutcome::Cancelled { .. }) => {}
            }
            report.items.push(IngestItem { source, result });
        }

        self.announce(&report);
        Ok(report)
    }

    /// Ingest one game by its catalog URL.
    ///
    /// `directory`, when given, supplies the local version, mod flag and
    /// install path.
    pub async fn ingest_url(&self, url: &str, directory: Option<&Path>) -> IngestReport {
        let _lock = self.guard.lock().await;

        let result = self.process_url(url, directory).await;
        if let Err(e) = &result {
            if !e.is_benign() {
                tracing::warn!("Failed to ingest {}: {}", url, e);
            }
        }

        let report = IngestReport {
            items: vec![IngestItem {
                source: url.to_string(),
                result,
            }],
        };
        self.announce(&report);
        report
    }

    async fn ingest_directory(
        &self,
        path: &Path,
        listed: &mut HashSet<String>,
    ) -> WatchResult<IngestOutcome> {
        let info = parse_dir_name(path);
        let key = normalize_name(&info.name);

        // Catches repeats within the same batch
        if listed.contains(&key) {
            return Err(WatchError::AlreadyListed {
                name: info.name,
                remote_id: None,
            });
        }

        if info.name.is_empty() {
            return Err(WatchError::NotFound {
                query: path.display().to_string(),
            });
        }

        let results = self
            .catalog
            .search_by_name(&info.name, info.is_mod)
            .await
            .map_err(WatchError::Transport)?;

        let chosen = match classify_matches(results) {
            MatchClass::Zero => {
                return Err(WatchError::NotFound {
                    query: info.name,
                })
            }
            MatchClass::Single(found) => found,
            MatchClass::Multiple(candidates) => {
                match self.resolver.resolve(&info.name, candidates).await {
                    Some(found) => found,
                    None => return Ok(IngestOutcome::Cancelled { name: info.name }),
                }
            }
        };

        let record = self.check_and_insert(&chosen, &info)?;
        listed.insert(key);
        listed.insert(normalize_name(&record.name));
        Ok(IngestOutcome::Inserted(record))
    }

    async fn process_url(&self, url: &str, directory: Option<&Path>) -> WatchResult<IngestOutcome> {
        let info = match directory {
            Some(dir) => {
                let info = parse_dir_name(dir);
                let library = self.games.list_games().map_err(WatchError::Store)?;
                let partition = partition_unlisted(&[dir.to_path_buf()], &library);
                if let Some(name) = partition.duplicates.into_iter().next() {
                    return Err(WatchError::AlreadyListed {
                        name,
                        remote_id: None,
                    });
                }
                info
            }
            None => DirInfo {
                path: PathBuf::new(),
                name: String::new(),
                version: UNKNOWN_VERSION.to_string(),
                is_mod: false,
            },
        };

        let found = self
            .catalog
            .fetch_by_url(url)
            .await
            .map_err(WatchError::Transport)?
            .ok_or_else(|| WatchError::NotFound {
                query: url.to_string(),
            })?;

        self.check_and_insert(&found, &info)
            .map(IngestOutcome::Inserted)
    }

    fn check_and_insert(&self, chosen: &RemoteGameInfo, info: &DirInfo) -> WatchResult<GameRecord> {
        // Bad catalog data is a remote fault, not a store one
        chosen.validate().map_err(WatchError::Transport)?;

        if self
            .games
            .find_game_by_remote_id(chosen.id)
            .map_err(WatchError::Store)?
            .is_some()
        {
            return Err(WatchError::AlreadyListed {
                name: chosen.name.clone(),
                remote_id: Some(chosen.id),
            });
        }

        let record = merge_game_record(chosen, info);
        self.games.insert_game(&record).map_err(WatchError::Store)
    }

    fn announce(&self, report: &IngestReport) {
        for (level, message) in report.summary_notices(&self.notice_policy) {
            self.notifier.notify(level, &message);
        }
    }
}

/// Catalog metadata plus the local version, directory and mod flag
pub fn merge_game_record(remote: &RemoteGameInfo, local: &DirInfo) -> GameRecord {
    GameRecord {
        id: None,
        remote_id: remote.id,
        name: remote.name.clone(),
        version: local.version.clone(),
        game_directory: local.path.display().to_string(),
        is_mod: local.is_mod,
        author: Some(remote.author.clone()).filter(|a| !a.is_empty()),
        remote_version: Some(remote.version.clone()).filter(|v| !v.is_empty()),
        url: remote.url.clone(),
        summary: remote.summary.clone(),
        added_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{info, FakeCatalog};
    use crate::db::Database;
    use crate::notify::testing::RecordingNotifier;
    use crate::prompt::MockChooser;

    struct Harness {
        db: Arc<Database>,
        notifier: Arc<RecordingNotifier>,
        pipeline: GameIngestionPipeline,
    }

    fn harness(catalog: FakeCatalog, chooser: MockChooser) -> Harness {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = GameIngestionPipeline::new(
            Arc::new(catalog),
            db.clone(),
            ConflictResolver::new(Arc::new(chooser)),
            notifier.clone(),
            WriteGuard::new(),
        );
        Harness {
            db,
            notifier,
            pipeline,
        }
    }

    fn no_prompt() -> MockChooser {
        let mut chooser = MockChooser::new();
        chooser.expect_choose().times(0);
        chooser
    }

    fn existing(remote_id: i64, name: &str) -> GameRecord {
        merge_game_record(&info(remote_id, name), &parse_dir_name(Path::new(name)))
    }

    #[tokio::test]
    async fn single_match_is_inserted_with_local_details() {
        let catalog = FakeCatalog::default().with_search("Cool Game", vec![info(10, "Cool Game")]);
        let h = harness(catalog, no_prompt());

        let report = h
            .pipeline
            .ingest_directories(&[PathBuf::from("/games/Cool Game [v.0.5] [MOD]")])
            .await
            .unwrap();

        let inserted: Vec<_> = report.inserted().collect();
        assert_eq!(inserted.len(), 1);
        let stored = h.db.find_game_by_remote_id(10).unwrap().unwrap();
        assert_eq!(stored.version, "0.5");
        assert!(stored.is_mod);
        assert_eq!(stored.game_directory, "/games/Cool Game [v.0.5] [MOD]");
        assert_eq!(stored.remote_version.as_deref(), Some("1.0"));
        assert_eq!(h.notifier.count(NoticeLevel::Success), 1);
    }

    #[tokio::test]
    async fn zero_matches_is_not_found_without_mutation() {
        let h = harness(FakeCatalog::default(), no_prompt());

        let report = h
            .pipeline
            .ingest_directories(&[PathBuf::from("/games/Nothing Here")])
            .await
            .unwrap();

        assert_eq!(report.not_found().count(), 1);
        assert!(h.db.list_games().unwrap().is_empty());
        assert_eq!(h.notifier.messages(), vec!["No game found for 'Nothing Here'"]);
    }

    #[tokio::test]
    async fn multiple_matches_use_the_chosen_candidate() {
        let catalog = FakeCatalog::default().with_search(
            "Game X",
            vec![info(12, "Game X"), info(77, "Game X"), info(3, "Game X")],
        );
        let mut chooser = MockChooser::new();
        chooser
            .expect_choose()
            .withf(|_, options| options.len() == 3)
            .times(1)
            .returning(|_, _| Some(1));
        let h = harness(catalog, chooser);

        h.pipeline
            .ingest_directories(&[PathBuf::from("/games/Game X")])
            .await
            .unwrap();

        let games = h.db.list_games().unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].remote_id, 77);
    }

    #[tokio::test]
    async fn declined_choice_is_cancelled_cleanly() {
        let catalog = FakeCatalog::default()
            .with_search("Game X", vec![info(1, "Game X"), info(2, "Game X")]);
        let mut chooser = MockChooser::new();
        chooser.expect_choose().times(1).returning(|_, _| None);
        let h = harness(catalog, chooser);

        let report = h
            .pipeline
            .ingest_directories(&[PathBuf::from("/games/Game X")])
            .await
            .unwrap();

        assert_eq!(report.cancelled().count(), 1);
        assert_eq!(report.failures().count(), 0);
        assert!(h.db.list_games().unwrap().is_empty());
    }

    #[tokio::test]
    async fn existing_remote_id_is_already_listed() {
        let catalog =
            FakeCatalog::default().with_search("Renamed Game", vec![info(5, "Original Game")]);
        let h = harness(catalog, no_prompt());
        h.db.insert_game(&existing(5, "Original Game")).unwrap();

        let report = h
            .pipeline
            .ingest_directories(&[PathBuf::from("/games/Renamed Game")])
            .await
            .unwrap();

        match &report.items[0].result {
            Err(WatchError::AlreadyListed { remote_id, .. }) => assert_eq!(*remote_id, Some(5)),
            other => panic!("expected already listed, got {:?}", other),
        }
        assert_eq!(h.db.list_games().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn normalized_name_duplicates_are_rejected_before_lookup() {
        let catalog = FakeCatalog::default();
        let h = harness(catalog, no_prompt());
        h.db.insert_game(&existing(1, "Game A")).unwrap();

        let report = h
            .pipeline
            .ingest_directories(&[
                PathBuf::from("/games/Game A"),
                PathBuf::from("/games/Game A [v2]"),
            ])
            .await
            .unwrap();

        assert_eq!(report.duplicates(), vec!["Game A", "Game A"]);
        assert_eq!(h.db.list_games().unwrap().len(), 1);
        assert_eq!(
            h.notifier.messages(),
            vec![
                "'Game A' is already in the library",
                "'Game A' is already in the library"
            ]
        );
    }

    #[tokio::test]
    async fn same_batch_repeat_is_caught_after_first_insert() {
        let catalog = FakeCatalog::default().with_search("Game A", vec![info(1, "Game A")]);
        let h = harness(catalog, no_prompt());

        let report = h
            .pipeline
            .ingest_directories(&[
                PathBuf::from("/games/Game A"),
                PathBuf::from("/games/Game A [v2]"),
            ])
            .await
            .unwrap();

        assert_eq!(report.inserted().count(), 1);
        assert_eq!(report.duplicates(), vec!["Game A"]);
        assert_eq!(h.db.list_games().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_does_not_abort_batch() {
        let catalog = FakeCatalog::default()
            .with_search("Good Game", vec![info(2, "Good Game")])
            .failing_on("Bad Game");
        let h = harness(catalog, no_prompt());

        let report = h
            .pipeline
            .ingest_directories(&[
                PathBuf::from("/games/Bad Game"),
                PathBuf::from("/games/Good Game"),
            ])
            .await
            .unwrap();

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].1, WatchError::Transport(_)));
        assert_eq!(report.inserted().count(), 1);
        assert_eq!(h.notifier.count(NoticeLevel::Error), 1);
    }

    /// Library whose inserts fail for one game name
    struct FlakyGameStore {
        inner: Arc<Database>,
        fail_on: &'static str,
    }

    impl GameStore for FlakyGameStore {
        fn list_games(&self) -> anyhow::Result<Vec<GameRecord>> {
            self.inner.list_games()
        }

        fn find_game_by_remote_id(&self, remote_id: i64) -> anyhow::Result<Option<GameRecord>> {
            self.inner.find_game_by_remote_id(remote_id)
        }

        fn insert_game(&self, game: &GameRecord) -> anyhow::Result<GameRecord> {
            if game.name == self.fail_on {
                anyhow::bail!("database is locked");
            }
            self.inner.insert_game(game)
        }
    }

    #[tokio::test]
    async fn store_failure_does_not_abort_batch() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let notifier = Arc::new(RecordingNotifier::default());
        let catalog = FakeCatalog::default()
            .with_search("Bad Game", vec![info(1, "Bad Game")])
            .with_search("Good Game", vec![info(2, "Good Game")]);
        let pipeline = GameIngestionPipeline::new(
            Arc::new(catalog),
            Arc::new(FlakyGameStore {
                inner: db.clone(),
                fail_on: "Bad Game",
            }),
            ConflictResolver::new(Arc::new(no_prompt())),
            notifier.clone(),
            WriteGuard::new(),
        );

        let report = pipeline
            .ingest_directories(&[
                PathBuf::from("/games/Bad Game"),
                PathBuf::from("/games/Good Game"),
            ])
            .await
            .unwrap();

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "/games/Bad Game");
        assert!(matches!(failures[0].1, WatchError::Store(_)));
        assert_eq!(report.inserted().count(), 1);
        assert!(db.find_game_by_remote_id(2).unwrap().is_some());
        assert!(db.find_game_by_remote_id(1).unwrap().is_none());
        assert_eq!(notifier.count(NoticeLevel::Error), 1);
    }

    #[tokio::test]
    async fn malformed_catalog_entry_is_a_transport_failure() {
        let catalog = FakeCatalog::default()
            .with_search("Broken", vec![info(0, "Broken")])
            .with_search("Fine", vec![info(3, "Fine")]);
        let h = harness(catalog, no_prompt());

        let report = h
            .pipeline
            .ingest_directories(&[PathBuf::from("/games/Broken"), PathBuf::from("/games/Fine")])
            .await
            .unwrap();

        match &report.items[0].result {
            Err(WatchError::Transport(e)) => assert!(e.to_string().contains("invalid id 0")),
            other => panic!("expected transport failure, got {:?}", other),
        }
        assert_eq!(report.inserted().count(), 1);
        assert_eq!(h.db.list_games().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn many_duplicates_collapse_into_one_notice() {
        let h = harness(FakeCatalog::default(), no_prompt());
        let mut paths = Vec::new();
        for i in 0..7 {
            let name = format!("Game {}", i);
            h.db.insert_game(&existing(i + 1, &name)).unwrap();
            paths.push(PathBuf::from(format!("/games/{}", name)));
        }

        let report = h.pipeline.ingest_directories(&paths).await.unwrap();
        assert_eq!(report.duplicates().len(), 7);
        assert_eq!(
            h.notifier.messages(),
            vec!["7 games are already in the library"]
        );
    }

    #[tokio::test]
    async fn url_flow_inserts_single_result() {
        let url = "https://forum.example/threads/game-y.88/";
        let catalog = FakeCatalog::default().with_url(url, info(88, "Game Y"));
        let h = harness(catalog, no_prompt());

        let report = h
            .pipeline
            .ingest_url(url, Some(Path::new("/games/Game Y [v.2.1]")))
            .await;

        assert_eq!(report.inserted().count(), 1);
        let stored = h.db.find_game_by_remote_id(88).unwrap().unwrap();
        assert_eq!(stored.version, "2.1");
    }

    #[tokio::test]
    async fn url_flow_reports_not_found_and_duplicates() {
        let url = "https://forum.example/threads/game-y.88/";
        let catalog = FakeCatalog::default().with_url(url, info(88, "Game Y"));
        let h = harness(catalog, no_prompt());

        let missing = h.pipeline.ingest_url("https://forum.example/threads/x.1/", None).await;
        assert_eq!(missing.not_found().count(), 1);

        h.pipeline.ingest_url(url, None).await;
        let again = h.pipeline.ingest_url(url, None).await;
        assert_eq!(again.duplicates(), vec!["Game Y"]);
        assert_eq!(h.db.list_games().unwrap().len(), 1);
        assert_eq!(
            h.db.find_game_by_remote_id(88).unwrap().unwrap().version,
            UNKNOWN_VERSION
        );
    }
}
