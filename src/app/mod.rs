//! Application wiring and orchestration

mod actions;

use crate::catalog::{CatalogClient, RemoteCatalog};
use crate::config::Config;
use crate::db::{Database, WriteGuard};
use crate::library::{ConflictResolver, DuplicateNoticePolicy, GameIngestionPipeline};
use crate::notify::{ConsoleNotifier, Notifier};
use crate::prompt::{Chooser, TerminalChooser};
use crate::threads::ThreadWatchSynchronizer;

use anyhow::{Context, Result};
use std::sync::Arc;

/// Main application struct that owns the shared components
pub struct App {
    /// Application configuration
    pub config: Config,

    /// Database connection, shared by both stores
    pub db: Arc<Database>,

    /// Serializes sync passes and ingestion batches
    pub guard: WriteGuard,

    catalog: Arc<dyn RemoteCatalog>,
    notifier: Arc<dyn Notifier>,
    chooser: Arc<dyn Chooser>,
}

impl App {
    /// Create a new App instance backed by the on-disk database and the
    /// HTTP catalog client
    pub async fn new(config: Config) -> Result<Self> {
        let paths = config.paths()?;

        // Ensure directories exist
        paths.ensure_dirs().context("Failed to create directories")?;

        // Initialize database
        let db = Database::open(&paths.database_file()).context("Failed to open database")?;

        let catalog = CatalogClient::new(&config.catalog)
            .context("Failed to initialize catalog client")?;

        Ok(Self::with_components(
            config,
            Arc::new(db),
            Arc::new(catalog),
            Arc::new(ConsoleNotifier),
            Arc::new(TerminalChooser::default()),
        ))
    }

    /// Assemble an App from explicit components
    pub fn with_components(
        config: Config,
        db: Arc<Database>,
        catalog: Arc<dyn RemoteCatalog>,
        notifier: Arc<dyn Notifier>,
        chooser: Arc<dyn Chooser>,
    ) -> Self {
        Self {
            config,
            db,
            guard: WriteGuard::new(),
            catalog,
            notifier,
            chooser,
        }
    }

    /// Route notices somewhere other than the console
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn synchronizer(&self) -> ThreadWatchSynchronizer {
        ThreadWatchSynchronizer::new(
            self.catalog.clone(),
            self.db.clone(),
            self.db.clone(),
            self.guard.clone(),
        )
        .abort_on_fetch_error(self.config.watch.abort_on_fetch_error)
    }

    pub fn pipeline(&self) -> GameIngestionPipeline {
        GameIngestionPipeline::new(
            self.catalog.clone(),
            self.db.clone(),
            ConflictResolver::new(self.chooser.clone()),
            self.notifier.clone(),
            self.guard.clone(),
        )
        .with_notice_policy(DuplicateNoticePolicy {
            itemize_limit: self.config.import.duplicate_notice_limit,
        })
    }
}
