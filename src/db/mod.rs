//! SQLite database for watched threads and the game library

mod schema;

pub use schema::*;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Persisted watched threads.
///
/// Mutated only by [`crate::threads::ThreadWatchSynchronizer`].
pub trait ThreadStore: Send + Sync {
    fn find_thread(&self, remote_id: i64) -> Result<Option<ThreadRecord>>;
    fn list_threads(&self) -> Result<Vec<ThreadRecord>>;
    /// Threads with `update_available AND NOT marked_as_read`, ordered by name
    fn find_updated_unread(&self) -> Result<Vec<ThreadRecord>>;
    /// Returns the record with its store-assigned id
    fn insert_thread(&self, thread: &ThreadRecord) -> Result<ThreadRecord>;
    fn update_thread(&self, thread: &ThreadRecord) -> Result<()>;
    fn delete_thread(&self, id: i64) -> Result<()>;
    fn set_thread_read(&self, remote_id: i64, read: bool) -> Result<bool>;
}

/// Persisted game library.
///
/// Inserted into only by [`crate::library::GameIngestionPipeline`].
pub trait GameStore: Send + Sync {
    fn list_games(&self) -> Result<Vec<GameRecord>>;
    fn find_game_by_remote_id(&self, remote_id: i64) -> Result<Option<GameRecord>>;
    fn insert_game(&self, game: &GameRecord) -> Result<GameRecord>;

    fn remote_ids(&self) -> Result<HashSet<i64>> {
        Ok(self.list_games()?.into_iter().map(|g| g.remote_id).collect())
    }
}

/// Single-writer lock shared by every flow that mutates the stores.
///
/// A sync pass or ingestion batch holds it for its whole duration.
#[derive(Debug, Clone, Default)]
pub struct WriteGuard(Arc<tokio::sync::Mutex<()>>);

impl WriteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// Database wrapper with thread-safe access
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;
        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Database connection mutex poisoned"))
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Watched remote threads
            CREATE TABLE IF NOT EXISTS threads (
                id INTEGER PRIMARY KEY,
                remote_id INTEGER NOT NULL UNIQUE,
                url TEXT NOT NULL,
                name TEXT NOT NULL,
                update_available INTEGER NOT NULL DEFAULT 0,
                marked_as_read INTEGER NOT NULL DEFAULT 0
            );

            -- Installed games
            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                remote_id INTEGER NOT NULL UNIQUE,
                name TEXT NOT NULL,
                version TEXT NOT NULL,
                game_directory TEXT NOT NULL,
                is_mod INTEGER NOT NULL DEFAULT 0,
                author TEXT,
                remote_version TEXT,
                url TEXT,
                summary TEXT,
                added_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_threads_updated
                ON threads(update_available, marked_as_read);
            CREATE INDEX IF NOT EXISTS idx_games_name ON games(name COLLATE NOCASE);
            "#,
        )
        .context("Failed to initialize schema")?;

        Ok(())
    }
}

// ========== Thread Operations ==========

impl ThreadStore for Database {
    fn find_thread(&self, remote_id: i64) -> Result<Option<ThreadRecord>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, remote_id, url, name, update_available, marked_as_read
             FROM threads WHERE remote_id = ?1",
            params![remote_id],
            |row| ThreadRecord::from_row(row),
        )
        .optional()
        .context("Failed to query thread")
    }

    fn list_threads(&self) -> Result<Vec<ThreadRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, remote_id, url, name, update_available, marked_as_read
             FROM threads ORDER BY name COLLATE NOCASE ASC",
        )?;

        let threads = stmt
            .query_map([], |row| ThreadRecord::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(threads)
    }

    fn find_updated_unread(&self) -> Result<Vec<ThreadRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, remote_id, url, name, update_available, marked_as_read
             FROM threads
             WHERE update_available = 1 AND marked_as_read = 0
             ORDER BY name COLLATE NOCASE ASC",
        )?;

        let threads = stmt
            .query_map([], |row| ThreadRecord::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(threads)
    }

    fn insert_thread(&self, thread: &ThreadRecord) -> Result<ThreadRecord> {
        thread.validate()?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO threads (remote_id, url, name, update_available, marked_as_read)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                thread.remote_id,
                thread.url,
                thread.name,
                thread.update_available as i32,
                thread.marked_as_read as i32,
            ],
        )
        .with_context(|| format!("Failed to insert thread {}", thread.remote_id))?;

        Ok(ThreadRecord {
            id: Some(conn.last_insert_rowid()),
            ..thread.clone()
        })
    }

    fn update_thread(&self, thread: &ThreadRecord) -> Result<()> {
        thread.validate()?;
        let id = thread
            .id
            .ok_or_else(|| anyhow!("Cannot update thread {} without an id", thread.remote_id))?;

        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE threads SET
                remote_id = ?2,
                url = ?3,
                name = ?4,
                update_available = ?5,
                marked_as_read = ?6
            WHERE id = ?1
            "#,
            params![
                id,
                thread.remote_id,
                thread.url,
                thread.name,
                thread.update_available as i32,
                thread.marked_as_read as i32,
            ],
        )?;

        if changed == 0 {
            anyhow::bail!("Thread row {} no longer exists", id);
        }
        Ok(())
    }

    fn delete_thread(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM threads WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn set_thread_read(&self, remote_id: i64, read: bool) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE threads SET marked_as_read = ?1 WHERE remote_id = ?2",
            params![read as i32, remote_id],
        )?;
        Ok(changed > 0)
    }
}

// ========== Game Operations ==========

impl GameStore for Database {
    fn list_games(&self) -> Result<Vec<GameRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, remote_id, name, version, game_directory, is_mod, author,
                    remote_version, url, summary, added_at
             FROM games ORDER BY name COLLATE NOCASE ASC",
        )?;

        let games = stmt
            .query_map([], |row| GameRecord::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(games)
    }

    fn find_game_by_remote_id(&self, remote_id: i64) -> Result<Option<GameRecord>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, remote_id, name, version, game_directory, is_mod, author,
                    remote_version, url, summary, added_at
             FROM games WHERE remote_id = ?1",
            params![remote_id],
            |row| GameRecord::from_row(row),
        )
        .optional()
        .context("Failed to query game by remote id")
    }

    fn insert_game(&self, game: &GameRecord) -> Result<GameRecord> {
        game.validate()?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO games (remote_id, name, version, game_directory, is_mod, author,
                               remote_version, url, summary, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                game.remote_id,
                game.name,
                game.version,
                game.game_directory,
                game.is_mod as i32,
                game.author,
                game.remote_version,
                game.url,
                game.summary,
                game.added_at,
            ],
        )
        .with_context(|| format!("Failed to insert game {}", game.remote_id))?;

        Ok(GameRecord {
            id: Some(conn.last_insert_rowid()),
            ..game.clone()
        })
    }

    fn remote_ids(&self) -> Result<HashSet<i64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT remote_id FROM games")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }
}
