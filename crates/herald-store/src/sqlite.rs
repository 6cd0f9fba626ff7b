//! SQLite implementation of the durable guild set.
//!
//! This is the primary persistence backend for the Herald runtime. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use herald_core::GuildId;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::GuildSetStore;
use crate::DEFAULT_SET_NAME;

/// SQLite-backed durable guild set.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. Each `add`/`remove` is a single
/// statement, so per-entry atomicity comes from SQLite itself.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
    /// The fixed set name this store reads and writes.
    set_name: String,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            set_name: DEFAULT_SET_NAME.to_string(),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            set_name: DEFAULT_SET_NAME.to_string(),
        })
    }

    /// Use a different set name than [`DEFAULT_SET_NAME`].
    pub fn with_set_name(mut self, name: impl Into<String>) -> Self {
        self.set_name = name.into();
        self
    }
}

fn lock_conn(conn: &Arc<Mutex<Connection>>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))
}

fn join_err(e: tokio::task::JoinError) -> StoreError {
    StoreError::Unavailable(format!("spawn_blocking failed: {}", e))
}

#[async_trait]
impl GuildSetStore for SqliteStore {
    async fn add(&self, id: GuildId) -> Result<()> {
        let conn = self.conn.clone();
        let set_name = self.set_name.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            conn.execute(
                "INSERT OR IGNORE INTO guild_sets (set_name, guild_id, added_at)
                 VALUES (?1, ?2, ?3)",
                params![set_name, id.get() as i64, now_millis()],
            )?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn remove(&self, id: GuildId) -> Result<bool> {
        let conn = self.conn.clone();
        let set_name = self.set_name.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            let changed = conn.execute(
                "DELETE FROM guild_sets WHERE set_name = ?1 AND guild_id = ?2",
                params![set_name, id.get() as i64],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(join_err)?
    }

    async fn contains(&self, id: GuildId) -> Result<bool> {
        let conn = self.conn.clone();
        let set_name = self.set_name.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            let found: Option<i64> = conn
                .query_row(
                    "SELECT guild_id FROM guild_sets WHERE set_name = ?1 AND guild_id = ?2",
                    params![set_name, id.get() as i64],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
        .map_err(join_err)?
    }

    async fn list(&self) -> Result<Vec<GuildId>> {
        let conn = self.conn.clone();
        let set_name = self.set_name.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock_conn(&conn)?;
            let mut stmt = conn.prepare(
                "SELECT guild_id FROM guild_sets WHERE set_name = ?1 ORDER BY guild_id",
            )?;
            let ids = stmt
                .query_map(params![set_name], |row| row.get::<_, i64>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?
                .into_iter()
                .map(|raw| GuildId::new(raw as u64))
                .collect();
            Ok(ids)
        })
        .await
        .map_err(join_err)?
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
