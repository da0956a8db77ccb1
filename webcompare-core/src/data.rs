use crate::error::StorageResult;
use crate::storage::KeyValueStore;
use rusqlite::{Connection, OptionalExtension, Result, params};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Durable storage shared by every process on the machine.
///
/// Entries live in a single SQLite file. Each connection carries a
/// `context_id` so a process can tell its own writes apart from writes made
/// by other processes when it looks for changes.
pub struct Database {
    conn: Connection,
    path: PathBuf,
    context_id: String,
}

/// A key touched by a write since some earlier revision
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub revision: i64,
    /// `None` when the key was removed
    pub value: Option<String>,
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Database {
    /// Removes the database file along with any WAL companions
    pub fn drop(path: &Path) -> io::Result<()> {
        fs::remove_file(path)?;
        for suffix in ["-wal", "-shm"] {
            let mut companion = path.as_os_str().to_os_string();
            companion.push(suffix);
            match fs::remove_file(&companion) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        Self::open_as(path, &uuid::Uuid::new_v4().to_string())
    }

    /// Opens the store under an explicit writer identity
    pub fn open_as(path: &Path, context_id: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let db = Database {
            conn,
            path: path.to_path_buf(),
            context_id: context_id.to_string(),
        };
        db.init_schema()?;
        debug!("Opened storage {} as {}", path.display(), db.context_id);
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- Removed keys stay behind with a NULL value so readers can see the change
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT,
                revision INTEGER NOT NULL,
                writer TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_local_storage_revision ON local_storage(revision);

            CREATE TABLE IF NOT EXISTS storage_revision (
                id INTEGER PRIMARY KEY CHECK(id = 1),
                revision INTEGER NOT NULL
            );

            INSERT OR IGNORE INTO storage_revision (id, revision) VALUES (1, 0);
            ",
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Revision of the most recent committed write
    pub fn revision(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT revision FROM storage_revision WHERE id = 1", [], |row| {
                row.get(0)
            })
    }

    /// Keys written by other connections after `after`, up to and including `head`
    pub fn changes_between(&self, after: i64, head: i64) -> Result<Vec<StorageChange>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, revision, value FROM local_storage
             WHERE revision > ?1 AND revision <= ?2 AND writer != ?3
             ORDER BY revision",
        )?;

        let rows = stmt.query_map(params![after, head, self.context_id], |row| {
            Ok(StorageChange {
                key: row.get(0)?,
                revision: row.get(1)?,
                value: row.get(2)?,
            })
        })?;

        rows.collect()
    }

    fn write(&self, entries: &[(&str, Option<&str>)]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE storage_revision SET revision = revision + 1 WHERE id = 1",
            [],
        )?;
        let revision: i64 =
            tx.query_row("SELECT revision FROM storage_revision WHERE id = 1", [], |row| {
                row.get(0)
            })?;

        let now = current_timestamp();
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO local_storage (key, value, revision, writer, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    revision = excluded.revision,
                    writer = excluded.writer,
                    updated_at = excluded.updated_at",
                params![key, value, revision, self.context_id, now],
            )?;
        }

        tx.commit()?;
        debug!("Committed {} storage entries at revision {}", entries.len(), revision);
        Ok(())
    }

    /// Deletes rows last written before `cutoff` (epoch millis) outright.
    /// Removal markers always go; live rows only when `stale` accepts the key.
    pub fn purge_before(&self, cutoff: i64, stale: impl Fn(&str) -> bool) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let doomed: Vec<String> = {
            let mut stmt = tx.prepare(
                "SELECT key, value IS NULL FROM local_storage WHERE updated_at < ?1",
            )?;
            let rows = stmt.query_map(params![cutoff], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
            })?;
            rows.filter_map(|row| match row {
                Ok((key, removed)) if removed || stale(&key) => Some(Ok(key)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<_>>()?
        };

        for key in &doomed {
            tx.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        }
        tx.commit()?;

        debug!("Purged {} storage rows older than {}", doomed.len(), cutoff);
        Ok(doomed.len())
    }

    fn lookup(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM local_storage WHERE key = ?1",
            params![key],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()
        .map(Option::flatten)
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(Self::lookup(&self.conn, key)?)
    }

    fn get_many(&self, keys: &[&str]) -> StorageResult<Vec<Option<String>>> {
        let tx = self.conn.unchecked_transaction()?;
        let values = keys
            .iter()
            .map(|key| Self::lookup(&tx, key))
            .collect::<Result<Vec<_>>>()?;
        tx.finish()?;
        Ok(values)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let entries: Vec<(&str, Option<&str>)> =
            entries.iter().map(|(key, value)| (*key, Some(*value))).collect();
        Ok(self.write(&entries)?)
    }

    fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        let present = self.get_many(keys)?;
        let entries: Vec<(&str, Option<&str>)> = keys
            .iter()
            .zip(present)
            .filter(|(_, value)| value.is_some())
            .map(|(key, _)| (*key, None))
            .collect();

        if entries.is_empty() {
            return Ok(());
        }
        Ok(self.write(&entries)?)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM local_storage WHERE value IS NOT NULL ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>>>()?;
        Ok(keys)
    }
}
