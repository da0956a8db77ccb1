use crate::cache::{CacheRead, ENTRY_KEYS, ResultCache, read_entry};
use crate::data::Database;
use crate::error::StorageResult;
use crate::session::SessionId;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};
use webcompare_client::ComparisonResult;

/// Tracks cache writes made by other connections to the same database.
///
/// Opens its own connection under the subscriber's writer identity, so writes
/// made through the subscribing handle never count as external.
pub struct ExternalWrites {
    db: Database,
    session: SessionId,
    last_revision: i64,
}

impl ExternalWrites {
    pub fn new(path: &Path, context_id: &str, session: SessionId) -> StorageResult<Self> {
        let db = Database::open_as(path, context_id)?;
        let last_revision = db.revision()?;
        Ok(Self {
            db,
            session,
            last_revision,
        })
    }

    /// Returns the re-read entry if another connection touched it since the
    /// last call, `None` otherwise.
    pub fn refresh(&mut self) -> StorageResult<Option<CacheRead>> {
        let head = self.db.revision()?;
        if head == self.last_revision {
            return Ok(None);
        }

        let changes = self.db.changes_between(self.last_revision, head)?;
        self.last_revision = head;

        if !changes
            .iter()
            .any(|change| ENTRY_KEYS.contains(&change.key.as_str()))
        {
            return Ok(None);
        }

        info!(
            "Cache entry changed externally (revision {}, {} keys)",
            head,
            changes.len()
        );
        Ok(Some(read_entry(&self.db, &self.session)?))
    }
}

/// Keeps an external-write callback registered. Dropping it unregisters.
pub struct Subscription {
    _watcher: RecommendedWatcher,
    _worker: JoinHandle<()>,
}

impl ResultCache {
    pub fn external_writes(&self, session: &SessionId) -> StorageResult<ExternalWrites> {
        ExternalWrites::new(
            self.database().path(),
            self.database().context_id(),
            session.clone(),
        )
    }

    /// Calls `callback` with the session-filtered entry whenever another
    /// connection writes or clears it.
    pub fn on_external_write<F>(
        &self,
        session: &SessionId,
        mut callback: F,
    ) -> StorageResult<Subscription>
    where
        F: FnMut(Option<ComparisonResult>) + Send + 'static,
    {
        let mut tracker = self.external_writes(session)?;
        let db_path = self.database().path().to_path_buf();
        let watch_dir = match db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let db_name = db_path.file_name().map(OsString::from).unwrap_or_default();

        let (tx_fs, rx_fs) = channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    let _ = tx_fs.send(event);
                }
                Err(e) => warn!("Cache watcher error: {}", e),
            }
        })?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
        debug!("Watching {} for cache writes", watch_dir.display());

        let worker = std::thread::Builder::new()
            .name("cache-watcher".to_string())
            .spawn(move || {
                while let Ok(event) = rx_fs.recv() {
                    if !touches_database(&event, &db_name) {
                        continue;
                    }
                    match tracker.refresh() {
                        Ok(Some(read)) => callback(read.into_result()),
                        Ok(None) => {}
                        Err(e) => error!("Failed to re-read cache after change: {}", e),
                    }
                }
                debug!("Cache watcher stopped");
            })?;

        Ok(Subscription {
            _watcher: watcher,
            _worker: worker,
        })
    }
}

/// SQLite writes land in the database file or its `-wal`/`-shm` companions
fn touches_database(event: &Event, db_name: &OsString) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    let db_name = db_name.to_string_lossy();
    event.paths.iter().any(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().starts_with(db_name.as_ref()))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_touches_database_matches_companion_files() {
        let name = OsString::from("webcompare.db");
        let modify = || EventKind::Modify(ModifyKind::Any);

        assert!(touches_database(&event(modify(), "/d/webcompare.db"), &name));
        assert!(touches_database(&event(modify(), "/d/webcompare.db-wal"), &name));
        assert!(!touches_database(&event(modify(), "/d/session.json"), &name));
        assert!(!touches_database(
            &event(EventKind::Access(AccessKind::Any), "/d/webcompare.db"),
            &name
        ));
    }
}
