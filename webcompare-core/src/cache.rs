use crate::data::Database;
use crate::draft::is_draft_key;
use crate::error::{CacheError, StorageResult};
use crate::session::SessionId;
use crate::storage::KeyValueStore;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::path::Path;
use tracing::{debug, info, warn};
use webcompare_client::ComparisonResult;

pub const DATA_KEY: &str = "websiteComparisonData";
pub const TIMESTAMP_KEY: &str = "websiteComparisonTimestamp";
pub const OWNER_KEY: &str = "websiteComparisonSessionId";

/// Hours that drafts of other sessions and removal markers are kept
pub const STALE_AFTER_HOURS: i64 = 24;

pub(crate) const ENTRY_KEYS: [&str; 3] = [DATA_KEY, TIMESTAMP_KEY, OWNER_KEY];

/// Outcome of reading the cache for a session
#[derive(Debug)]
pub enum CacheRead {
    Hit(ComparisonResult),
    /// No entry has been written, or it was cleared
    Absent,
    /// An entry exists but belongs to another session (or to none)
    ForeignSession { owner: Option<String> },
    /// The entry belongs to this session but the payload could not be read
    Corrupt(CacheError),
}

impl CacheRead {
    /// Collapses every non-hit outcome to `None`. Corrupt payloads are logged.
    pub fn into_result(self) -> Option<ComparisonResult> {
        match self {
            CacheRead::Hit(result) => Some(result),
            CacheRead::Corrupt(e) => {
                warn!("{}", e);
                None
            }
            CacheRead::Absent | CacheRead::ForeignSession { .. } => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, CacheRead::Hit(_))
    }
}

/// What is stored in the cache, regardless of who owns it
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    pub owner: Option<String>,
    pub written_at: Option<DateTime<Utc>>,
    pub payload_bytes: usize,
}

/// Most recent comparison result, scoped to the session that produced it.
///
/// Lives in durable storage so every process on the machine sees the same
/// entry. Only the session recorded as owner can read it back.
pub struct ResultCache {
    db: Database,
}

impl ResultCache {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self::new(Database::new(path)?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Stores `result` as the entry for `session`, replacing any previous entry
    pub fn write(&self, result: &ComparisonResult, session: &SessionId) -> StorageResult<()> {
        let payload = serde_json::to_string(result)?;
        let written_at = Utc::now().timestamp_millis().to_string();

        self.db.set_many(&[
            (DATA_KEY, payload.as_str()),
            (TIMESTAMP_KEY, written_at.as_str()),
            (OWNER_KEY, session.as_str()),
        ])?;

        info!(
            "Cached comparison of {} websites for session {}",
            result.websites.len().max(result.full.len()),
            session
        );
        Ok(())
    }

    pub fn read(&self, session: &SessionId) -> StorageResult<CacheRead> {
        read_entry(&self.db, session)
    }

    /// Removes the entry and every saved draft. Safe to call repeatedly.
    pub fn clear(&self) -> StorageResult<()> {
        let mut keys: Vec<String> = ENTRY_KEYS.iter().map(|key| key.to_string()).collect();
        keys.extend(self.db.keys()?.into_iter().filter(|key| is_draft_key(key)));

        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.db.remove_many(&keys)?;
        info!("Cleared comparison cache");
        Ok(())
    }

    /// Forgets drafts left by other sessions and old removal markers, once
    /// they have gone untouched for [`STALE_AFTER_HOURS`]
    pub fn prune(&self, session: &SessionId) -> StorageResult<usize> {
        self.prune_before(Utc::now() - TimeDelta::hours(STALE_AFTER_HOURS), session)
    }

    pub fn prune_before(&self, cutoff: DateTime<Utc>, session: &SessionId) -> StorageResult<usize> {
        let own_suffix = format!(".{}", session);
        let purged = self.db.purge_before(cutoff.timestamp_millis(), |key| {
            is_draft_key(key) && !key.ends_with(&own_suffix)
        })?;

        if purged > 0 {
            info!("Pruned {} stale storage rows", purged);
        }
        Ok(purged)
    }

    pub fn entry_info(&self) -> StorageResult<Option<EntryInfo>> {
        let values = self.db.get_many(&ENTRY_KEYS)?;
        let [data, timestamp, owner] = <[Option<String>; 3]>::try_from(values)
            .unwrap_or([None, None, None]);

        let Some(data) = data else {
            return Ok(None);
        };

        let written_at = match timestamp.as_deref().map(parse_timestamp).transpose() {
            Ok(written_at) => written_at,
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

        Ok(Some(EntryInfo {
            owner,
            written_at,
            payload_bytes: data.len(),
        }))
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CacheError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .ok_or_else(|| CacheError::MalformedTimestamp(raw.to_string()))
}

/// Reads the entry from any store, checking ownership before touching the payload
pub(crate) fn read_entry(
    store: &dyn KeyValueStore,
    session: &SessionId,
) -> StorageResult<CacheRead> {
    let mut values = store.get_many(&[OWNER_KEY, DATA_KEY])?.into_iter();
    let owner = values.next().flatten();
    let data = values.next().flatten();

    if owner.as_deref() != Some(session.as_str()) {
        if data.is_some() {
            debug!("Cache entry belongs to {:?}, not {}", owner, session);
            return Ok(CacheRead::ForeignSession { owner });
        }
        return Ok(CacheRead::Absent);
    }

    let Some(data) = data else {
        debug!("No cached comparison for session {}", session);
        return Ok(CacheRead::Absent);
    };

    match serde_json::from_str::<ComparisonResult>(&data) {
        Ok(result) => {
            debug!("Cache hit for session {}", session);
            Ok(CacheRead::Hit(result))
        }
        Err(e) => Ok(CacheRead::Corrupt(CacheError::MalformedPayload(
            e.to_string(),
        ))),
    }
}
