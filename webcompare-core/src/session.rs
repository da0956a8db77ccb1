use crate::error::StorageResult;
use crate::storage::KeyValueStore;
use std::fmt;
use tracing::info;

/// Session storage key holding the current session id
pub const SESSION_KEY: &str = "sessionId";

/// Identifier of one browsing session. Opaque; compared for equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        SessionId(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        SessionId(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the session stored in `store`, minting and storing a new one if
/// there is none yet. Later calls against the same store return the same id.
pub fn current_session(store: &dyn KeyValueStore) -> StorageResult<SessionId> {
    if let Some(existing) = peek_session(store)? {
        return Ok(existing);
    }

    let session = SessionId::generate();
    store.set(SESSION_KEY, session.as_str())?;
    info!("Started new session {}", session);
    Ok(session)
}

/// The stored session, without creating one
pub fn peek_session(store: &dyn KeyValueStore) -> StorageResult<Option<SessionId>> {
    Ok(store
        .get(SESSION_KEY)?
        .filter(|id| !id.trim().is_empty())
        .map(SessionId))
}

/// Forgets the current session; the next `current_session` call mints a new one
pub fn end_session(store: &dyn KeyValueStore) -> StorageResult<()> {
    store.remove(SESSION_KEY)
}
