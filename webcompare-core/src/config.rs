use crate::storage::SessionFile;
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;
use webcompare_client::DEFAULT_ENDPOINT;

pub const DEFAULT_ASSET_BASE: &str = "http://localhost:5000";
pub const DEFAULT_DATA_DIR: &str = "~/.config/webcompare/";
pub const DATABASE_FILE: &str = "webcompare.db";
pub const SESSION_FILE: &str = "session.json";

pub const ENV_API_URL: &str = "WEBCOMPARE_API_URL";
pub const ENV_ASSET_URL: &str = "WEBCOMPARE_ASSET_URL";
pub const ENV_HOME: &str = "WEBCOMPARE_HOME";
pub const ENV_SESSION_FILE: &str = "WEBCOMPARE_SESSION_FILE";
pub const ENV_DIAGNOSTICS: &str = "WEBCOMPARE_DIAGNOSTICS";

/// Runtime settings: built-in defaults overridden by the environment.
/// Command line flags are applied on top by the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub asset_base: String,
    pub data_dir: PathBuf,
    pub session_file: PathBuf,
    pub diagnostics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = value(ENV_API_URL)
            .and_then(|raw| parse_url(ENV_API_URL, &raw))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let asset_base = value(ENV_ASSET_URL)
            .and_then(|raw| parse_url(ENV_ASSET_URL, &raw))
            .unwrap_or_else(|| DEFAULT_ASSET_BASE.to_string());

        let data_dir =
            expand_path(&value(ENV_HOME).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));
        let session_file = value(ENV_SESSION_FILE)
            .map(|raw| expand_path(&raw))
            .unwrap_or_else(|| data_dir.join(SESSION_FILE));

        let diagnostics = value(ENV_DIAGNOSTICS)
            .and_then(|raw| {
                let parsed = parse_bool(&raw);
                if parsed.is_none() {
                    warn!(
                        "Ignoring {}={:?}: expected true or false",
                        ENV_DIAGNOSTICS, raw
                    );
                }
                parsed
            })
            .unwrap_or(cfg!(debug_assertions));

        Self {
            api_url,
            asset_base,
            data_dir,
            session_file,
            diagnostics,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn session_store(&self) -> SessionFile {
        SessionFile::new(&self.session_file)
    }

    /// Moves the data directory; the session file follows when it was derived from it
    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        if self.session_file == self.data_dir.join(SESSION_FILE) {
            self.session_file = dir.join(SESSION_FILE);
        }
        self.data_dir = dir.to_path_buf();
        self
    }
}

pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Accepts only absolute URLs; returns the trimmed input unchanged
pub fn parse_url(key: &str, raw: &str) -> Option<String> {
    match Url::parse(raw.trim()) {
        Ok(_) => Some(raw.trim().to_string()),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
