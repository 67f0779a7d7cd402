//! Persistent session cache.
//!
//! Mirrors the logged-in identity to disk: the three fields are present
//! together or absent together, and every change to the in-memory session
//! state is written through before the dispatch that caused it returns.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The identity persisted across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub token: String,
    pub username: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not determine config directory")]
    MissingConfigDir,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize session: {0}")]
    Serialize(String),
}

/// File-backed store for the session identity. Pure data access, no policy:
/// deciding *when* to persist or clear belongs to the store's write-through
/// effects.
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    /// Cache at the default location under the user config directory.
    pub fn at_default_location() -> Result<Self, SessionError> {
        let config_dir = dirs::config_dir().ok_or(SessionError::MissingConfigDir)?;
        Ok(Self {
            path: config_dir.join("folio").join("session.toml"),
        })
    }

    /// Cache at an explicit path. Used by tests and by deployments that
    /// relocate state.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Read the cached identity, if any.
    ///
    /// A missing file means no session. A corrupt file is treated the same
    /// way, with a warning, so a bad cache can never prevent startup.
    pub fn load(&self) -> Option<UserIdentity> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!("Failed to read session cache at {:?}: {}", self.path, err);
                return None;
            }
        };
        match toml::from_str(&contents) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(
                    "Failed to parse session cache at {:?}: {}. Ignoring it.",
                    self.path,
                    err
                );
                None
            }
        }
    }

    /// Persist the identity. All three fields are written in one atomic
    /// rename so a crash cannot leave a partial session behind.
    pub fn store(&self, user: &UserIdentity) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string_pretty(user).map_err(|e| SessionError::Serialize(e.to_string()))?;
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Erase the cached identity. Clearing an absent session is a no-op.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> UserIdentity {
        UserIdentity {
            token: "t".to_string(),
            username: "alice".to_string(),
            avatar_url: "a.png".to_string(),
        }
    }

    #[test]
    fn load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::at_path(dir.path().join("session.toml"));
        assert!(cache.load().is_none());
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::at_path(dir.path().join("session.toml"));
        cache.store(&test_user()).unwrap();
        assert_eq!(cache.load(), Some(test_user()));
    }

    #[test]
    fn store_writes_all_three_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::at_path(dir.path().join("session.toml"));
        cache.store(&test_user()).unwrap();

        let raw = std::fs::read_to_string(cache.path()).unwrap();
        assert!(raw.contains("token"));
        assert!(raw.contains("username"));
        assert!(raw.contains("avatar"));
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::at_path(dir.path().join("session.toml"));
        cache.store(&test_user()).unwrap();
        cache.clear().unwrap();
        assert!(!cache.path().exists());
        assert!(cache.load().is_none());
    }

    #[test]
    fn clear_absent_session_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::at_path(dir.path().join("session.toml"));
        cache.clear().unwrap();
    }

    #[test]
    fn corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "not valid toml {{{{").unwrap();
        let cache = SessionCache::at_path(path);
        assert!(cache.load().is_none());
    }
}
