use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ApiError;

// 1. TokenStore Contract
/// TokenStore
///
/// Durable, client-local key-value slot for the bearer token. It survives
/// process restarts and is read once at startup by the session restore.
/// Calls are synchronous so that logout can clear the token without
/// awaiting anything.
pub trait TokenStore: Send + Sync {
    /// Returns the persisted token, if any.
    fn load(&self) -> Result<Option<String>, ApiError>;

    /// Replaces the persisted token.
    fn save(&self, token: &str) -> Result<(), ApiError>;

    /// Removes the persisted token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), ApiError>;
}

#[derive(Serialize, Deserialize)]
struct PersistedSession {
    token: String,
}

// 2. The Real Implementation (JSON file on disk)
/// FileTokenStore
///
/// Keeps the token in a small JSON document. Writes go to a sibling temp
/// file first and are renamed into place, so a crash mid-write never leaves
/// a truncated token behind.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(persisted) if !persisted.token.is_empty() => Ok(Some(persisted.token)),
            Ok(_) => {
                self.clear()?;
                Ok(None)
            }
            Err(e) => {
                // An unreadable file is treated like no token at all, and
                // removed so the next start does not trip over it again.
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt token file");
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_vec(&PersistedSession {
            token: token.to_string(),
        })
        .map_err(|e| ApiError::Storage(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// 3. The Mock Implementation (For Tests)
/// MemoryTokenStore
///
/// In-process store used by tests and by `--ephemeral` CLI runs.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
    /// When true, every operation returns a simulated storage failure.
    pub should_fail: bool,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
            should_fail: false,
        }
    }

    pub fn new_failing() -> Self {
        Self {
            token: Mutex::new(None),
            should_fail: true,
        }
    }

    /// Peeks at the slot without going through the trait.
    pub fn current(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.should_fail {
            return Err(ApiError::Storage("Mock Storage Error: Simulation requested".into()));
        }
        Ok(())
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        self.check()?;
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        self.check()?;
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        self.check()?;
        self.token.lock().take();
        Ok(())
    }
}

/// TokenStoreState
///
/// Shared handle to whichever store the application was built with.
pub type TokenStoreState = Arc<dyn TokenStore>;
