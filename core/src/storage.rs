//! Persisted bearer token storage.
//!
//! Only the session writes through a [`TokenStore`]; the client reads it via
//! [`StoredToken`](crate::auth::StoredToken). [`FileTokenStore`] keeps the
//! token in a single file named after [`TOKEN_KEY`] so it survives restarts.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Fixed storage key; also the file name used by [`FileTokenStore`].
pub const TOKEN_KEY: &str = "access_token";

const DATA_DIR_NAME: &str = "admin-client";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token storage I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no data directory available for token storage")]
    NoDataDir,
}

pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, StorageError>;
    fn set(&self, token: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Process-local store for tests and embedding.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        f.debug_struct("MemoryTokenStore").field("present", &present).finish()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.token.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Token persisted to `<dir>/access_token`, owner-only on unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(TOKEN_KEY),
        }
    }

    /// `<data dir>/admin-client/access_token`.
    pub fn default_location() -> Result<Self, StorageError> {
        dirs::data_dir()
            .map(|dir| Self::new(dir.join(DATA_DIR_NAME)))
            .ok_or(StorageError::NoDataDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }
        fs::write(&self.path, token).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_cycle() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get().unwrap(), None);
        store.set("abc").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("abc"));
        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn file_store_uses_fixed_key() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = FileTokenStore::new(tmp.path());
        assert!(store.path().ends_with(TOKEN_KEY));
    }

    #[test]
    fn file_store_set_get_clear_cycle() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = FileTokenStore::new(tmp.path().join("nested"));

        assert_eq!(store.get().unwrap(), None);
        store.set("jwt-abc123").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("jwt-abc123"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(store.path()).expect("metadata").permissions().mode() & 0o777;
            assert_eq!(mode, 0o600, "token file should be 0600");
        }

        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn file_store_survives_reopen() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        FileTokenStore::new(tmp.path()).set("persisted").unwrap();
        let reopened = FileTokenStore::new(tmp.path());
        assert_eq!(reopened.get().unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn file_store_ignores_whitespace_content() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = FileTokenStore::new(tmp.path());
        fs::write(store.path(), "   \n  ").expect("write");
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn clearing_missing_file_is_ok() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = FileTokenStore::new(tmp.path());
        store.clear().unwrap();
        store.clear().unwrap();
    }
}
