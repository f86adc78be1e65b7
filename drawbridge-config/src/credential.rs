//! Credential persistence port.
//!
//! The chat panel never touches the filesystem directly; it is handed a
//! [`CredentialStore`] at construction. The file-backed implementation keeps
//! the API key as a single plain-text entry under the app config dir, read
//! once at startup and rewritten on every non-empty change.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::Config;
use crate::error::ConfigError;

/// Durable storage for the single chat API credential.
///
/// Contract notes:
/// - `load` returns `None` when nothing usable is stored (missing entry or
///   blank content).
/// - `save` is only ever called with non-empty values, and implementations
///   must also refuse blank values themselves: blanking the input field must
///   not destroy a previously stored key. Deleting a credential is a
///   separate, explicit operation that no caller performs today.
pub trait CredentialStore {
    /// Read the stored credential, if any.
    fn load(&self) -> Option<String>;

    /// Persist a non-empty credential value, replacing any previous one.
    fn save(&self, value: &str) -> Result<(), ConfigError>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<T> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, value: &str) -> Result<(), ConfigError> {
        (**self).save(value)
    }
}

/// File-backed credential store: one plain-text file, owner-only
/// permissions on Unix.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store location under the app config dir.
    pub fn default_path() -> PathBuf {
        Config::config_dir().join("api_key")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open (or create/truncate) the credential file with owner-only
    /// permissions (0o600) on Unix, or default permissions elsewhere.
    fn open_restricted_write(path: &Path) -> Result<std::fs::File, std::io::Error> {
        let mut opts = std::fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        opts.open(path)
    }
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read credential file {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn save(&self, value: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            // Never persist a blank-out; see the trait contract.
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = Self::open_restricted_write(&self.path)?;
        file.write_all(value.as_bytes())?;
        Ok(())
    }
}

/// In-memory credential store for tests. Records every save so tests can
/// assert exactly which values crossed the port.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    value: Option<String>,
    saves: Vec<String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().value = Some(value.into());
        store
    }

    /// Every value that has been written through `save`, in order.
    pub fn saved_values(&self) -> Vec<String> {
        self.inner.lock().unwrap().saves.clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.inner.lock().unwrap().value.clone()
    }

    fn save(&self, value: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.lock().unwrap();
        inner.value = Some(value.to_string());
        inner.saves.push(value.to_string());
        Ok(())
    }
}
