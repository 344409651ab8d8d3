//! Storage module - persistent key/value state for the client
//!
//! Holds the session tokens and the user's settings. Last write wins,
//! there is no versioning.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::Result;
use crate::error::Error;

const STORAGE_FILE: &str = "storage.json";

/// Keys used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    DarkTheme,
    SelectedLanguage,
    AccessToken,
    RefreshToken,
    TokenSavedAt,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::DarkTheme => "settings.darktheme",
            StorageKey::SelectedLanguage => "settings.selectedlang",
            StorageKey::AccessToken => "auth.token.access",
            StorageKey::RefreshToken => "auth.token.refresh",
            StorageKey::TokenSavedAt => "auth.token.saved_at",
        }
    }
}

/// Key/value store trait - interface for persisted client state
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    fn save(&self, key: StorageKey, value: &str) -> Result<()>;

    /// Value stored under `key`, if any
    fn retrieve(&self, key: StorageKey) -> Option<String>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: StorageKey) -> Result<()>;
}

/// File-backed store, a flat JSON object on disk
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, reading existing entries if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!("Opened storage at {:?} ({} entries)", path, entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Storage file belonging to a config file: a sibling `storage.json`,
    /// or the one in the default config directory
    pub fn path_for_config(config_path: Option<&Path>) -> PathBuf {
        match config_path.and_then(Path::parent) {
            Some(dir) => dir.join(STORAGE_FILE),
            None => crate::config::config_dir().join(STORAGE_FILE),
        }
    }

    /// Write the whole map to a private temp file, then rename it over the
    /// store so readers never see a partial file
    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(entries)?;
        let tmp = self.tmp_path();
        if let Err(e) = std::fs::remove_file(&tmp) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e.into());
            }
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        // Tokens live here, keep it private to the user
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Storage("storage lock poisoned".to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn save(&self, key: StorageKey, value: &str) -> Result<()> {
        let mut entries = self.lock()?;
        entries.insert(key.as_str().to_string(), value.to_string());
        self.flush(&entries)
    }

    fn retrieve(&self, key: StorageKey) -> Option<String> {
        self.lock().ok()?.get(key.as_str()).cloned()
    }

    fn delete(&self, key: StorageKey) -> Result<()> {
        let mut entries = self.lock()?;
        if entries.remove(key.as_str()).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// In-memory store for testing
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryStore {
    fn save(&self, key: StorageKey, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?
            .insert(key.as_str().to_string(), value.to_string());
        Ok(())
    }

    fn retrieve(&self, key: StorageKey) -> Option<String> {
        self.entries.lock().ok()?.get(key.as_str()).cloned()
    }

    fn delete(&self, key: StorageKey) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| Error::Storage("storage lock poisoned".to_string()))?
            .remove(key.as_str());
        Ok(())
    }
}
