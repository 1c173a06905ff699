// admin-client/src/session/storage.rs
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Durable string key-value storage backing the session store
pub trait KeyValueStorage: Send + Sync {
    /// Current value, `None` when absent or unreadable
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Process-local storage, used by tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, one string value per key.
///
/// Every read goes back to the file, so a write made by another process is
/// visible on the next read. Writes go through a temporary file and a rename.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read session storage {}: {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Ignoring malformed session storage {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path)
    }
}

impl KeyValueStorage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.load();
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self.load();
        if entries.remove(key).is_none() && !self.path.exists() {
            return Ok(());
        }
        self.save(&entries)
    }
}

// The identity record holds a bearer credential.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
