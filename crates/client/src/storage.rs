//! Persistent key-value state kept on the admin's machine.
//!
//! Holds the device id (forever) and the session token (while logged in).
//! Values are stored in clear text.

use crate::device::generate_device_id;
use crate::error::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEVICE_ID_KEY: &str = "cyt.admin.device_id";
pub const TOKEN_KEY: &str = "cyt.admin.token";

pub trait LocalStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// The persisted device id, generating and saving one if absent.
    fn device_id(&self) -> Result<String> {
        match self.get(DEVICE_ID_KEY)? {
            Some(id) if !id.is_empty() => Ok(id),
            _ => {
                let id = generate_device_id();
                self.set(DEVICE_ID_KEY, &id)?;
                tracing::debug!(device_id = %id, "Generated new device id");
                Ok(id)
            }
        }
    }

    fn token(&self) -> Result<Option<String>> {
        Ok(self.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    fn set_token(&self, token: &str) -> Result<()> {
        self.set(TOKEN_KEY, token)
    }

    fn clear_token(&self) -> Result<()> {
        self.remove(TOKEN_KEY)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

/// JSON file of string keys to string values.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `state.json` inside `dir`, or inside `~/.cyt-admin` when `dir` is `None`.
    pub fn in_dir(dir: Option<&Path>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::home_dir()
                .ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "Cannot determine home directory",
                    )
                })?
                .join(".cyt-admin"),
        };
        fs::create_dir_all(&dir)?;
        Ok(Self::new(dir.join("state.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = self.load()?;
        f(&mut values);
        self.save(&values)
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cyt-client-{}-{}", name, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_device_id_generated_once() {
        let store = MemoryStore::new();
        let first = store.device_id().unwrap();
        let second = store.device_id().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_token_roundtrip_and_clear() {
        let store = MemoryStore::new();
        assert_eq!(store.token().unwrap(), None);

        store.set_token("abc").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("abc"));

        store.clear_token().unwrap();
        assert_eq!(store.token().unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = temp_dir("persist");

        let device_id = {
            let store = FileStore::in_dir(Some(&dir)).unwrap();
            store.set_token("tok").unwrap();
            store.device_id().unwrap()
        };

        let reopened = FileStore::in_dir(Some(&dir)).unwrap();
        assert_eq!(reopened.device_id().unwrap(), device_id);
        assert_eq!(reopened.token().unwrap().as_deref(), Some("tok"));

        reopened.clear_token().unwrap();
        assert_eq!(reopened.token().unwrap(), None);
        assert_eq!(reopened.device_id().unwrap(), device_id);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_device_id_is_regenerated() {
        let dir = temp_dir("regen");
        let store = FileStore::in_dir(Some(&dir)).unwrap();
        let first = store.device_id().unwrap();

        fs::remove_file(store.path()).unwrap();
        let second = store.device_id().unwrap();
        assert_ne!(first, second);

        fs::remove_dir_all(dir).ok();
    }
}
