//! Whole-document JSON persistence.

use eyre::{Result, WrapErr};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use repere_core::errors::{CoreError, CoreResult};
use repere_core::ports::StateStore;

/// A JSON document kept in memory and rewritten to disk after every change.
#[derive(Debug)]
pub struct JsonStore<T> {
    path: PathBuf,
    state: RwLock<T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Loads the document at `path`. A missing file starts from the default document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let content = fs::read_to_string(&path)
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            if content.trim().is_empty() {
                T::default()
            } else {
                serde_json::from_str(&content)
                    .wrap_err_with(|| format!("Failed to parse {}", path.display()))?
            }
        } else {
            info!(path = %path.display(), "No saved state, starting empty");
            T::default()
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, state: &T) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(state).wrap_err("Failed to serialize state")?;

        // Atomic replace.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content)
            .wrap_err_with(|| format!("Failed to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .wrap_err_with(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(path = %self.path.display(), "State flushed");
        Ok(())
    }
}

impl<T> StateStore<T> for JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default + Send + Sync,
{
    fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.read())
    }

    fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> CoreResult<R> {
        let mut state = self.state.write();
        let result = f(&mut state);
        self.flush(&state).map_err(CoreError::Storage)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_starts_from_default() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<BTreeMap<String, u32>> = JsonStore::open(dir.path().join("state.json")).unwrap();
        assert!(store.read(BTreeMap::is_empty));
        assert!(!store.path().exists());
    }

    #[test]
    fn update_writes_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store: JsonStore<BTreeMap<String, u32>> = JsonStore::open(&path).unwrap();

        store.update(|map| map.insert("a".to_string(), 1)).unwrap();
        store.update(|map| map.insert("b".to_string(), 2)).unwrap();

        let saved: BTreeMap<String, u32> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(JsonStore::<BTreeMap<String, u32>>::open(&path).is_err());
    }
}
