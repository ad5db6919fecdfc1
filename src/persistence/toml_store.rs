//! File-backed preference store
//!
//! Values live in memory behind a shared lock and are written to a TOML file on
//! [`TomlStore::flush`]. Clones share the same data, so the session can own one handle
//! while the autosave task owns another.

use super::{KeyValueStore, MemoryStore, PrefValue};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

/// Errors from reading or writing the preference file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access preference file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse preference file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Default)]
struct StoreInner {
    values: MemoryStore,
    dirty: bool,
}

/// Shared TOML-backed [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct TomlStore {
    path: PathBuf,
    inner: Arc<Mutex<StoreInner>>,
    /// Serializes file writes so an older snapshot never overwrites a newer one
    write_lock: Arc<Mutex<()>>,
}

impl TomlStore {
    /// Opens the store at `path`; a missing file yields an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let values = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            toml::from_str::<MemoryStore>(&content).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            warn!(
                "Preference file {} does not exist, starting with defaults",
                path.display()
            );
            MemoryStore::new()
        };

        info!(
            "Loaded {} preferences from {}",
            values.len(),
            path.display()
        );

        Ok(Self {
            path,
            inner: Arc::new(Mutex::new(StoreInner {
                values,
                dirty: false,
            })),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Writes pending changes to disk; a clean store is not rewritten.
    ///
    /// The values are only locked while they are serialized, so writers are not held up
    /// by the file system. A failed write leaves the store dirty for the next flush.
    pub fn flush(&self) -> Result<(), StoreError> {
        let _writing = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let content = {
            let mut guard = self.lock();
            if !guard.dirty {
                debug!("Preferences unchanged, skipping flush");
                return Ok(());
            }
            let content = toml::to_string_pretty(&guard.values)?;
            guard.dirty = false;
            content
        };

        if let Err(e) = self.write_file(&content) {
            self.lock().dirty = true;
            return Err(e);
        }

        info!("Preferences saved to {}", self.path.display());
        Ok(())
    }

    fn write_file(&self, content: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Flushes the store every `interval_secs` seconds until the task is aborted.
    /// The file is written on the blocking pool.
    pub fn start_autosave_task(store: TomlStore, interval_secs: u64) -> JoinHandle<()> {
        info!("Starting preference autosave every {} seconds", interval_secs);
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !store.is_dirty() {
                    continue;
                }
                let snapshot = store.clone();
                match tokio::task::spawn_blocking(move || snapshot.flush()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!("Autosave failed: {}", e),
                    Err(e) => error!("Autosave task panicked: {}", e),
                }
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for TomlStore {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.lock().values.get(key)
    }

    fn set(&mut self, key: &str, value: PrefValue) {
        let mut guard = self.lock();
        if guard.values.get(key).as_ref() != Some(&value) {
            guard.values.set(key, value);
            guard.dirty = true;
        }
    }

    fn remove(&mut self, key: &str) {
        let mut guard = self.lock();
        if guard.values.contains(key) {
            guard.values.remove(key);
            guard.dirty = true;
        }
    }
}
