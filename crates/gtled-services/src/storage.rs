//! Device-record storage.
//!
//! `FileConfigStore` keeps the record as a JSON file. A missing file is
//! first boot and yields defaults; a file that exists but cannot be read
//! or parsed is an error, so a corrupt record is never silently replaced.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use gtled_core::DeviceConfig;

use crate::service::ConfigStore;

pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<DeviceConfig> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %self.path.display(),
                    "device config not found, using defaults"
                );
                return Ok(DeviceConfig::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        let config: DeviceConfig = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "device config loaded");
        Ok(config)
    }

    fn save(&self, config: &DeviceConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(config)?;
        // Write-then-rename so a crash mid-write leaves the old record intact.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "device config saved");
        Ok(())
    }
}

/// In-memory store. Clones share the same record.
#[derive(Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<Mutex<DeviceConfig>>,
}

impl MemoryConfigStore {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(config)),
        }
    }

    /// Current record, for inspection.
    pub fn snapshot(&self) -> DeviceConfig {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<DeviceConfig> {
        self.inner
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow!("config store lock poisoned"))
    }

    fn save(&self, config: &DeviceConfig) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("config store lock poisoned"))?;
        *guard = config.clone();
        Ok(())
    }
}
