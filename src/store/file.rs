use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{FormSnapshotError, Result};
use crate::snapshot::snapshot_model::Snapshot;
use crate::store::SnapshotStore;
use crate::store::store_model::{SiteList, StoreData};

/// Store backed by a single JSON file, rewritten on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    data: StoreData,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; unparseable
    /// content is treated as empty rather than rejected.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<serde_json::Value>(&content) {
                Ok(value) => StoreData::from_value_lossy(&value),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "store file is not valid JSON, starting empty");
                    StoreData::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(FormSnapshotError::io(&path, e)),
        };

        debug!(path = %path.display(), sites = data.saved_forms.len(), "opened store");
        Ok(JsonFileStore { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        write_store_file(&self.path, &self.data)
    }
}

/// Write `data` as pretty JSON, creating parent directories as needed.
pub fn write_store_file(path: &Path, data: &StoreData) -> Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(|e| FormSnapshotError::JsonSerialize {
        context: "store data".into(),
        source: e,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FormSnapshotError::io(parent, e))?;
    }
    std::fs::write(path, json).map_err(|e| FormSnapshotError::io(path, e))
}

impl SnapshotStore for JsonFileStore {
    fn get(&self, hostname: &str) -> Vec<Snapshot> {
        self.data.get(hostname)
    }

    fn set(&mut self, hostname: &str, snapshots: Vec<Snapshot>) -> Result<()> {
        self.data.set(hostname, snapshots);
        self.persist()
    }

    fn hostnames(&self) -> Vec<String> {
        self.data.saved_forms.keys().cloned().collect()
    }

    fn sites(&self, list: SiteList) -> Vec<String> {
        self.data.sites(list).clone()
    }

    fn set_sites(&mut self, list: SiteList, sites: Vec<String>) -> Result<()> {
        *self.data.sites_mut(list) = sites;
        self.persist()
    }
}
