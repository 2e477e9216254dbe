use crate::error::Result;
use crate::snapshot::snapshot_model::Snapshot;
use crate::store::SnapshotStore;
use crate::store::store_model::{SiteList, StoreData};

/// Volatile store for tests and embedding hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: StoreData,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: StoreData) -> Self {
        MemoryStore { data }
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, hostname: &str) -> Vec<Snapshot> {
        self.data.get(hostname)
    }

    fn set(&mut self, hostname: &str, snapshots: Vec<Snapshot>) -> Result<()> {
        self.data.set(hostname, snapshots);
        Ok(())
    }

    fn hostnames(&self) -> Vec<String> {
        self.data.saved_forms.keys().cloned().collect()
    }

    fn sites(&self, list: SiteList) -> Vec<String> {
        self.data.sites(list).clone()
    }

    fn set_sites(&mut self, list: SiteList, sites: Vec<String>) -> Result<()> {
        *self.data.sites_mut(list) = sites;
        Ok(())
    }
}
