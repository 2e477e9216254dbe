use std::path::Path;

use tracing::info;

use crate::error::{FormSnapshotError, Result};
use crate::snapshot::snapshot_model::{Snapshot, sort_newest_first};
use crate::store::SnapshotStore;
use crate::store::file::write_store_file;
use crate::store::store_model::{SiteList, StoreData};

/// How a caller picks a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotRef {
    /// Newest snapshot with this name.
    Name(String),
    Timestamp(u64),
}

impl std::fmt::Display for SnapshotRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotRef::Name(name) => write!(f, "{}", name),
            SnapshotRef::Timestamp(ts) => write!(f, "@{}", ts),
        }
    }
}

/// Append `snapshot` to the site's record, creating the record if needed.
pub fn save_snapshot(store: &mut dyn SnapshotStore, hostname: &str, snapshot: Snapshot) -> Result<()> {
    let mut snapshots = store.get(hostname);
    info!(
        hostname,
        name = %snapshot.name,
        fields = snapshot.data.len(),
        "saving snapshot"
    );
    snapshots.push(snapshot);
    store.set(hostname, snapshots)
}

/// The site's snapshots, newest first.
pub fn list_snapshots(store: &dyn SnapshotStore, hostname: &str) -> Vec<Snapshot> {
    let mut snapshots = store.get(hostname);
    sort_newest_first(&mut snapshots);
    snapshots
}

pub fn find_snapshot(store: &dyn SnapshotStore, hostname: &str, which: &SnapshotRef) -> Result<Snapshot> {
    list_snapshots(store, hostname)
        .into_iter()
        .find(|s| match which {
            SnapshotRef::Name(name) => &s.name == name,
            SnapshotRef::Timestamp(ts) => s.timestamp == *ts,
        })
        .ok_or_else(|| FormSnapshotError::UnknownSnapshot {
            hostname: hostname.to_string(),
            snapshot: which.to_string(),
        })
}

/// Remove every snapshot with `timestamp`. Returns whether anything was removed.
pub fn delete_snapshot(store: &mut dyn SnapshotStore, hostname: &str, timestamp: u64) -> Result<bool> {
    let snapshots = store.get(hostname);
    let before = snapshots.len();
    let kept: Vec<Snapshot> = snapshots
        .into_iter()
        .filter(|s| s.timestamp != timestamp)
        .collect();

    if kept.len() == before {
        return Ok(false);
    }
    info!(hostname, timestamp, "deleted snapshot");
    store.set(hostname, kept)?;
    Ok(true)
}

/// Drop every site's snapshots, leaving the site lists alone.
/// Returns how many snapshots were removed.
pub fn clear_snapshots(store: &mut dyn SnapshotStore) -> Result<usize> {
    let mut removed = 0;
    for hostname in store.hostnames() {
        removed += store.get(&hostname).len();
        store.set(&hostname, Vec::new())?;
    }
    info!(removed, "cleared all snapshots");
    Ok(removed)
}

// =========================================================================
// Site lists
// =========================================================================

/// Add `hostname` to `list`. Returns false when it was already there.
pub fn add_site(store: &mut dyn SnapshotStore, list: SiteList, hostname: &str) -> Result<bool> {
    let mut sites = store.sites(list);
    if sites.iter().any(|s| s == hostname) {
        return Ok(false);
    }
    sites.push(hostname.to_string());
    store.set_sites(list, sites)?;
    Ok(true)
}

/// Remove `hostname` from `list`. Returns whether it was present.
pub fn remove_site(store: &mut dyn SnapshotStore, list: SiteList, hostname: &str) -> Result<bool> {
    let sites = store.sites(list);
    let before = sites.len();
    let kept: Vec<String> = sites.into_iter().filter(|s| s != hostname).collect();
    if kept.len() == before {
        return Ok(false);
    }
    store.set_sites(list, kept)?;
    Ok(true)
}

pub fn site_in(store: &dyn SnapshotStore, list: SiteList, hostname: &str) -> bool {
    store.sites(list).iter().any(|s| s == hostname)
}

// =========================================================================
// Export
// =========================================================================

/// Everything the store holds, in its on-disk shape.
pub fn collect(store: &dyn SnapshotStore) -> StoreData {
    StoreData {
        saved_forms: store
            .hostnames()
            .into_iter()
            .map(|host| {
                let snapshots = store.get(&host);
                (host, snapshots)
            })
            .collect(),
        whitelisted_sites: store.sites(SiteList::Whitelisted),
        blocked_sites: store.sites(SiteList::Blocked),
    }
}

pub fn export_store(store: &dyn SnapshotStore, path: &Path) -> Result<()> {
    let data = collect(store);
    info!(path = %path.display(), sites = data.saved_forms.len(), "exporting store");
    write_store_file(path, &data)
}
