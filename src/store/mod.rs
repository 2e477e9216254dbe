//! Snapshot persistence keyed by site hostname.

pub mod file;
pub mod memory;
pub mod site_record;
pub mod store_model;

use url::Url;

use crate::error::{FormSnapshotError, Result};
use crate::snapshot::snapshot_model::Snapshot;
use crate::store::store_model::SiteList;

/// Key-value persistence: `hostname -> [Snapshot]` plus the site lists.
pub trait SnapshotStore {
    /// Snapshots for `hostname` in stored order; empty when none.
    fn get(&self, hostname: &str) -> Vec<Snapshot>;

    /// Replace the snapshots for `hostname`. An empty list removes the site.
    fn set(&mut self, hostname: &str, snapshots: Vec<Snapshot>) -> Result<()>;

    fn hostnames(&self) -> Vec<String>;

    fn sites(&self, list: SiteList) -> Vec<String>;

    fn set_sites(&mut self, list: SiteList, sites: Vec<String>) -> Result<()>;
}

/// Accept either a bare hostname or a URL and return the lowercase host,
/// without any port.
pub fn normalize_hostname(input: &str) -> Result<String> {
    let trimmed = input.trim();

    let url = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("http://{}", trimmed))
    };
    let host = url.ok().and_then(|u| u.host_str().map(str::to_string));

    match host {
        Some(h) if !h.is_empty() && !h.contains(char::is_whitespace) => Ok(h.to_ascii_lowercase()),
        _ => Err(FormSnapshotError::InvalidHostname(input.to_string())),
    }
}
