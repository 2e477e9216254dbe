use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::snapshot::snapshot_model::Snapshot;

/// Which hostname list a site belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteList {
    /// Sites where capture and fill are enabled.
    Whitelisted,
    /// Sites where the submit prompt was declined for good.
    Blocked,
}

/// Everything the store persists. Field names match the on-disk layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreData {
    #[serde(default)]
    pub saved_forms: BTreeMap<String, Vec<Snapshot>>,
    #[serde(default)]
    pub whitelisted_sites: Vec<String>,
    #[serde(default)]
    pub blocked_sites: Vec<String>,
}

impl StoreData {
    /// Parse stored JSON, replacing anything malformed with an empty default.
    pub fn from_value_lossy(value: &Value) -> StoreData {
        let Some(root) = value.as_object() else {
            return StoreData::default();
        };

        let saved_forms = root
            .get("savedForms")
            .and_then(Value::as_object)
            .map(|sites| {
                sites
                    .iter()
                    .map(|(host, entries)| {
                        let snapshots: Vec<Snapshot> = entries
                            .as_array()
                            .map(|list| list.iter().filter_map(Snapshot::from_value_lossy).collect())
                            .unwrap_or_default();
                        (host.clone(), snapshots)
                    })
                    .filter(|(_, snapshots)| !snapshots.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        StoreData {
            saved_forms,
            whitelisted_sites: string_list(root.get("whitelistedSites")),
            blocked_sites: string_list(root.get("blockedSites")),
        }
    }

    pub fn get(&self, hostname: &str) -> Vec<Snapshot> {
        self.saved_forms.get(hostname).cloned().unwrap_or_default()
    }

    /// An empty list removes the site record.
    pub fn set(&mut self, hostname: &str, snapshots: Vec<Snapshot>) {
        if snapshots.is_empty() {
            self.saved_forms.remove(hostname);
        } else {
            self.saved_forms.insert(hostname.to_string(), snapshots);
        }
    }

    pub fn sites(&self, list: SiteList) -> &Vec<String> {
        match list {
            SiteList::Whitelisted => &self.whitelisted_sites,
            SiteList::Blocked => &self.blocked_sites,
        }
    }

    pub fn sites_mut(&mut self, list: SiteList) -> &mut Vec<String> {
        match list {
            SiteList::Whitelisted => &mut self.whitelisted_sites,
            SiteList::Blocked => &mut self.blocked_sites,
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
