use form_snapshot::error::FormSnapshotError;
use form_snapshot::snapshot::snapshot_model::{FieldData, FieldValue, SelectorEntry, Snapshot};
use form_snapshot::store::SnapshotStore;
use form_snapshot::store::file::JsonFileStore;
use form_snapshot::store::memory::MemoryStore;
use form_snapshot::store::normalize_hostname;
use form_snapshot::store::site_record::{
    SnapshotRef, add_site, clear_snapshots, collect, delete_snapshot, export_store, find_snapshot, list_snapshots,
    remove_site, save_snapshot, site_in,
};
use form_snapshot::store::store_model::{SiteList, StoreData};
use serde_json::json;

fn snapshot(name: &str, timestamp: u64) -> Snapshot {
    let mut data = FieldData::new();
    data.insert("user".to_string(), FieldValue::Text(name.to_lowercase()));
    data.insert("news".to_string(), FieldValue::Bool(true));
    Snapshot::new(
        name,
        timestamp,
        data,
        vec![SelectorEntry {
            key: "user".into(),
            selector: "#user".into(),
        }],
    )
}

// ============================================================================
// Site records
// ============================================================================

#[test]
fn snapshots_append_and_list_newest_first() {
    let mut store = MemoryStore::new();
    save_snapshot(&mut store, "example.com", snapshot("Old", 100)).unwrap();
    save_snapshot(&mut store, "example.com", snapshot("New", 300)).unwrap();
    save_snapshot(&mut store, "example.com", snapshot("Mid", 200)).unwrap();

    let stored: Vec<u64> = store.get("example.com").iter().map(|s| s.timestamp).collect();
    assert_eq!(stored, vec![100, 300, 200], "storage keeps insertion order");

    let listed: Vec<String> = list_snapshots(&store, "example.com")
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(listed, vec!["New", "Mid", "Old"]);
}

#[test]
fn unknown_site_has_no_snapshots() {
    let store = MemoryStore::new();
    assert!(store.get("nowhere.test").is_empty());
    assert!(list_snapshots(&store, "nowhere.test").is_empty());
}

#[test]
fn find_by_name_prefers_the_newest() {
    let mut store = MemoryStore::new();
    save_snapshot(&mut store, "a.test", snapshot("Profile", 10)).unwrap();
    save_snapshot(&mut store, "a.test", snapshot("Profile", 20)).unwrap();

    let found = find_snapshot(&store, "a.test", &SnapshotRef::Name("Profile".into())).unwrap();
    assert_eq!(found.timestamp, 20);

    let by_ts = find_snapshot(&store, "a.test", &SnapshotRef::Timestamp(10)).unwrap();
    assert_eq!(by_ts.timestamp, 10);
}

#[test]
fn find_reports_unknown_snapshot() {
    let store = MemoryStore::new();
    let err = find_snapshot(&store, "a.test", &SnapshotRef::Timestamp(5)).unwrap_err();
    match err {
        FormSnapshotError::UnknownSnapshot { hostname, snapshot } => {
            assert_eq!(hostname, "a.test");
            assert_eq!(snapshot, "@5");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn deleting_the_last_snapshot_removes_the_site() {
    let mut store = MemoryStore::new();
    save_snapshot(&mut store, "a.test", snapshot("One", 1)).unwrap();
    save_snapshot(&mut store, "a.test", snapshot("Two", 2)).unwrap();

    assert!(delete_snapshot(&mut store, "a.test", 1).unwrap());
    assert!(!delete_snapshot(&mut store, "a.test", 1).unwrap());
    assert_eq!(store.hostnames(), vec!["a.test"]);

    assert!(delete_snapshot(&mut store, "a.test", 2).unwrap());
    assert!(store.hostnames().is_empty());
}

#[test]
fn clearing_removes_every_site_record_but_keeps_site_lists() {
    let mut store = MemoryStore::with_data(StoreData {
        saved_forms: [
            ("a.test".to_string(), vec![snapshot("One", 1), snapshot("Two", 2)]),
            ("b.test".to_string(), vec![snapshot("Three", 3)]),
        ]
        .into(),
        whitelisted_sites: vec!["a.test".into()],
        blocked_sites: vec!["spam.test".into()],
    });

    assert_eq!(clear_snapshots(&mut store).unwrap(), 3);
    assert!(store.hostnames().is_empty());
    assert!(store.data().saved_forms.is_empty());
    assert_eq!(store.sites(SiteList::Whitelisted), vec!["a.test"]);
    assert_eq!(store.sites(SiteList::Blocked), vec!["spam.test"]);

    assert_eq!(clear_snapshots(&mut store).unwrap(), 0);
}

#[test]
fn site_lists_ignore_duplicates() {
    let mut store = MemoryStore::new();
    assert!(add_site(&mut store, SiteList::Whitelisted, "a.test").unwrap());
    assert!(!add_site(&mut store, SiteList::Whitelisted, "a.test").unwrap());
    assert!(site_in(&store, SiteList::Whitelisted, "a.test"));
    assert!(!site_in(&store, SiteList::Blocked, "a.test"));

    assert!(remove_site(&mut store, SiteList::Whitelisted, "a.test").unwrap());
    assert!(!remove_site(&mut store, SiteList::Whitelisted, "a.test").unwrap());
    assert!(store.sites(SiteList::Whitelisted).is_empty());
}

// ============================================================================
// On-disk layout
// ============================================================================

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    {
        let mut store = JsonFileStore::open(&path).unwrap();
        save_snapshot(&mut store, "a.test", snapshot("Profile", 42)).unwrap();
        add_site(&mut store, SiteList::Blocked, "spam.test").unwrap();
    }

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.get("a.test"), vec![snapshot("Profile", 42)]);
    assert_eq!(reopened.sites(SiteList::Blocked), vec!["spam.test"]);
}

#[test]
fn file_layout_uses_extension_key_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let mut store = JsonFileStore::open(&path).unwrap();
    save_snapshot(&mut store, "a.test", snapshot("Profile", 42)).unwrap();
    add_site(&mut store, SiteList::Whitelisted, "a.test").unwrap();

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        written,
        json!({
            "savedForms": {
                "a.test": [{
                    "name": "Profile",
                    "timestamp": 42,
                    "data": { "news": true, "user": "profile" },
                    "selectors": [{ "key": "user", "selector": "#user" }]
                }]
            },
            "whitelistedSites": ["a.test"],
            "blockedSites": []
        })
    );
}

#[test]
fn missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::open(dir.path().join("absent.json")).unwrap();
    assert!(store.hostnames().is_empty());
}

#[test]
fn corrupt_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonFileStore::open(&path).unwrap();
    assert!(store.hostnames().is_empty());
}

#[test]
fn malformed_entries_are_replaced_with_defaults() {
    let value = json!({
        "savedForms": {
            "a.test": [
                { "name": "Good", "timestamp": 5, "data": { "q": "x", "n": 3, "nested": { "a": 1 } } },
                { "timestamp": "soon", "data": "oops", "selectors": [{ "key": "q" }, { "key": "q", "selector": "#q" }] },
                "not an object"
            ],
            "b.test": "not a list"
        },
        "whitelistedSites": ["a.test", 7],
        "blockedSites": null
    });

    let data = StoreData::from_value_lossy(&value);
    let snapshots = data.get("a.test");
    assert_eq!(snapshots.len(), 2);

    assert_eq!(snapshots[0].data["q"], FieldValue::Text("x".into()));
    assert_eq!(snapshots[0].data["n"], FieldValue::Text("3".into()));
    assert_eq!(snapshots[0].data["nested"], FieldValue::Null);

    assert_eq!(snapshots[1].name, "");
    assert_eq!(snapshots[1].timestamp, 0);
    assert!(snapshots[1].data.is_empty());
    assert_eq!(snapshots[1].selectors.len(), 1);

    assert!(data.get("b.test").is_empty());
    assert_eq!(data.whitelisted_sites, vec!["a.test"]);
    assert!(data.blocked_sites.is_empty());
}

#[test]
fn export_writes_everything_in_store_layout() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = MemoryStore::new();
    save_snapshot(&mut store, "a.test", snapshot("One", 1)).unwrap();
    save_snapshot(&mut store, "b.test", snapshot("Two", 2)).unwrap();
    add_site(&mut store, SiteList::Whitelisted, "a.test").unwrap();

    let out = dir.path().join("export.json");
    export_store(&store, &out).unwrap();

    let reopened = JsonFileStore::open(&out).unwrap();
    assert_eq!(collect(&reopened), collect(&store));
    assert_eq!(reopened.hostnames(), vec!["a.test", "b.test"]);
}

// ============================================================================
// Hostnames
// ============================================================================

#[test]
fn hostnames_accept_urls_and_bare_hosts() {
    assert_eq!(normalize_hostname("Example.COM").unwrap(), "example.com");
    assert_eq!(normalize_hostname("https://www.example.com:8443/login?next=/").unwrap(), "www.example.com");
    assert_eq!(normalize_hostname("example.com/path").unwrap(), "example.com");
    assert!(matches!(
        normalize_hostname("   "),
        Err(FormSnapshotError::InvalidHostname(_))
    ));
    assert!(normalize_hostname("file:///tmp/x").is_err());
}

#[test]
fn hostnames_drop_the_port_either_way() {
    let bare = normalize_hostname("localhost:3000").unwrap();
    let url = normalize_hostname("http://localhost:3000/x").unwrap();
    assert_eq!(bare, "localhost");
    assert_eq!(bare, url);
    assert_eq!(normalize_hostname("Shop.Example.com:8080/cart").unwrap(), "shop.example.com");
}
