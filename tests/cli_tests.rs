use std::path::Path;

use clap::Parser;
use form_snapshot::capture::capture::CaptureOptions;
use form_snapshot::capture::key::FallbackKeys;
use form_snapshot::cli::commands::{cmd_clear, cmd_delete, cmd_fill, cmd_save, cmd_sites, load_document};
use form_snapshot::cli::config::{AppConfig, Cli, Commands, SitesCommand, load_config, parse_config};
use form_snapshot::error::FormSnapshotError;
use form_snapshot::fill::fill_model::{FillConfig, FillState};
use form_snapshot::store::SnapshotStore;
use form_snapshot::store::file::JsonFileStore;
use form_snapshot::store::site_record::SnapshotRef;
use form_snapshot::store::store_model::SiteList;
use form_snapshot::workflow::save::SaveOutcome;
use serde_json::json;

use crate::common::utils::by_name;

mod common;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_save_minimal() {
    let cli = Cli::parse_from([
        "form-snapshot", "save", "--dom", "page.json", "--host", "a.test", "--name", "Login",
    ]);
    match cli.command {
        Commands::Save {
            dom,
            host,
            name,
            form,
            fallback_keys,
            document_passwords,
        } => {
            assert_eq!(dom, "page.json");
            assert_eq!(host, "a.test");
            assert_eq!(name, "Login");
            assert!(form.is_none());
            assert!(fallback_keys.is_none());
            assert!(!document_passwords);
        }
        _ => panic!("Expected Save command"),
    }
}

#[test]
fn cli_parse_save_all_args() {
    let cli = Cli::parse_from([
        "form-snapshot",
        "save",
        "--dom",
        "page.json",
        "--host",
        "https://a.test/login",
        "--name",
        "Login",
        "--form",
        "2",
        "--fallback-keys",
        "random",
        "--document-passwords",
    ]);
    match cli.command {
        Commands::Save {
            form,
            fallback_keys,
            document_passwords,
            ..
        } => {
            assert_eq!(form, Some(2));
            assert_eq!(fallback_keys, Some(FallbackKeys::Random));
            assert!(document_passwords);
        }
        _ => panic!("Expected Save command"),
    }
}

#[test]
fn cli_parse_fill_by_name_or_timestamp() {
    let cli = Cli::parse_from([
        "form-snapshot", "fill", "--dom", "p.json", "--host", "a.test", "--name", "Login", "-o", "out.json",
    ]);
    match cli.command {
        Commands::Fill { name, timestamp, out, .. } => {
            assert_eq!(name.as_deref(), Some("Login"));
            assert!(timestamp.is_none());
            assert_eq!(out.as_deref(), Some("out.json"));
        }
        _ => panic!("Expected Fill command"),
    }

    let cli = Cli::parse_from([
        "form-snapshot", "fill", "--dom", "p.json", "--host", "a.test", "--timestamp", "42",
    ]);
    assert!(matches!(cli.command, Commands::Fill { timestamp: Some(42), .. }));
}

#[test]
fn cli_fill_requires_exactly_one_selector() {
    assert!(Cli::try_parse_from(["form-snapshot", "fill", "--dom", "p.json", "--host", "a.test"]).is_err());
    assert!(
        Cli::try_parse_from([
            "form-snapshot", "fill", "--dom", "p.json", "--host", "a.test", "--name", "x", "--timestamp", "1",
        ])
        .is_err()
    );
}

#[test]
fn cli_parse_sites_subcommands() {
    let cli = Cli::parse_from(["form-snapshot", "sites", "block", "spam.test"]);
    match cli.command {
        Commands::Sites {
            action: SitesCommand::Block { host },
        } => assert_eq!(host, "spam.test"),
        _ => panic!("Expected Sites Block command"),
    }

    let cli = Cli::parse_from(["form-snapshot", "sites", "list"]);
    assert!(matches!(cli.command, Commands::Sites { action: SitesCommand::List }));
}

#[test]
fn cli_parse_clear() {
    let cli = Cli::parse_from(["form-snapshot", "--store", "s.json", "clear"]);
    assert!(matches!(cli.command, Commands::Clear));
    assert_eq!(cli.store.as_deref(), Some("s.json"));
}

#[test]
fn cli_parse_global_flags() {
    let cli = Cli::parse_from([
        "form-snapshot", "-vv", "--store", "s.json", "--require-whitelist", "list",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.store.as_deref(), Some("s.json"));
    assert!(cli.require_whitelist);

    let cli2 = Cli::parse_from(["form-snapshot", "export", "-o", "backup.json", "-vvv"]);
    assert_eq!(cli2.verbose, 3);
}

#[test]
fn cli_rejects_unknown_fallback_policy() {
    let result = Cli::try_parse_from([
        "form-snapshot", "save", "--dom", "p", "--host", "h", "--name", "n", "--fallback-keys", "sequential",
    ]);
    assert!(result.is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_load_missing_file() {
    let config = load_config(Some("nonexistent_file_that_does_not_exist.yaml"));
    assert_eq!(config, AppConfig::default());
}

#[test]
fn config_default_values() {
    let config = AppConfig::default();
    assert_eq!(config.store.path, "form-snapshot.json");
    assert_eq!(config.fill.retry_interval_ms, 200);
    assert_eq!(config.fill.max_attempts, 25);
    assert_eq!(config.capture.fallback_keys, FallbackKeys::Hashed);
    assert!(!config.capture.document_passwords);
    assert!(!config.require_whitelist);
}

#[test]
fn config_yaml_roundtrip() {
    let config = AppConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn config_partial_yaml() {
    let yaml = r#"
fill:
  max_attempts: 10
capture:
  fallback_keys: random
"#;
    let config = parse_config(Path::new("form-snapshot.yaml"), yaml).unwrap();
    assert_eq!(config.fill.max_attempts, 10);
    // Other fill fields get defaults
    assert_eq!(config.fill.retry_interval_ms, 200);
    assert_eq!(config.capture.fallback_keys, FallbackKeys::Random);
    assert!(!config.capture.document_passwords);
    assert_eq!(config.store.path, "form-snapshot.json");
}

#[test]
fn config_empty_file_is_all_defaults() {
    assert_eq!(parse_config(Path::new("x.yaml"), "\n").unwrap(), AppConfig::default());
}

#[test]
fn config_malformed_yaml_is_reported_and_load_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form-snapshot.yaml");
    let content = "fill: [not, a, mapping]\n";
    std::fs::write(&path, content).unwrap();

    let err = parse_config(&path, content).unwrap_err();
    assert!(matches!(err, FormSnapshotError::YamlParse { .. }));

    let config = load_config(path.to_str());
    assert_eq!(config, AppConfig::default());
}

#[test]
fn cli_flags_override_config_values() {
    let config = AppConfig::default();
    assert_eq!(config.store_path(Some("other.json")), Path::new("other.json"));
    assert_eq!(config.store_path(None), Path::new("form-snapshot.json"));

    let fill = config.fill_config(Some(3), None);
    assert_eq!(
        fill,
        FillConfig {
            retry_interval_ms: 200,
            max_attempts: 3
        }
    );

    let capture = config.capture_options(None, true);
    assert_eq!(
        capture,
        CaptureOptions {
            fallback_keys: FallbackKeys::Hashed,
            document_passwords: true
        }
    );
}

// ============================================================================
// Command Tests
// ============================================================================

fn write_page(dir: &Path, file: &str, user: &str) -> String {
    let page = json!({
        "tag": "html",
        "children": [{
            "tag": "body",
            "children": [{
                "tag": "form",
                "children": [
                    { "tag": "input", "attrs": { "name": "user", "value": user } },
                    { "tag": "input", "attrs": { "type": "checkbox", "name": "remember", "checked": "" } }
                ]
            }]
        }]
    });
    let path = dir.join(file);
    std::fs::write(&path, page.to_string()).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn save_then_fill_through_the_commands() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    let filled_source = write_page(dir.path(), "filled.json", "ann");
    let blank = write_page(dir.path(), "blank.json", "");
    let out = dir.path().join("out.json");

    let outcome = cmd_save(
        &filled_source,
        "https://A.test/login",
        "Login",
        None,
        &store_path,
        CaptureOptions::default(),
        false,
    )
    .unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved(_)));

    let store = JsonFileStore::open(&store_path).unwrap();
    assert_eq!(store.hostnames(), vec!["a.test"]);

    let state = cmd_fill(
        &blank,
        "a.test",
        SnapshotRef::Name("Login".into()),
        out.to_str(),
        &store_path,
        FillConfig::default(),
        false,
    )
    .unwrap();
    assert_eq!(state, Some(FillState::Done));

    let restored = load_document(&out).unwrap();
    assert_eq!(restored.value(by_name(&restored, "user")), "ann");
    assert!(restored.checked(by_name(&restored, "remember")));
}

#[test]
fn fill_with_unknown_snapshot_fails() {
    let dir = tempfile::tempdir().unwrap();
    let page = write_page(dir.path(), "p.json", "");
    let err = cmd_fill(
        &page,
        "a.test",
        SnapshotRef::Name("Nope".into()),
        None,
        &dir.path().join("store.json"),
        FillConfig::default(),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, FormSnapshotError::UnknownSnapshot { .. }));
}

#[test]
fn delete_and_site_commands_update_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    let page = write_page(dir.path(), "p.json", "ann");

    let SaveOutcome::Saved(snapshot) =
        cmd_save(&page, "a.test", "Login", None, &store_path, CaptureOptions::default(), false).unwrap()
    else {
        panic!("expected Saved");
    };

    assert!(cmd_delete("a.test", snapshot.timestamp, &store_path).unwrap());
    assert!(!cmd_delete("a.test", snapshot.timestamp, &store_path).unwrap());

    cmd_sites(&SitesCommand::Enable { host: "https://a.test/".into() }, &store_path).unwrap();
    cmd_sites(&SitesCommand::Block { host: "spam.test".into() }, &store_path).unwrap();

    let store = JsonFileStore::open(&store_path).unwrap();
    assert!(store.hostnames().is_empty());
    assert_eq!(store.sites(SiteList::Whitelisted), vec!["a.test"]);
    assert_eq!(store.sites(SiteList::Blocked), vec!["spam.test"]);
}

#[test]
fn load_document_reports_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "[1, 2").unwrap();
    assert!(matches!(load_document(&path), Err(FormSnapshotError::JsonParse { .. })));
    assert!(matches!(
        load_document(&dir.path().join("missing.json")),
        Err(FormSnapshotError::Io { .. })
    ));
}

#[test]
fn clear_command_keeps_site_lists() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    let page = write_page(dir.path(), "p.json", "ann");

    cmd_save(&page, "a.test", "One", None, &store_path, CaptureOptions::default(), false).unwrap();
    cmd_save(&page, "b.test", "Two", None, &store_path, CaptureOptions::default(), false).unwrap();
    cmd_sites(&SitesCommand::Enable { host: "a.test".into() }, &store_path).unwrap();

    assert_eq!(cmd_clear(&store_path).unwrap(), 2);

    let store = JsonFileStore::open(&store_path).unwrap();
    assert!(store.hostnames().is_empty());
    assert_eq!(store.sites(SiteList::Whitelisted), vec!["a.test"]);
}

#[test]
fn save_with_form_zero_is_a_missing_form() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    let page = write_page(dir.path(), "p.json", "ann");

    let err = cmd_save(&page, "a.test", "Login", Some(0), &store_path, CaptureOptions::default(), false)
        .unwrap_err();
    assert!(matches!(err, FormSnapshotError::FormNotFound { index: 0, count: 1 }));

    let store = JsonFileStore::open(&store_path).unwrap();
    assert!(store.hostnames().is_empty());
}
