use std::path::Path;

use tracing::{debug, info};

use crate::capture::capture::CaptureOptions;
use crate::cli::config::SitesCommand;
use crate::dom::dom_model::Document;
use crate::error::{FormSnapshotError, Result};
use crate::fill::fill_model::{FillConfig, FillState};
use crate::fill::schedule::{SystemClock, drive};
use crate::store::file::JsonFileStore;
use crate::store::normalize_hostname;
use crate::store::site_record::{
    SnapshotRef, add_site, clear_snapshots, delete_snapshot, export_store, find_snapshot,
    list_snapshots, remove_site,
};
use crate::store::store_model::SiteList;
use crate::store::SnapshotStore;
use crate::workflow::context::PageContext;
use crate::workflow::dialog::{ConfirmOutcome, FormSummary, NamePrompt, SaveDialog};
use crate::workflow::message::{Request, Response, handle_request};
use crate::workflow::save::{SaveOutcome, manual_save};

// ============================================================================
// save subcommand
// ============================================================================

/// Non-interactive dialog: answers come from command-line arguments.
pub struct ArgsDialog {
    name: String,
    /// 1-based, as the user sees forms listed.
    form: Option<usize>,
}

impl ArgsDialog {
    pub fn new(name: &str, form: Option<usize>) -> Self {
        ArgsDialog {
            name: name.to_string(),
            form,
        }
    }
}

impl SaveDialog for ArgsDialog {
    fn confirm_save(&mut self) -> ConfirmOutcome {
        ConfirmOutcome::Save
    }

    fn prompt_name(&mut self) -> NamePrompt {
        NamePrompt::Named(self.name.clone())
    }

    fn choose_form(&mut self, forms: &[FormSummary]) -> Option<usize> {
        match self.form {
            Some(index) => index.checked_sub(1),
            None => {
                eprintln!("Page has {} forms, pick one with --form:", forms.len());
                for form in forms {
                    eprintln!("  {}", form);
                }
                None
            }
        }
    }

    fn nothing_to_save(&mut self) {
        eprintln!("No form data found on this page.");
    }
}

pub fn cmd_save(
    dom: &str,
    host: &str,
    name: &str,
    form: Option<usize>,
    store_path: &Path,
    capture: CaptureOptions,
    require_whitelist: bool,
) -> Result<SaveOutcome> {
    let doc = load_document(Path::new(dom))?;
    if form == Some(0) {
        return Err(FormSnapshotError::FormNotFound {
            index: 0,
            count: doc.forms().len(),
        });
    }
    let hostname = normalize_hostname(host)?;
    let mut store = JsonFileStore::open(store_path)?;
    let mut dialog = ArgsDialog::new(name, form);
    let mut clock = SystemClock;

    let mut page = PageContext::new(&hostname, &mut store, &mut dialog, &mut clock)
        .with_capture(capture)
        .with_require_whitelist(require_whitelist);

    let outcome = manual_save(&doc, &mut page)?;
    match &outcome {
        SaveOutcome::Saved(snapshot) => println!(
            "Saved '{}' for {} ({} fields, timestamp {})",
            snapshot.name,
            hostname,
            snapshot.data.len(),
            snapshot.timestamp
        ),
        SaveOutcome::Skipped => println!("{} is not whitelisted, nothing saved", hostname),
        SaveOutcome::NothingToSave | SaveOutcome::Cancelled => {}
        other => println!("Not saved: {:?}", other),
    }
    Ok(outcome)
}

// ============================================================================
// fill subcommand
// ============================================================================

/// Fill `dom` from a stored snapshot. Returns the terminal fill state.
pub fn cmd_fill(
    dom: &str,
    host: &str,
    which: SnapshotRef,
    out: Option<&str>,
    store_path: &Path,
    fill: FillConfig,
    require_whitelist: bool,
) -> Result<Option<FillState>> {
    let mut doc = load_document(Path::new(dom))?;
    let hostname = normalize_hostname(host)?;
    let mut store = JsonFileStore::open(store_path)?;
    let snapshot = find_snapshot(&store, &hostname, &which)?;
    debug!(name = %snapshot.name, timestamp = snapshot.timestamp, "restoring snapshot");
    let stale: Vec<&str> = snapshot
        .stale_selectors()
        .iter()
        .map(|e| e.key.as_str())
        .collect();
    if !stale.is_empty() {
        debug!(keys = ?stale, "selector hints without a stored value");
    }

    let mut dialog = ArgsDialog::new(&snapshot.name, None);
    let mut clock = SystemClock;
    let request = Request::FillForm {
        data: snapshot.data,
        selectors: snapshot.selectors,
    };

    let response = {
        let mut page = PageContext::new(&hostname, &mut store, &mut dialog, &mut clock)
            .with_fill(fill)
            .with_require_whitelist(require_whitelist);
        handle_request(&mut doc, request, &mut page)?
    };

    let state = match response {
        Response::Filling { mut session, .. } => drive(&mut session, &mut doc, &mut clock),
        Response::Inactive => {
            println!("{} is not whitelisted, nothing filled", hostname);
            return Ok(None);
        }
        Response::Save(_) => return Ok(None),
    };

    match &state {
        FillState::Exhausted { keys } => eprintln!(
            "Filled with {} field(s) not found: {}",
            keys.len(),
            keys.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
        _ => info!("all fields filled"),
    }

    let json = doc
        .to_tree()
        .map(|tree| serde_json::to_string_pretty(&tree))
        .transpose()
        .map_err(|e| FormSnapshotError::JsonSerialize {
            context: "filled document".into(),
            source: e,
        })?
        .unwrap_or_default();

    match out {
        Some(path) => std::fs::write(path, &json).map_err(|e| FormSnapshotError::io(path, e))?,
        None => println!("{}", json),
    }
    Ok(Some(state))
}

// ============================================================================
// list / delete subcommands
// ============================================================================

pub fn cmd_list(host: Option<&str>, store_path: &Path) -> Result<()> {
    let store = JsonFileStore::open(store_path)?;
    let hosts = match host {
        Some(h) => vec![normalize_hostname(h)?],
        None => store.hostnames(),
    };

    if hosts.is_empty() {
        println!("No saved snapshots.");
        return Ok(());
    }

    for hostname in hosts {
        let snapshots = list_snapshots(&store, &hostname);
        println!("{} ({} snapshots)", hostname, snapshots.len());
        for snapshot in &snapshots {
            println!(
                "  [{}] {} ({} fields)",
                snapshot.timestamp,
                snapshot.name,
                snapshot.data.len()
            );
        }
    }
    Ok(())
}

pub fn cmd_delete(host: &str, timestamp: u64, store_path: &Path) -> Result<bool> {
    let hostname = normalize_hostname(host)?;
    let mut store = JsonFileStore::open(store_path)?;
    let removed = delete_snapshot(&mut store, &hostname, timestamp)?;
    if removed {
        println!("Deleted snapshot {} for {}", timestamp, hostname);
    } else {
        println!("No snapshot {} stored for {}", timestamp, hostname);
    }
    Ok(removed)
}

pub fn cmd_clear(store_path: &Path) -> Result<usize> {
    let mut store = JsonFileStore::open(store_path)?;
    let removed = clear_snapshots(&mut store)?;
    println!("Removed {} snapshots", removed);
    Ok(removed)
}

// ============================================================================
// sites / export subcommands
// ============================================================================

pub fn cmd_sites(action: &SitesCommand, store_path: &Path) -> Result<()> {
    let mut store = JsonFileStore::open(store_path)?;

    let (list, host, adding) = match action {
        SitesCommand::Enable { host } => (SiteList::Whitelisted, host, true),
        SitesCommand::Disable { host } => (SiteList::Whitelisted, host, false),
        SitesCommand::Block { host } => (SiteList::Blocked, host, true),
        SitesCommand::Unblock { host } => (SiteList::Blocked, host, false),
        SitesCommand::List => {
            print_sites("Whitelisted", &store.sites(SiteList::Whitelisted));
            print_sites("Blocked", &store.sites(SiteList::Blocked));
            return Ok(());
        }
    };

    let hostname = normalize_hostname(host)?;
    let changed = if adding {
        add_site(&mut store, list, &hostname)?
    } else {
        remove_site(&mut store, list, &hostname)?
    };
    if !changed {
        println!("{} unchanged", hostname);
    }
    Ok(())
}

pub fn cmd_export(output: &str, store_path: &Path) -> Result<()> {
    let store = JsonFileStore::open(store_path)?;
    export_store(&store, Path::new(output))?;
    println!("Exported {} sites to {}", store.hostnames().len(), output);
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Read a page document saved as a JSON element tree.
pub fn load_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path).map_err(|e| FormSnapshotError::io(path, e))?;
    Document::from_json(&content)
        .map_err(|e| FormSnapshotError::json_parse(format!("document {}", path.display()), e))
}

fn print_sites(label: &str, sites: &[String]) {
    println!("{} ({}):", label, sites.len());
    for site in sites {
        println!("  {}", site);
    }
}
