use tracing::{debug, info};

use crate::capture::capture::{CaptureOptions, CaptureResult, capture_document, capture_form};
use crate::dom::dom_model::{Document, NodeId};
use crate::error::{FormSnapshotError, Result};
use crate::snapshot::snapshot_model::Snapshot;
use crate::store::site_record::{add_site, save_snapshot, site_in};
use crate::store::store_model::SiteList;
use crate::workflow::context::PageContext;
use crate::workflow::dialog::{ConfirmOutcome, FormSummary, NamePrompt, SaveDialog};

/// Marker set on a form once its submission has been through the save prompt.
pub const HANDLED_ATTR: &str = "data-form-saver-handled";

/// Blank names re-open the prompt this many times in total before giving up.
pub const MAX_NAME_PROMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(Snapshot),
    /// The user dismissed the name prompt or the form chooser.
    Cancelled,
    /// The user declined to save this submission.
    Ignored,
    /// The user declined and blocked the site.
    Blocked,
    /// The page had no capturable data.
    NothingToSave,
    /// The prompt was not shown (already handled, blocked or inactive site).
    Skipped,
}

/// Explicit save request for the whole page.
pub fn manual_save(doc: &Document, page: &mut PageContext) -> Result<SaveOutcome> {
    if !page.is_active() {
        debug!(hostname = %page.hostname, "site not enabled, ignoring save trigger");
        return Ok(SaveOutcome::Skipped);
    }

    let forms = doc.forms();
    match forms.len() {
        0 => {
            let captured = capture_document(doc, &page.capture);
            if captured.is_empty() {
                page.dialog.nothing_to_save();
                return Ok(SaveOutcome::NothingToSave);
            }
            name_and_store(page, move |_| captured)
        }
        1 => save_form(doc, forms[0], page),
        count => {
            let summaries = FormSummary::describe(doc, &forms);
            match page.dialog.choose_form(&summaries) {
                Some(i) if i < count => save_form(doc, forms[i], page),
                Some(i) => Err(FormSnapshotError::FormNotFound { index: i + 1, count }),
                None => Ok(SaveOutcome::Cancelled),
            }
        }
    }
}

/// A form is being submitted: offer to save it first. The submission always
/// proceeds afterwards; the form is marked so the prompt is not shown twice.
pub fn intercept_submit(doc: &mut Document, form: NodeId, page: &mut PageContext) -> Result<SaveOutcome> {
    if !page.is_active() || doc.has_attr(form, HANDLED_ATTR) {
        return Ok(SaveOutcome::Skipped);
    }
    if site_in(&*page.store, SiteList::Blocked, &page.hostname) {
        doc.set_attr(form, HANDLED_ATTR, "true");
        return Ok(SaveOutcome::Skipped);
    }

    let outcome = match page.dialog.confirm_save() {
        ConfirmOutcome::Save => save_form(doc, form, page),
        ConfirmOutcome::Ignore => Ok(SaveOutcome::Ignored),
        ConfirmOutcome::Block => {
            info!(hostname = %page.hostname, "blocking save prompts for site");
            add_site(page.store, SiteList::Blocked, &page.hostname).map(|_| SaveOutcome::Blocked)
        }
    };

    doc.set_attr(form, HANDLED_ATTR, "true");
    outcome
}

fn save_form(doc: &Document, form: NodeId, page: &mut PageContext) -> Result<SaveOutcome> {
    name_and_store(page, |options| capture_form(doc, form, options))
}

/// Ask for a name, then capture and append the snapshot to the site record.
fn name_and_store<F>(page: &mut PageContext, capture: F) -> Result<SaveOutcome>
where
    F: FnOnce(&CaptureOptions) -> CaptureResult,
{
    let Some(name) = prompt_for_name(page.dialog) else {
        return Ok(SaveOutcome::Cancelled);
    };

    let captured = capture(&page.capture);

    // Timestamps identify snapshots for deletion, so keep them strictly increasing per site.
    let latest = page
        .store
        .get(&page.hostname)
        .iter()
        .map(|s| s.timestamp)
        .max();
    let now = page.clock.now_ms();
    let timestamp = match latest {
        Some(ts) if ts >= now => ts + 1,
        _ => now,
    };

    let snapshot = Snapshot::new(&name, timestamp, captured.data, captured.selectors);
    save_snapshot(page.store, &page.hostname, snapshot.clone())?;
    Ok(SaveOutcome::Saved(snapshot))
}

fn prompt_for_name(dialog: &mut dyn SaveDialog) -> Option<String> {
    for _ in 0..MAX_NAME_PROMPTS {
        match dialog.prompt_name() {
            NamePrompt::Cancelled => return None,
            NamePrompt::Named(name) => {
                let trimmed = name.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
                debug!("empty snapshot name, asking again");
            }
        }
    }
    None
}
