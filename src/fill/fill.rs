use std::collections::BTreeMap;

use indexmap::IndexSet;

use tracing::{debug, warn};

use crate::dom::dom_model::{Document, EventKind, NodeId};
use crate::dom::query::query_selector;
use crate::fill::fill_model::{FillConfig, FillState};
use crate::snapshot::field_kind::FieldKind;
use crate::snapshot::snapshot_model::{FieldData, FieldValue, SelectorEntry, selector_map};

/// One fill operation: stored values, locator hints and the retry state.
///
/// Sessions are independent; starting a second fill never cancels an earlier one.
#[derive(Debug, Clone)]
pub struct FillSession {
    data: FieldData,
    selectors: BTreeMap<String, String>,
    config: FillConfig,
    state: FillState,
    attempts: u32,
}

impl FillSession {
    /// Create the session and run attempt 0 immediately.
    pub fn start(
        doc: &mut Document,
        data: FieldData,
        selectors: &[SelectorEntry],
        config: FillConfig,
    ) -> Self {
        let keys: IndexSet<String> = data.keys().cloned().collect();
        let mut session = FillSession {
            data,
            selectors: selector_map(selectors),
            config,
            state: FillState::Pending { keys, attempt: 0 },
            attempts: 0,
        };
        session.tick(doc);
        session
    }

    /// Run one more attempt. No-op once the session is terminal.
    pub fn tick(&mut self, doc: &mut Document) -> &FillState {
        if self.state.is_terminal() {
            return &self.state;
        }
        let mut keys = match &mut self.state {
            FillState::Pending { keys, .. } => std::mem::take(keys),
            _ => IndexSet::new(),
        };
        attempt_fill(doc, &self.data, &self.selectors, &mut keys);
        self.attempts += 1;
        debug!(attempt = self.attempts, pending = keys.len(), "fill attempt");

        self.state = if keys.is_empty() {
            FillState::Done
        } else if self.attempts >= self.config.max_attempts.max(1) {
            warn!(
                pending = ?keys,
                attempts = self.attempts,
                "could not fill all fields before the retry budget ran out"
            );
            FillState::Exhausted { keys }
        } else {
            FillState::Pending {
                keys,
                attempt: self.attempts,
            }
        };
        &self.state
    }

    pub fn state(&self) -> &FillState {
        &self.state
    }

    /// Attempts run so far, attempt 0 included.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn config(&self) -> &FillConfig {
        &self.config
    }
}

/// One sweep over the pending keys in capture order. Keys written are removed from `pending`.
fn attempt_fill(
    doc: &mut Document,
    data: &FieldData,
    selectors: &BTreeMap<String, String>,
    pending: &mut IndexSet<String>,
) {
    let keys: Vec<String> = pending.iter().cloned().collect();

    for key in keys {
        let Some(value) = data.get(&key) else {
            pending.shift_remove(&key);
            continue;
        };

        // ---- Exact attribute match ----
        let matched = exact_matches(doc, &key);
        if !matched.is_empty() {
            for el in matched {
                write_field(doc, el, value);
            }
            pending.shift_remove(&key);
            continue;
        }

        // ---- Stored locator ----
        let Some(selector) = selectors.get(&key) else {
            continue;
        };
        match query_selector(doc, selector) {
            Ok(Some(el)) => {
                write_field(doc, el, value);
                pending.shift_remove(&key);
            }
            Ok(None) => {}
            Err(e) => debug!(key = %key, error = %e, "stored selector unusable"),
        }
    }
}

/// Elements whose `name` or `id` equals `key` exactly, in tree order.
fn exact_matches(doc: &Document, key: &str) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|&el| doc.attr(el, "name") == Some(key) || doc.attr(el, "id") == Some(key))
        .collect()
}

fn write_field(doc: &mut Document, el: NodeId, value: &FieldValue) {
    let kind = FieldKind::for_element(doc, el);
    if kind.apply(doc, el, value) {
        doc.dispatch(el, EventKind::Input, true);
        doc.dispatch(el, EventKind::Change, true);
    }
}
