use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capture::key::{FallbackKeys, derive_key, fallback_key, ordinal_key};
use crate::capture::selector::synthesize;
use crate::dom::dom_model::{Document, NodeId};
use crate::snapshot::field_kind::{FieldKind, is_editable_surface};
use crate::snapshot::snapshot_model::{FieldData, FieldValue, SelectorEntry};

/// What a capture pass walks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureScope {
    /// Every eligible element on the page.
    Document,
    /// The controls of one form.
    Form(NodeId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOptions {
    #[serde(default)]
    pub fallback_keys: FallbackKeys,

    /// Capture password inputs in whole-document mode (form mode always does).
    #[serde(default)]
    pub document_passwords: bool,
}

/// Per-field record produced while capturing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub key: String,
    pub kind: FieldKind,
    pub value: FieldValue,
    pub selector: String,
}

/// `Snapshot.data` and `Snapshot.selectors` before naming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureResult {
    pub data: FieldData,
    pub selectors: Vec<SelectorEntry>,
}

impl CaptureResult {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Later writes for the same key replace the value; an empty selector is not recorded.
    fn record(&mut self, field: FieldDescriptor) {
        debug!(key = %field.key, kind = ?field.kind, "captured field");
        if !field.selector.is_empty() {
            self.selectors.push(SelectorEntry {
                key: field.key.clone(),
                selector: field.selector,
            });
        }
        self.data.insert(field.key, field.value);
    }
}

pub fn capture(doc: &Document, scope: CaptureScope, options: &CaptureOptions) -> CaptureResult {
    match scope {
        CaptureScope::Document => capture_document(doc, options),
        CaptureScope::Form(form) => capture_form(doc, form, options),
    }
}

// =========================================================================
// Whole-document capture
// =========================================================================

pub fn capture_document(doc: &Document, options: &CaptureOptions) -> CaptureResult {
    let mut result = CaptureResult::default();
    let mut handled_groups = HashSet::new();

    let candidates: Vec<NodeId> = doc
        .elements()
        .into_iter()
        .filter(|&id| is_document_candidate(doc, id))
        .collect();

    for (idx, &id) in candidates.iter().enumerate() {
        let Some(kind) = FieldKind::classify(doc, id) else {
            continue;
        };
        if doc.input_type(id) == "password" && !options.document_passwords {
            continue;
        }

        let key = derive_key(doc, id).unwrap_or_else(|| ordinal_key(doc, id, idx + 1));

        if kind == FieldKind::Radio {
            let group = radio_group_key(doc, id, key);
            if !handled_groups.insert(group.clone()) {
                continue;
            }
            let peers = radio_peers(doc, id, doc.elements());
            result.record(FieldDescriptor {
                key: group,
                kind,
                value: radio_group_value(doc, &peers),
                selector: synthesize(doc, id),
            });
        } else if let Some(value) = kind.extract(doc, id) {
            result.record(FieldDescriptor {
                key,
                kind,
                value,
                selector: synthesize(doc, id),
            });
        }
    }

    debug!(fields = result.data.len(), "document capture complete");
    result
}

fn is_document_candidate(doc: &Document, id: NodeId) -> bool {
    matches!(doc.tag(id), Some("input" | "textarea" | "select")) || is_editable_surface(doc, id)
}

// =========================================================================
// Form-scoped capture
// =========================================================================

pub fn capture_form(doc: &Document, form: NodeId, options: &CaptureOptions) -> CaptureResult {
    let mut result = CaptureResult::default();
    let controls = doc.form_controls(form);

    // ---- Pass 1: native serialization is authoritative for its keys ----
    let entries = doc.form_data(form);
    let mut seen = HashSet::new();
    for (name, value) in &entries {
        result.data.insert(name.clone(), FieldValue::Text(value.clone()));
        if !seen.insert(name.clone()) {
            continue;
        }
        let named = controls
            .iter()
            .copied()
            .find(|&el| doc.attr(el, "name") == Some(name.as_str()));
        if let Some(el) = named {
            let selector = synthesize(doc, el);
            if !selector.is_empty() {
                result.selectors.push(SelectorEntry {
                    key: name.clone(),
                    selector,
                });
            }
        }
    }
    let pass1_keys: HashSet<String> = result.data.keys().cloned().collect();
    debug!(fields = pass1_keys.len(), "form pass 1 complete");

    // ---- Pass 2: identifiable controls the serializer did not cover ----
    let mut handled_groups = HashSet::new();
    for &id in &controls {
        if doc
            .non_empty_attr(id, "name")
            .is_some_and(|name| pass1_keys.contains(name))
        {
            continue;
        }
        let Some(kind) = FieldKind::classify(doc, id) else {
            continue;
        };
        let Some(key) = derive_key(doc, id) else {
            continue;
        };

        if kind == FieldKind::Radio {
            let group = radio_group_key(doc, id, key);
            if pass1_keys.contains(&group) || !handled_groups.insert(group.clone()) {
                continue;
            }
            let peers = radio_peers(doc, id, controls.clone());
            result.record(FieldDescriptor {
                key: group,
                kind,
                value: radio_group_value(doc, &peers),
                selector: synthesize(doc, id),
            });
        } else if pass1_keys.contains(&key) {
            continue;
        } else if let Some(value) = kind.extract(doc, id) {
            result.record(FieldDescriptor {
                key,
                kind,
                value,
                selector: synthesize(doc, id),
            });
        }
    }

    if result.is_empty() && !controls.is_empty() {
        warn!(
            policy = ?options.fallback_keys,
            "form has no identifiable fields, capturing with synthetic keys"
        );
        capture_fallback(doc, &controls, options, &mut result);
    }

    debug!(fields = result.data.len(), "form capture complete");
    result
}

/// Degenerate forms: every control with a usable value gets a `<type>_<n>` key.
fn capture_fallback(
    doc: &Document,
    controls: &[NodeId],
    options: &CaptureOptions,
    result: &mut CaptureResult,
) {
    for (idx, &id) in controls.iter().enumerate() {
        let Some(kind) = FieldKind::classify(doc, id) else {
            continue;
        };
        let Some(value) = kind.extract(doc, id) else {
            continue;
        };
        let key = derive_key(doc, id).unwrap_or_else(|| {
            fallback_key(options.fallback_keys, doc, id, idx + 1, &result.data)
        });
        result.record(FieldDescriptor {
            key,
            kind,
            value,
            selector: synthesize(doc, id),
        });
    }
}

// =========================================================================
// Radio groups
// =========================================================================

/// Groups are keyed by `name`; an unnamed radio is its own group.
fn radio_group_key(doc: &Document, id: NodeId, fallback: String) -> String {
    doc.non_empty_attr(id, "name")
        .map(str::to_string)
        .unwrap_or(fallback)
}

/// Radios sharing `id`'s name among `pool`; just `id` when unnamed.
fn radio_peers(doc: &Document, id: NodeId, pool: Vec<NodeId>) -> Vec<NodeId> {
    let Some(name) = doc.non_empty_attr(id, "name") else {
        return vec![id];
    };
    pool.into_iter()
        .filter(|&r| {
            doc.tag(r) == Some("input")
                && doc.input_type(r) == "radio"
                && doc.attr(r, "name") == Some(name)
        })
        .collect()
}

/// Value of the checked radio (the last one, should several claim it), else null.
fn radio_group_value(doc: &Document, peers: &[NodeId]) -> FieldValue {
    peers
        .iter()
        .rev()
        .find(|&&r| doc.checked(r))
        .map(|&r| FieldValue::Text(doc.value(r)))
        .unwrap_or(FieldValue::Null)
}
