use crate::dom::dom_model::{Document, NodeId};
use crate::snapshot::snapshot_model::FieldValue;

/// Input subtypes that never carry user data.
pub const EXCLUDED_INPUT_TYPES: [&str; 6] = ["submit", "button", "image", "file", "reset", "hidden"];

/// How a field is read at capture time and written at fill time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
    ContentEditable,
}

impl FieldKind {
    /// Capture eligibility: `None` for elements that hold no capturable data.
    pub fn classify(doc: &Document, id: NodeId) -> Option<FieldKind> {
        match doc.tag(id)? {
            "input" => {
                let ty = doc.input_type(id);
                if EXCLUDED_INPUT_TYPES.contains(&ty.as_str()) {
                    None
                } else {
                    Some(Self::for_element(doc, id))
                }
            }
            "textarea" | "select" => Some(Self::for_element(doc, id)),
            "button" => None,
            _ if is_editable_surface(doc, id) => Some(FieldKind::ContentEditable),
            _ => None,
        }
    }

    /// Write semantics for any element a fill targets. Never fails: anything
    /// unrecognised is treated as a value-bearing control.
    pub fn for_element(doc: &Document, id: NodeId) -> FieldKind {
        match doc.tag(id) {
            Some("input") => match doc.input_type(id).as_str() {
                "radio" => FieldKind::Radio,
                "checkbox" => FieldKind::Checkbox,
                _ => FieldKind::Text,
            },
            Some("textarea") => FieldKind::Textarea,
            Some("select") => FieldKind::Select,
            Some(_) if doc.is_content_editable(id) || is_editable_surface(doc, id) => {
                FieldKind::ContentEditable
            }
            _ => FieldKind::Text,
        }
    }

    /// Read the element's value. Checkboxes always yield a boolean; a radio
    /// yields its value only when checked; everything else only when non-empty.
    pub fn extract(self, doc: &Document, id: NodeId) -> Option<FieldValue> {
        match self {
            FieldKind::Checkbox => Some(FieldValue::Bool(doc.checked(id))),
            FieldKind::Radio => doc.checked(id).then(|| FieldValue::Text(doc.value(id))),
            FieldKind::Text | FieldKind::Textarea | FieldKind::Select => {
                non_empty(doc.value(id))
            }
            FieldKind::ContentEditable => non_empty(doc.text_content(id)),
        }
    }

    /// Write `value` into the element. Returns whether the element was mutated.
    pub fn apply(self, doc: &mut Document, id: NodeId, value: &FieldValue) -> bool {
        match self {
            FieldKind::Radio => {
                if value.matches_text(&doc.value(id)) {
                    doc.set_checked(id, true);
                    true
                } else {
                    false
                }
            }
            FieldKind::Checkbox => {
                doc.set_checked(id, value.is_truthy());
                true
            }
            FieldKind::ContentEditable => {
                doc.set_text_content(id, &value.as_text());
                true
            }
            FieldKind::Text | FieldKind::Textarea | FieldKind::Select => {
                doc.set_value(id, &value.as_text());
                true
            }
        }
    }
}

/// Explicitly content-editable, or carrying a textbox role.
pub fn is_editable_surface(doc: &Document, id: NodeId) -> bool {
    matches!(
        doc.attr(id, "contenteditable"),
        Some("" | "true" | "plaintext-only")
    ) || doc.attr(id, "role") == Some("textbox")
}

fn non_empty(value: String) -> Option<FieldValue> {
    if value.is_empty() {
        None
    } else {
        Some(FieldValue::Text(value))
    }
}
