use form_snapshot::dom::dom_model::{Document, EventKind, NodeId};
use serde_json::{Value, json};

/// `<html><body>..</body></html>` around the given element trees.
pub fn page(body: Vec<Value>) -> Document {
    Document::from_value(json!({
        "tag": "html",
        "children": [{ "tag": "body", "children": body }]
    }))
    .unwrap()
}

/// Leaf element with string attributes.
pub fn el(tag: &str, attrs: Value) -> Value {
    json!({ "tag": tag, "attrs": attrs })
}

pub fn form(attrs: Value, children: Vec<Value>) -> Value {
    json!({ "tag": "form", "attrs": attrs, "children": children })
}

pub fn select(attrs: Value, options: &[(&str, bool)]) -> Value {
    let options: Vec<Value> = options
        .iter()
        .map(|(value, selected)| {
            let attrs = if *selected {
                json!({ "value": value, "selected": "" })
            } else {
                json!({ "value": value })
            };
            json!({ "tag": "option", "attrs": attrs, "children": [value] })
        })
        .collect();
    json!({ "tag": "select", "attrs": attrs, "children": options })
}

pub fn by_id(doc: &Document, id: &str) -> NodeId {
    doc.elements()
        .into_iter()
        .find(|&e| doc.attr(e, "id") == Some(id))
        .unwrap_or_else(|| panic!("no element with id {}", id))
}

pub fn by_name(doc: &Document, name: &str) -> NodeId {
    doc.elements()
        .into_iter()
        .find(|&e| doc.attr(e, "name") == Some(name))
        .unwrap_or_else(|| panic!("no element named {}", name))
}

pub fn all_named(doc: &Document, name: &str) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|&e| doc.attr(e, "name") == Some(name))
        .collect()
}

pub fn first_tag(doc: &Document, tag: &str) -> NodeId {
    doc.elements()
        .into_iter()
        .find(|&e| doc.tag(e) == Some(tag))
        .unwrap_or_else(|| panic!("no <{}> element", tag))
}

/// Event kinds dispatched on `target`, in order.
pub fn events_on(doc: &Document, target: NodeId) -> Vec<EventKind> {
    doc.events()
        .iter()
        .filter(|e| e.target == target)
        .map(|e| e.kind)
        .collect()
}
