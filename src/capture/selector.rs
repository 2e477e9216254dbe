use crate::dom::dom_model::{Document, NodeId};
use crate::dom::escape::css_escape;

/// Ancestor levels walked by the structural fallback.
pub const MAX_PATH_DEPTH: usize = 3;

/// Best-effort locator for `id`. Empty string means unlocatable.
///
/// Priority: `#id`, then `tag[name=..]`, `tag[aria-label=..]`,
/// `tag[placeholder=..]`, then a short structural path.
pub fn synthesize(doc: &Document, id: NodeId) -> String {
    let Some(tag) = doc.tag(id) else {
        return String::new();
    };

    if let Some(el_id) = doc.non_empty_attr(id, "id") {
        return format!("#{}", css_escape(el_id));
    }

    for attr in ["name", "aria-label", "placeholder"] {
        if let Some(value) = doc.non_empty_attr(id, attr) {
            return format!("{}[{}=\"{}\"]", tag, attr, css_escape(value));
        }
    }

    structural_path(doc, id)
}

/// `tag[:nth-of-type(i)]` segments joined with `>`, at most
/// [`MAX_PATH_DEPTH`] levels, never including `<body>` or anything above it.
pub fn structural_path(doc: &Document, id: NodeId) -> String {
    let body = doc.body();
    let mut parts = Vec::new();
    let mut node = id;

    while parts.len() < MAX_PATH_DEPTH && Some(node) != body {
        let Some(tag) = doc.tag(node) else { break };
        let Some(parent) = doc.parent(node) else { break };

        let same_tag: Vec<NodeId> = doc
            .element_children(parent)
            .into_iter()
            .filter(|&s| doc.tag(s) == Some(tag))
            .collect();

        let segment = match same_tag.iter().position(|&s| s == node) {
            Some(idx) if same_tag.len() > 1 => format!("{}:nth-of-type({})", tag, idx + 1),
            _ => tag.to_string(),
        };
        parts.push(segment);
        node = parent;
    }

    parts.reverse();
    parts.join(" > ")
}
