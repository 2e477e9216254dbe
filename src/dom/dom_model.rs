use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Handle to a node inside a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Serialized node tree, as produced by the page extraction script.
///
/// Elements are objects (`{"tag", "attrs", "children"}`), text nodes are bare strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomNode {
    Text(String),
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attrs: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<DomNode>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Input,
    Change,
}

/// A synthetic event dispatched on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
    pub bubbles: bool,
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: String,
    attrs: Vec<(String, String)>,

    // ---- Live control state (overrides the content attributes once set) ----
    dirty_value: Option<String>,
    dirty_checked: Option<bool>,
    dirty_selected: Option<bool>,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            dirty_value: None,
            dirty_checked: None,
            dirty_selected: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Host-independent page document: an arena of nodes plus the live state
/// of form controls and a log of dispatched events.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    events: Vec<DomEvent>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            events: Vec::new(),
        }
    }

    /// Build a document whose single top-level node is `tree`.
    pub fn from_tree(tree: &DomNode) -> Self {
        let mut doc = Document::new();
        let root = doc.root();
        doc.insert_tree(root, tree);
        doc
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tree: DomNode = serde_json::from_str(json)?;
        Ok(Self::from_tree(&tree))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let tree: DomNode = serde_json::from_value(value)?;
        Ok(Self::from_tree(&tree))
    }

    /// Serialize the document element, reflecting live control state into attributes.
    pub fn to_tree(&self) -> Option<DomNode> {
        self.children(self.root())
            .iter()
            .find(|&&c| self.is_element(c))
            .map(|&c| self.node_to_tree(c))
    }

    fn insert_tree(&mut self, parent: NodeId, tree: &DomNode) {
        match tree {
            DomNode::Text(text) => {
                self.append_text(parent, text);
            }
            DomNode::Element {
                tag,
                attrs,
                children,
            } => {
                let attrs: Vec<(&str, &str)> = attrs
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                let id = self.append_element(parent, tag, &attrs);
                for child in children {
                    self.insert_tree(id, child);
                }
            }
        }
    }

    fn node_to_tree(&self, id: NodeId) -> DomNode {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => DomNode::Text(text.clone()),
            NodeData::Document => DomNode::Element {
                tag: "#document".into(),
                attrs: BTreeMap::new(),
                children: vec![],
            },
            NodeData::Element(el) => {
                let mut attrs: BTreeMap<String, String> = el.attrs.iter().cloned().collect();
                let mut children: Vec<DomNode> = self
                    .children(id)
                    .iter()
                    .map(|&c| self.node_to_tree(c))
                    .collect();

                match el.tag.as_str() {
                    "input" => match self.input_type(id).as_str() {
                        "checkbox" | "radio" => {
                            if self.checked(id) {
                                attrs.insert("checked".into(), String::new());
                            } else {
                                attrs.remove("checked");
                            }
                        }
                        _ => {
                            if let Some(v) = &el.dirty_value {
                                attrs.insert("value".into(), v.clone());
                            }
                        }
                    },
                    "textarea" => {
                        if let Some(v) = &el.dirty_value {
                            children = vec![DomNode::Text(v.clone())];
                        }
                    }
                    "option" => {
                        let selected = self
                            .select_of(id)
                            .and_then(|s| self.selected_option(s))
                            == Some(id);
                        if selected {
                            attrs.insert("selected".into(), String::new());
                        } else {
                            attrs.remove("selected");
                        }
                    }
                    _ => {}
                }

                DomNode::Element {
                    tag: el.tag.clone(),
                    attrs,
                    children,
                }
            }
        }
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Parent only when it is an element (stops at the document node).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// Element descendants of `id` in tree order, `id` itself excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if self.is_element(next) {
                out.push(next);
            }
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every attached element in tree order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(id.0).map(|n| &n.data),
            Some(NodeData::Element(_))
        )
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.nodes.get(id.0).map(|n| &n.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn body(&self) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|&id| self.tag(id) == Some("body"))
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut data = ElementData::new(tag);
        for (k, v) in attrs {
            data.attrs.push((k.to_ascii_lowercase(), v.to_string()));
        }
        self.push_node(parent, NodeData::Element(data))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push_node(parent, NodeData::Text(text.to_string()))
    }

    fn push_node(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Detach a node (and its subtree) from the document.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0].children.retain(|&c| c != id);
            self.nodes[id.0].parent = None;
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    /// Attribute value, `None` when absent or empty.
    pub fn non_empty_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attr(id, name).filter(|v| !v.is_empty())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            match el.attrs.iter_mut().find(|(k, _)| k == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => el.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    // =========================================================================
    // Form control state
    // =========================================================================

    /// The control's `type` as a browser reports it (lowercase).
    pub fn input_type(&self, id: NodeId) -> String {
        match self.tag(id) {
            Some("input") => match self.attr(id, "type") {
                Some(t) if !t.trim().is_empty() => t.trim().to_ascii_lowercase(),
                _ => "text".into(),
            },
            Some("textarea") => "textarea".into(),
            Some("select") => {
                if self.has_attr(id, "multiple") {
                    "select-multiple".into()
                } else {
                    "select-one".into()
                }
            }
            Some("button") => match self.attr(id, "type") {
                Some(t) if !t.trim().is_empty() => t.trim().to_ascii_lowercase(),
                _ => "submit".into(),
            },
            _ => String::new(),
        }
    }

    pub fn value(&self, id: NodeId) -> String {
        let Some(el) = self.element(id) else {
            return String::new();
        };
        match el.tag.as_str() {
            "input" => {
                if let Some(v) = &el.dirty_value {
                    return v.clone();
                }
                match (el.attr("value"), self.input_type(id).as_str()) {
                    (Some(v), _) => v.to_string(),
                    (None, "checkbox" | "radio") => "on".into(),
                    (None, _) => String::new(),
                }
            }
            "textarea" => el
                .dirty_value
                .clone()
                .unwrap_or_else(|| self.text_content(id)),
            "select" => self
                .selected_option(id)
                .map(|o| self.option_value(o))
                .unwrap_or_default(),
            "option" => self.option_value(id),
            _ => el.attr("value").unwrap_or_default().to_string(),
        }
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        match self.tag(id) {
            Some("select") => {
                let mut matched = false;
                for option in self.options(id) {
                    let hit = !matched && self.option_value(option) == value;
                    matched |= hit;
                    if let Some(el) = self.element_mut(option) {
                        el.dirty_selected = Some(hit);
                    }
                }
            }
            Some(_) => {
                if let Some(el) = self.element_mut(id) {
                    el.dirty_value = Some(value.to_string());
                }
            }
            None => {}
        }
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id)
            .map(|el| el.dirty_checked.unwrap_or_else(|| el.attr("checked").is_some()))
            .unwrap_or(false)
    }

    /// Set checkedness; checking a radio unchecks the rest of its group.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if checked && self.input_type(id) == "radio" {
            if let Some(name) = self.non_empty_attr(id, "name").map(str::to_string) {
                let owner = self.form_owner(id);
                let peers: Vec<NodeId> = self
                    .elements()
                    .into_iter()
                    .filter(|&other| {
                        other != id
                            && self.tag(other) == Some("input")
                            && self.input_type(other) == "radio"
                            && self.attr(other, "name") == Some(name.as_str())
                            && self.form_owner(other) == owner
                    })
                    .collect();
                for peer in peers {
                    if let Some(el) = self.element_mut(peer) {
                        el.dirty_checked = Some(false);
                    }
                }
            }
        }
        if let Some(el) = self.element_mut(id) {
            el.dirty_checked = Some(checked);
        }
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.has_attr(id, "disabled")
    }

    /// `isContentEditable`: explicit `contenteditable` wins, otherwise inherited.
    pub fn is_content_editable(&self, id: NodeId) -> bool {
        let mut node = Some(id);
        while let Some(current) = node {
            match self.attr(current, "contenteditable") {
                Some("" | "true" | "plaintext-only") => return true,
                Some("false") => return false,
                _ => node = self.parent_element(current),
            }
        }
        false
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            match &self.nodes[child.0].data {
                NodeData::Text(t) => out.push_str(t),
                NodeData::Element(_) => self.collect_text(child, out),
                NodeData::Document => {}
            }
        }
    }

    /// Replace all children with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        let old: Vec<NodeId> = self.children(id).to_vec();
        for child in old {
            self.nodes[child.0].parent = None;
        }
        self.nodes[id.0].children.clear();
        if !text.is_empty() {
            self.append_text(id, text);
        }
    }

    // ---- <select> helpers ----

    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|&o| self.tag(o) == Some("option"))
            .collect()
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => self
                .text_content(option)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn option_selected(&self, option: NodeId) -> bool {
        self.element(option)
            .map(|el| el.dirty_selected.unwrap_or_else(|| el.attr("selected").is_some()))
            .unwrap_or(false)
    }

    fn select_of(&self, option: NodeId) -> Option<NodeId> {
        let mut node = self.parent_element(option);
        while let Some(current) = node {
            if self.tag(current) == Some("select") {
                return Some(current);
            }
            node = self.parent_element(current);
        }
        None
    }

    /// Last selected option; the first option when selection was never touched.
    fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let options = self.options(select);
        if let Some(&last) = options.iter().rev().find(|&&o| self.option_selected(o)) {
            return Some(last);
        }
        let touched = options.iter().any(|&o| {
            self.element(o)
                .map(|el| el.dirty_selected.is_some())
                .unwrap_or(false)
        });
        if touched { None } else { options.first().copied() }
    }

    // =========================================================================
    // Forms
    // =========================================================================

    pub fn forms(&self) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|&id| self.tag(id) == Some("form"))
            .collect()
    }

    /// The form a control belongs to: `form="<id>"` first, then the nearest ancestor form.
    pub fn form_owner(&self, id: NodeId) -> Option<NodeId> {
        if let Some(form_id) = self.non_empty_attr(id, "form") {
            return self
                .elements()
                .into_iter()
                .find(|&f| self.tag(f) == Some("form") && self.attr(f, "id") == Some(form_id));
        }
        let mut node = self.parent_element(id);
        while let Some(current) = node {
            if self.tag(current) == Some("form") {
                return Some(current);
            }
            node = self.parent_element(current);
        }
        None
    }

    /// Listed controls owned by `form`, in tree order.
    pub fn form_controls(&self, form: NodeId) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|&id| {
                matches!(
                    self.tag(id),
                    Some("input" | "select" | "textarea" | "button")
                ) && self.form_owner(id) == Some(form)
            })
            .collect()
    }

    /// Native form serialization: the entry list a browser builds for `form`.
    pub fn form_data(&self, form: NodeId) -> Vec<(String, String)> {
        let mut entries = Vec::new();

        for id in self.form_controls(form) {
            if self.is_disabled(id) {
                continue;
            }
            let Some(name) = self.non_empty_attr(id, "name") else {
                continue;
            };
            if self.tag(id) == Some("button") {
                continue;
            }

            match self.input_type(id).as_str() {
                "submit" | "button" | "reset" | "image" | "file" => {}
                "checkbox" | "radio" => {
                    if self.checked(id) {
                        entries.push((name.to_string(), self.value(id)));
                    }
                }
                "select-one" => {
                    if let Some(option) = self.selected_option(id) {
                        entries.push((name.to_string(), self.option_value(option)));
                    }
                }
                "select-multiple" => {
                    for option in self.options(id) {
                        if self.option_selected(option) {
                            entries.push((name.to_string(), self.option_value(option)));
                        }
                    }
                }
                _ => entries.push((name.to_string(), self.value(id))),
            }
        }

        entries
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn dispatch(&mut self, target: NodeId, kind: EventKind, bubbles: bool) {
        self.events.push(DomEvent {
            target,
            kind,
            bubbles,
        });
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<DomEvent> {
        std::mem::take(&mut self.events)
    }
}
