use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Index of a node inside a [`Document`] arena. Stable for the page lifetime.
pub type NodeId = usize;

pub const CSRF_FIELD_NAME: &str = "csrfmiddlewaretoken";

/// Serializable element tree, used for page snapshots and for appending
/// new subtrees (toasts, containers) to a live document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub classes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

fn default_tag() -> String {
    "div".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    /// A named form input carrying `value`.
    pub fn input(name: &str, value: &str) -> Self {
        Self::new("input").with_attr("name", name).with_attr("value", value)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: BTreeSet<String>,
    pub data: BTreeMap<String, String>,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub disabled: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

impl Node {
    fn from_spec(spec: &ElementSpec, parent: Option<NodeId>, attached: bool) -> Self {
        Self {
            tag: spec.tag.clone(),
            id: spec.id.clone(),
            classes: spec.classes.clone(),
            data: spec.data.clone(),
            attrs: spec.attrs.clone(),
            text: spec.text.clone(),
            disabled: spec.disabled,
            parent,
            children: Vec::new(),
            attached,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Headless page document: an arena of nodes rooted at `body`.
///
/// Detached nodes stay in the arena so callers holding a [`NodeId`] can
/// still inspect them, but every query only walks attached nodes.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::from_spec(&ElementSpec::new("body"))
    }

    pub fn from_spec(body: &ElementSpec) -> Self {
        let mut doc = Self {
            nodes: vec![Node::from_spec(body, None, true)],
            body: 0,
        };
        for child in &body.children {
            doc.append(0, child);
        }
        doc
    }

    pub fn to_spec(&self) -> ElementSpec {
        self.spec_of(self.body)
    }

    fn spec_of(&self, id: NodeId) -> ElementSpec {
        let node = &self.nodes[id];
        ElementSpec {
            tag: node.tag.clone(),
            id: node.id.clone(),
            classes: node.classes.clone(),
            data: node.data.clone(),
            attrs: node.attrs.clone(),
            text: node.text.clone(),
            disabled: node.disabled,
            children: node.children.iter().map(|child| self.spec_of(*child)).collect(),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::is_attached)
    }

    /// Appends `spec` (and its subtree) as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, spec: &ElementSpec) -> NodeId {
        let attached = self.is_attached(parent);
        let id = self.nodes.len();
        self.nodes.push(Node::from_spec(spec, Some(parent), attached));
        if let Some(node) = self.node_mut(parent) {
            node.children.push(id);
        }
        for child in &spec.children {
            self.append(id, child);
        }
        id
    }

    /// Removes a node and its subtree from the page. Returns `false` when the
    /// node is unknown, already detached, or the body itself.
    pub fn detach(&mut self, id: NodeId) -> bool {
        if id == self.body || !self.is_attached(id) {
            return false;
        }
        if let Some(parent) = self.nodes[id].parent {
            self.nodes[parent].children.retain(|child| *child != id);
        }
        self.nodes[id].parent = None;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.nodes[current].attached = false;
            stack.extend(self.nodes[current].children.iter().copied());
        }
        true
    }

    /// Attached descendants of `root` in document order, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(node) = self.node(root) else {
            return out;
        };
        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current].children.iter().rev().copied());
        }
        out
    }

    fn attached_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(self.body).chain(self.descendants(self.body))
    }

    pub fn by_id(&self, html_id: &str) -> Option<NodeId> {
        self.attached_nodes()
            .find(|id| self.nodes[*id].id.as_deref() == Some(html_id))
    }

    pub fn by_class(&self, class: &str) -> Vec<NodeId> {
        self.attached_nodes()
            .filter(|id| self.nodes[*id].classes.contains(class))
            .collect()
    }

    pub fn by_name(&self, name: &str) -> Option<NodeId> {
        self.attached_nodes()
            .find(|id| self.nodes[*id].attrs.get("name").map(String::as_str) == Some(name))
    }

    /// First node, starting at `id` itself and walking up, carrying `class`.
    pub fn closest(&self, id: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            if node.classes.contains(class) {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    pub fn descendant_by_class(&self, root: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.nodes[*id].classes.contains(class))
    }

    /// Resolves `#id`, `.class` or `.class:N` (zero-based) to an attached node.
    pub fn select(&self, selector: &str) -> Option<NodeId> {
        if let Some(html_id) = selector.strip_prefix('#') {
            return self.by_id(html_id);
        }
        let class_part = selector.strip_prefix('.')?;
        let (class, index) = match class_part.split_once(':') {
            Some((class, index)) => (class, index.parse::<usize>().ok()?),
            None => (class_part, 0),
        };
        self.by_class(class).get(index).copied()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.node(id).is_some_and(|node| node.classes.contains(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        self.node_mut(id)
            .map(|node| node.classes.insert(class.to_string()))
            .unwrap_or(false)
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        self.node_mut(id)
            .map(|node| node.classes.remove(class))
            .unwrap_or(false)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|node| node.text.as_str())
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(node) = self.node_mut(id) {
            node.text = text.to_string();
        }
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.node(id)?.attrs.get(key).map(String::as_str)
    }

    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.attrs.insert(key.to_string(), value.to_string());
        }
    }

    pub fn data(&self, id: NodeId, key: &str) -> Option<&str> {
        self.node(id)?.data.get(key).map(String::as_str)
    }

    pub fn set_data(&mut self, id: NodeId, key: &str, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.data.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove_data(&mut self, id: NodeId, key: &str) {
        if let Some(node) = self.node_mut(id) {
            node.data.remove(key);
        }
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.disabled)
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        if let Some(node) = self.node_mut(id) {
            node.disabled = disabled;
        }
    }

    /// Named, enabled fields under `form` as `(name, value)` pairs, in
    /// document order. This is what a form submission encodes.
    pub fn form_fields(&self, form: NodeId) -> Vec<(String, String)> {
        self.descendants(form)
            .into_iter()
            .filter_map(|id| {
                let node = &self.nodes[id];
                if node.disabled {
                    return None;
                }
                let name = node.attrs.get("name")?;
                let value = node.attrs.get("value").cloned().unwrap_or_default();
                Some((name.clone(), value))
            })
            .collect()
    }

    pub fn field(&self, form: NodeId, name: &str) -> Option<&str> {
        self.descendants(form)
            .into_iter()
            .find(|id| self.nodes[*id].attrs.get("name").map(String::as_str) == Some(name))
            .and_then(|id| self.attr(id, "value"))
    }

    pub fn set_field(&mut self, form: NodeId, name: &str, value: &str) -> bool {
        let target = self
            .descendants(form)
            .into_iter()
            .find(|id| self.nodes[*id].attrs.get("name").map(String::as_str) == Some(name));
        match target {
            Some(id) => {
                self.set_attr(id, "value", value);
                true
            }
            None => false,
        }
    }

    /// Anti-forgery token from the hidden form field the server renders.
    pub fn csrf_token(&self) -> Option<String> {
        let id = self.by_name(CSRF_FIELD_NAME)?;
        self.attr(id, "value")
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}
