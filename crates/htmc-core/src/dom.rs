//! Arena-backed document tree.
//!
//! Nodes live in a single `Vec` and are addressed by [`NodeId`]. Removing a node
//! only detaches it; ids stay valid for the lifetime of the [`Dom`]. Shadow
//! roots hang off their host element and are not part of its child list.
//!
//! Methods taking a [`NodeId`] panic on an id from another [`Dom`]; callers
//! holding foreign ids check [`Dom::contains`] first.

use crate::fragment::{Fragment, FragmentNode};
use crate::html;
use indexmap::IndexMap;

/// Handle to a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Encapsulation mode of a shadow root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    ShadowRoot { host: NodeId, mode: ShadowRootMode },
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// Tag name and attributes of an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shadow_root: Option<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            shadow_root: None,
        }
    }
}

/// A document: `#document > html > (head, body)`.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create an empty document.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: vec![Node::new(NodeData::Document)],
            document: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
        };
        let html = dom.create_element("html");
        let head = dom.create_element("head");
        let body = dom.create_element("body");
        dom.append_child(dom.document, html);
        dom.append_child(html, head);
        dom.append_child(html, body);
        dom.head = head;
        dom.body = body;
        dom
    }

    /// Whether `id` addresses a node of this document.
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.into(),
            attributes: IndexMap::new(),
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id).data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Whether the node is reachable from the document, crossing shadow boundaries.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.document {
                return true;
            }
            current = match (&self.node(current).data, self.node(current).parent) {
                (_, Some(parent)) => parent,
                (NodeData::ShadowRoot { host, .. }, None) => *host,
                _ => return false,
            };
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    pub fn attributes(&self, id: NodeId) -> Option<&IndexMap<String, String>> {
        self.element(id).map(|e| &e.attributes)
    }

    /// Set an attribute, returning the previous value. No-op on non-elements.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        let element = self.element_mut(id)?;
        element.attributes.insert(name.into(), value.into())
    }

    /// Remove an attribute, returning the previous value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let element = self.element_mut(id)?;
        element.attributes.shift_remove(name)
    }

    // ------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------

    /// Detach a node from its parent.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.remove(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Insert `child` before `reference`, or append when `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.remove(child);
        let children = &self.node(parent).children;
        match children.iter().position(|&c| c == reference) {
            Some(index) => {
                self.node_mut(parent).children.insert(index, child);
                self.node_mut(child).parent = Some(parent);
            }
            None => self.append_child(parent, child),
        }
    }

    /// Put `replacement` where `old` is and detach `old`.
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) {
        if let Some(parent) = self.node(old).parent {
            self.insert_before(parent, replacement, old);
            self.remove(old);
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.node_mut(id).children) {
            self.node_mut(child).parent = None;
        }
    }

    /// Concatenated text of descendant text nodes, not crossing shadow roots.
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.node(id).data {
            NodeData::Text(text) | NodeData::Comment(text) => text.clone(),
            _ => {
                let mut out = String::new();
                for d in self.descendants(id) {
                    if let NodeData::Text(text) = &self.node(d).data {
                        out.push_str(text);
                    }
                }
                out
            }
        }
    }

    // ------------------------------------------------------------------
    // Shadow roots and slots
    // ------------------------------------------------------------------

    /// Attach a shadow root to `host`. A host keeps its first shadow root.
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> NodeId {
        if let Some(existing) = self.node(host).shadow_root {
            return existing;
        }
        let root = self.push(NodeData::ShadowRoot { host, mode });
        self.node_mut(host).shadow_root = Some(root);
        root
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.node(host).shadow_root
    }

    pub fn shadow_host(&self, root: NodeId) -> Option<NodeId> {
        match self.node(root).data {
            NodeData::ShadowRoot { host, .. } => Some(host),
            _ => None,
        }
    }

    /// The root of the tree containing `id` (a shadow root, the document, or a detached node).
    pub fn root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    /// Light-DOM nodes of the host projected into `slot`.
    ///
    /// A named slot takes the host's children whose `slot` attribute matches;
    /// the unnamed slot takes every child without a `slot` attribute.
    pub fn assigned_nodes(&self, slot: NodeId) -> Vec<NodeId> {
        let Some(host) = self.shadow_host(self.root(slot)) else {
            return Vec::new();
        };
        let name = self.get_attribute(slot, "name").filter(|n| !n.is_empty());
        self.children(host)
            .iter()
            .copied()
            .filter(|&child| match &self.node(child).data {
                NodeData::Element(e) => e.attributes.get("slot").map(String::as_str) == name,
                NodeData::Text(_) => name.is_none(),
                _ => false,
            })
            .collect()
    }

    /// Text as a reader would see it: shadow trees replace their host's
    /// children, slots show their assigned nodes (or their fallback), and
    /// `<style>`/`<script>` contents are skipped.
    pub fn rendered_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_rendered_text(id, &mut out);
        out
    }

    fn collect_rendered_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(_) => {}
            NodeData::Element(e) if e.tag == "style" || e.tag == "script" => {}
            NodeData::Element(e) if e.tag == "slot" && self.shadow_host(self.root(id)).is_some() => {
                let assigned = self.assigned_nodes(id);
                let shown = if assigned.is_empty() {
                    self.children(id)
                } else {
                    &assigned[..]
                };
                for &child in shown {
                    self.collect_rendered_text(child, out);
                }
            }
            _ => {
                let children = match self.node(id).shadow_root {
                    Some(root) => self.children(root),
                    None => self.children(id),
                };
                for &child in children {
                    self.collect_rendered_text(child, out);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Descendants of `id` in document order, excluding `id`, not entering shadow roots.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// `id` and its descendants in document order, entering shadow roots
    /// right after their host.
    pub fn shadow_including_inclusive_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
            if let Some(root) = self.node(current).shadow_root {
                stack.push(root);
            }
        }
        out
    }

    /// Descendant elements of `id` with the given tag, in document order.
    pub fn elements_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&d| self.tag(d) == Some(tag))
            .collect()
    }

    /// First descendant element matching `predicate`.
    pub fn find_element(
        &self,
        id: NodeId,
        predicate: impl Fn(&ElementData) -> bool,
    ) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .find(|&d| self.element(d).is_some_and(&predicate))
    }

    // ------------------------------------------------------------------
    // Fragments and serialization
    // ------------------------------------------------------------------

    /// Copy a fragment's nodes under `parent`, returning the new top-level nodes.
    pub fn append_fragment(&mut self, parent: NodeId, fragment: &Fragment) -> Vec<NodeId> {
        fragment
            .nodes
            .iter()
            .map(|node| {
                let id = self.build(node);
                self.append_child(parent, id);
                id
            })
            .collect()
    }

    fn build(&mut self, node: &FragmentNode) -> NodeId {
        match node {
            FragmentNode::Text(text) => self.create_text(text.clone()),
            FragmentNode::Comment(text) => self.create_comment(text.clone()),
            FragmentNode::Element(element) => {
                let id = self.push(NodeData::Element(ElementData {
                    tag: element.tag.clone(),
                    attributes: element.attributes.clone(),
                }));
                for child in &element.children {
                    let child = self.build(child);
                    self.append_child(id, child);
                }
                id
            }
        }
    }

    /// Serialized children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw = self.tag(id).is_some_and(html::is_raw_text);
        for &child in self.children(id) {
            self.write_node(child, raw, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, raw: bool, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(text) if raw => out.push_str(text),
            NodeData::Text(text) => html::escape_text(text, out),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Element(e) => {
                html::write_start_tag(
                    &e.tag,
                    e.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                    out,
                );
                out.push_str(&self.inner_html(id));
                html::write_end_tag(&e.tag, out);
            }
            NodeData::Document | NodeData::ShadowRoot { .. } => out.push_str(&self.inner_html(id)),
        }
    }
}
