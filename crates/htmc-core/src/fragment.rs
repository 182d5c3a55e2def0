//! Owned, cloneable markup trees.
//!
//! A [`Fragment`] is what the HTML parser produces and what a compiled template
//! instantiates into. It is detached from any [`Dom`](crate::Dom); inserting it
//! into a document copies its nodes into the arena.

use crate::html;
use indexmap::IndexMap;

/// An ordered list of top-level nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragment {
    pub nodes: Vec<FragmentNode>,
}

/// A node in a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FragmentNode {
    Element(FragmentElement),
    Text(String),
    Comment(String),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentElement {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<FragmentNode>,
}

impl FragmentElement {
    /// Create an element without attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add a child node.
    pub fn with_child(mut self, child: FragmentNode) -> Self {
        self.children.push(child);
        self
    }

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

impl From<FragmentElement> for FragmentNode {
    fn from(element: FragmentElement) -> Self {
        FragmentNode::Element(element)
    }
}

impl Fragment {
    pub fn new(nodes: Vec<FragmentNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.nodes, &mut out);
        out
    }

    /// Serialize the fragment back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_nodes(&self.nodes, None, &mut out);
        out
    }

    /// Remove every element with the given tag (at any depth), in document order.
    pub fn take_elements(&mut self, tag: &str) -> Vec<FragmentElement> {
        let mut taken = Vec::new();
        take_from(&mut self.nodes, tag, &mut taken);
        taken
    }

    /// All elements with the given tag, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<&FragmentElement> {
        let mut found = Vec::new();
        find_in(&self.nodes, tag, &mut found);
        found
    }
}

fn collect_text(nodes: &[FragmentNode], out: &mut String) {
    for node in nodes {
        match node {
            FragmentNode::Text(text) => out.push_str(text),
            FragmentNode::Element(element) => collect_text(&element.children, out),
            FragmentNode::Comment(_) => {}
        }
    }
}

fn write_nodes(nodes: &[FragmentNode], parent_tag: Option<&str>, out: &mut String) {
    let raw = parent_tag.is_some_and(html::is_raw_text);
    for node in nodes {
        match node {
            FragmentNode::Text(text) if raw => out.push_str(text),
            FragmentNode::Text(text) => html::escape_text(text, out),
            FragmentNode::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            FragmentNode::Element(element) => {
                html::write_start_tag(
                    &element.tag,
                    element.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                    out,
                );
                write_nodes(&element.children, Some(&element.tag), out);
                html::write_end_tag(&element.tag, out);
            }
        }
    }
}

fn take_from(nodes: &mut Vec<FragmentNode>, tag: &str, taken: &mut Vec<FragmentElement>) {
    let mut kept = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            FragmentNode::Element(element) if element.tag == tag => taken.push(element),
            FragmentNode::Element(mut element) => {
                take_from(&mut element.children, tag, taken);
                kept.push(FragmentNode::Element(element));
            }
            other => kept.push(other),
        }
    }
    *nodes = kept;
}

fn find_in<'a>(nodes: &'a [FragmentNode], tag: &str, found: &mut Vec<&'a FragmentElement>) {
    for node in nodes {
        if let FragmentNode::Element(element) = node {
            if element.tag == tag {
                found.push(element);
            }
            find_in(&element.children, tag, found);
        }
    }
}
