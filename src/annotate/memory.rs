//! MemoryTree - arena-backed document tree
//!
//! A small DOM stand-in: elements with a tag and class list, text nodes, and
//! parent/child links. Used by the native test suites and by hosts that
//! annotate documents outside a browser.

use serde::{Deserialize, Serialize};

use super::config::DEFAULT_MARKER_CLASS;
use super::tree::{Badge, DocumentTree, BADGE_CLASS, REDUNDANT_CLASS};
use crate::pricing::PriceError;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element { tag: String, classes: Vec<String> },
    Text(String),
}

#[derive(Debug, Clone)]
struct MemNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory document rooted at a `body` element
#[derive(Debug, Clone)]
pub struct MemoryTree {
    nodes: Vec<MemNode>,
    root: NodeId,
    marker_class: String,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_CLASS)
    }
}

impl MemoryTree {
    pub fn new(marker_class: &str) -> Self {
        let body = MemNode {
            kind: NodeKind::Element {
                tag: "body".to_string(),
                classes: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            root: NodeId(0),
            marker_class: marker_class.to_string(),
        }
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(MemNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append an element under `parent`
    pub fn element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.push(
            parent,
            NodeKind::Element {
                tag: tag.to_string(),
                classes: Vec::new(),
            },
        )
    }

    /// Append a text node under `parent`
    pub fn text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeKind::Text(text.to_string()))
    }

    /// Append an element holding a single text node
    pub fn element_with_text(&mut self, parent: NodeId, tag: &str, text: &str) -> NodeId {
        let element = self.element(parent, tag);
        self.text(element, text);
        element
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let NodeKind::Element { classes, .. } = &mut self.nodes[node.0].kind {
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        match &self.nodes[node.0].kind {
            NodeKind::Element { classes, .. } => classes,
            NodeKind::Text(_) => &[],
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Replace the text of a text node
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let NodeKind::Text(content) = &mut self.nodes[node.0].kind {
            *content = text.to_string();
        }
    }

    /// Remove a node (and its subtree) from its parent
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Attached marker-bearing nodes in document order
    pub fn marked_nodes(&self) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|&id| self.has_marker(&id))
            .collect()
    }

    /// Detach every badge, as page scripts re-rendering content would.
    /// Returns how many were removed.
    pub fn remove_markers(&mut self) -> usize {
        let marked = self.marked_nodes();
        for &node in &marked {
            self.detach(node);
        }
        marked.len()
    }

    /// Texts of all attached badges in document order
    pub fn badge_texts(&self) -> Vec<String> {
        self.marked_nodes()
            .into_iter()
            .map(|id| self.text_content(&id))
            .collect()
    }

    /// Attached nodes in document order, root first
    fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }
}

impl DocumentTree for MemoryTree {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn text_content(&self, node: &NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![*node];
        while let Some(id) = stack.pop() {
            let entry = &self.nodes[id.0];
            match &entry.kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element { .. } => stack.extend(entry.children.iter().rev().copied()),
            }
        }
        out
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let index = siblings.iter().position(|c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn is_element(&self, node: &NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Element { .. })
    }

    fn is_text(&self, node: &NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Text(_))
    }

    fn is_attached(&self, node: &NodeId) -> bool {
        let mut current = *node;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn has_marker(&self, node: &NodeId) -> bool {
        self.classes(*node).iter().any(|c| *c == self.marker_class)
    }

    fn count_marked_nodes(&self) -> usize {
        self.marked_nodes().len()
    }

    fn insert_annotation(&mut self, reference: &NodeId, badge: &Badge) -> Result<NodeId, PriceError> {
        let parent = self.nodes[reference.0]
            .parent
            .ok_or_else(|| PriceError::Host("reference node has no parent".to_string()))?;

        let mut classes = vec![self.marker_class.clone(), BADGE_CLASS.to_string()];
        if badge.redundant {
            classes.push(REDUNDANT_CLASS.to_string());
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(MemNode {
            kind: NodeKind::Element {
                tag: "div".to_string(),
                classes,
            },
            parent: Some(parent),
            children: Vec::new(),
        });
        self.text(id, &badge.text);

        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings
            .iter()
            .position(|c| c == reference)
            .map(|i| i + 1)
            .unwrap_or(siblings.len());
        siblings.insert(index, id);

        Ok(id)
    }
}
