//! DomTree - `DocumentTree` over the live browser DOM

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Node};

use crate::annotate::tree::{Badge, DocumentTree, BADGE_CLASS, REDUNDANT_CLASS};
use crate::pricing::PriceError;

/// The page's `document.body` plus the marker class badges carry
#[derive(Debug, Clone)]
pub struct DomTree {
    document: Document,
    body: HtmlElement,
    marker_class: String,
}

impl DomTree {
    pub fn new(document: Document, body: HtmlElement, marker_class: &str) -> Self {
        Self {
            document,
            body,
            marker_class: marker_class.to_string(),
        }
    }

    /// Tree over the current window's document body
    pub fn from_window(marker_class: &str) -> Result<Self, PriceError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| PriceError::Host("no document available".to_string()))?;
        let body = document
            .body()
            .ok_or_else(|| PriceError::Host("document has no body".to_string()))?;
        Ok(Self::new(document, body, marker_class))
    }

    pub fn body(&self) -> &HtmlElement {
        &self.body
    }
}

fn host_error(err: JsValue) -> PriceError {
    PriceError::Host(format!("{:?}", err))
}

impl DocumentTree for DomTree {
    type Node = Node;

    fn root(&self) -> Node {
        let node: &Node = self.body.as_ref();
        node.clone()
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.get(i)).collect()
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn next_sibling(&self, node: &Node) -> Option<Node> {
        node.next_sibling()
    }

    fn is_element(&self, node: &Node) -> bool {
        node.node_type() == Node::ELEMENT_NODE
    }

    fn is_text(&self, node: &Node) -> bool {
        node.node_type() == Node::TEXT_NODE
    }

    fn is_attached(&self, node: &Node) -> bool {
        node.is_connected()
    }

    fn has_marker(&self, node: &Node) -> bool {
        node.dyn_ref::<Element>()
            .map_or(false, |element| element.class_list().contains(&self.marker_class))
    }

    fn count_marked_nodes(&self) -> usize {
        self.body.get_elements_by_class_name(&self.marker_class).length() as usize
    }

    fn insert_annotation(&mut self, reference: &Node, badge: &Badge) -> Result<Node, PriceError> {
        let parent = reference
            .parent_node()
            .ok_or_else(|| PriceError::Host("reference node has no parent".to_string()))?;

        let marker = self.document.create_element("div").map_err(host_error)?;
        let classes = marker.class_list();
        classes.add_1(&self.marker_class).map_err(host_error)?;
        classes.add_1(BADGE_CLASS).map_err(host_error)?;
        if badge.redundant {
            classes.add_1(REDUNDANT_CLASS).map_err(host_error)?;
        }
        marker.set_text_content(Some(&badge.text));

        let next = reference.next_sibling();
        parent.insert_before(&marker, next.as_ref()).map_err(host_error)
    }
}
