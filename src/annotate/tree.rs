//! Document tree collaborator interface
//!
//! The engine never owns the document. It reads and mutates it through this
//! trait, implemented by the DOM adapter in the browser and by `MemoryTree`
//! everywhere else.

use serde::{Deserialize, Serialize};

use crate::pricing::{PriceError, UnitPrice};

/// Class added to every badge alongside the marker
pub const BADGE_CLASS: &str = "chip";
/// Class added to badges whose conversion was a no-op
pub const REDUNDANT_CLASS: &str = "low-opacity";

/// Content of an annotation node
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Badge {
    /// Rendered text, e.g. `" ($6.65/lb)"`
    pub text: String,
    /// Conversion was a no-op; a styling hint only
    pub redundant: bool,
}

impl Badge {
    pub fn for_price(price: &UnitPrice) -> Self {
        Self {
            text: price.badge_text(),
            redundant: price.is_redundant(),
        }
    }
}

/// Host document capabilities the engine depends on
pub trait DocumentTree {
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// Root that scans enumerate below (`document.body` in a browser)
    fn root(&self) -> Self::Node;

    /// Concatenated text of the node and all its descendants
    fn text_content(&self, node: &Self::Node) -> String;

    /// Child nodes in document order, text and element alike
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    fn is_element(&self, node: &Self::Node) -> bool;

    fn is_text(&self, node: &Self::Node) -> bool;

    /// Still reachable from the document root
    fn is_attached(&self, node: &Self::Node) -> bool;

    /// Node itself carries the marker (no subtree search)
    fn has_marker(&self, node: &Self::Node) -> bool;

    /// Marker-bearing nodes currently in the document
    fn count_marked_nodes(&self) -> usize;

    /// Create a marker-bearing node holding the badge and insert it as the
    /// next sibling of `reference`. Returns the new node.
    fn insert_annotation(&mut self, reference: &Self::Node, badge: &Badge) -> Result<Self::Node, PriceError>;
}
