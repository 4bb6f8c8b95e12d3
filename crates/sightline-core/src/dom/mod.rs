//! Host tree abstraction.
//!
//! Everything the engine knows about a document goes through [`DomTree`]. The
//! in-memory [`Document`] implements it for the CLI and for tests; a browser
//! host would implement it over its live tree.

pub mod document;
pub mod selector;

pub use document::{Document, DocumentError};
pub use selector::{SelectorError, SelectorList};

use sightline_common::protocol::AttributeMap;
use tracing::debug;

/// Stable handle to an element in a host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Read access to a host document.
///
/// Node handles passed in must belong to this tree. Sibling and child
/// navigation only ever yields element nodes.
pub trait DomTree {
    /// The document's root element.
    fn root(&self) -> NodeId;

    /// Lower-case tag name.
    fn tag_name(&self, node: NodeId) -> &str;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// All attributes in document order.
    fn attributes(&self, node: NodeId) -> AttributeMap;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn child_element_count(&self, node: NodeId) -> usize {
        self.children(node).len()
    }

    /// Concatenated text of every descendant text node.
    fn text_content(&self, node: NodeId) -> String;

    /// Serialized markup of the node and its subtree.
    fn outer_html(&self, node: NodeId) -> String;

    /// Every connected element matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError>;

    /// Whether the node is still reachable from the root.
    fn is_connected(&self, node: NodeId) -> bool;

    fn id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id").filter(|id| !id.is_empty())
    }

    fn class_list(&self, node: NodeId) -> Vec<&str> {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Up to `depth` ancestors, nearest first.
    fn ancestors(&self, node: NodeId, depth: usize) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if out.len() >= depth {
                break;
            }
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// Text content with whitespace runs collapsed to single spaces.
    fn visible_text(&self, node: NodeId) -> String {
        collapse_whitespace(&self.text_content(node))
    }

    /// Every connected element in document order.
    fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = self.children(node);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Uniqueness oracle: `selector` matches exactly one node and it is `target`.
    ///
    /// A malformed selector is never unique.
    fn matches_uniquely(&self, selector: &str, target: NodeId) -> bool {
        match self.query_all(selector) {
            Ok(matches) => matches.len() == 1 && matches[0] == target,
            Err(e) => {
                debug!(selector, error = %e, "Rejected selector");
                false
            }
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
