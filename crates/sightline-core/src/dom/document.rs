use super::selector::SelectorList;
use super::{DomTree, NodeId, SelectorError, collapse_whitespace};
use sightline_common::protocol::{AttributeMap, ElementSnapshot, NodeSnapshot};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Document root must be an element")]
    TextRoot,
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("Node {0:?} is not attached to the document")]
    Detached(NodeId),
    #[error("The root element cannot be removed")]
    RootRemoval,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const HIDDEN_TEXT_ELEMENTS: &[&str] = &["script", "style", "template"];

#[derive(Debug, Clone)]
enum NodeData {
    Element { tag: String, attributes: AttributeMap },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<usize>,
    children: Vec<usize>,
    data: NodeData,
}

/// Arena-backed document built from a [`NodeSnapshot`] tree.
///
/// Removed nodes stay in the arena with no parent, so their handles remain
/// valid but `is_connected` reports false.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: usize,
}

impl Document {
    pub fn from_snapshot(root: &ElementSnapshot) -> Self {
        let mut doc = Document {
            nodes: Vec::new(),
            root: 0,
        };
        doc.root = doc.build_element(root, None);
        doc
    }

    pub fn from_json(input: &str) -> Result<Self, DocumentError> {
        let snapshot: NodeSnapshot = serde_json::from_str(input)?;
        Self::from_node_snapshot(snapshot)
    }

    pub fn from_yaml(input: &str) -> Result<Self, DocumentError> {
        let snapshot: NodeSnapshot = serde_yaml::from_str(input)?;
        Self::from_node_snapshot(snapshot)
    }

    /// Load a `.yaml`/`.yml` or JSON snapshot file.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    fn from_node_snapshot(snapshot: NodeSnapshot) -> Result<Self, DocumentError> {
        match snapshot {
            NodeSnapshot::Element(root) => Ok(Self::from_snapshot(&root)),
            NodeSnapshot::Text { .. } => Err(DocumentError::TextRoot),
        }
    }

    /// Attach `snapshot` as the last child of `parent`. Returns the new subtree root.
    pub fn append(
        &mut self,
        parent: NodeId,
        snapshot: &ElementSnapshot,
    ) -> Result<NodeId, DocumentError> {
        self.check(parent)?;
        if !self.is_connected(parent) {
            return Err(DocumentError::Detached(parent));
        }
        let index = self.build_element(snapshot, Some(parent.0));
        self.nodes[parent.0].children.push(index);
        Ok(NodeId(index))
    }

    /// Detach `node` from its parent. Returns every element in the detached subtree.
    pub fn remove(&mut self, node: NodeId) -> Result<Vec<NodeId>, DocumentError> {
        self.check(node)?;
        if node.0 == self.root {
            return Err(DocumentError::RootRemoval);
        }
        let Some(parent) = self.nodes[node.0].parent else {
            return Err(DocumentError::Detached(node));
        };

        self.nodes[parent].children.retain(|&c| c != node.0);
        self.nodes[node.0].parent = None;

        let mut removed = Vec::new();
        let mut stack = vec![node.0];
        while let Some(index) = stack.pop() {
            if self.is_element(index) {
                removed.push(NodeId(index));
                stack.extend(self.nodes[index].children.iter().rev());
            }
        }
        Ok(removed)
    }

    /// Parse `selector` and return the first match.
    pub fn query(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check(&self, node: NodeId) -> Result<(), DocumentError> {
        if self.is_element(node.0) {
            Ok(())
        } else {
            Err(DocumentError::UnknownNode(node))
        }
    }

    fn is_element(&self, index: usize) -> bool {
        matches!(
            self.nodes.get(index).map(|n| &n.data),
            Some(NodeData::Element { .. })
        )
    }

    fn build_element(&mut self, snapshot: &ElementSnapshot, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data: NodeData::Element {
                tag: snapshot.tag.to_ascii_lowercase(),
                attributes: snapshot.attributes.clone(),
            },
        });

        for child in &snapshot.children {
            let child_index = match child {
                NodeSnapshot::Element(element) => self.build_element(element, Some(index)),
                NodeSnapshot::Text { text } => {
                    let text_index = self.nodes.len();
                    self.nodes.push(Node {
                        parent: Some(index),
                        children: Vec::new(),
                        data: NodeData::Text(text.clone()),
                    });
                    text_index
                }
            };
            self.nodes[index].children.push(child_index);
        }
        index
    }

    fn element_siblings(&self, node: NodeId) -> (&[usize], usize) {
        let Some(parent) = self.nodes[node.0].parent else {
            return (&[], 0);
        };
        let siblings = &self.nodes[parent].children;
        let position = siblings.iter().position(|&c| c == node.0).unwrap_or(0);
        (siblings, position)
    }

    fn collect_text(&self, index: usize, skip_hidden: bool, out: &mut String) {
        match &self.nodes[index].data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { tag, .. } => {
                if skip_hidden && HIDDEN_TEXT_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for &child in &self.nodes[index].children {
                    self.collect_text(child, skip_hidden, out);
                }
            }
        }
    }

    fn write_html(&self, index: usize, out: &mut String) {
        match &self.nodes[index].data {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes.iter() {
                    out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for &child in &self.nodes[index].children {
                    self.write_html(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }
}

impl DomTree for Document {
    fn root(&self) -> NodeId {
        NodeId(self.root)
    }

    fn tag_name(&self, node: NodeId) -> &str {
        match self.nodes.get(node.0).map(|n| &n.data) {
            Some(NodeData::Element { tag, .. }) => tag,
            _ => "",
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { attributes, .. } => attributes.get(name),
            NodeData::Text(_) => None,
        }
    }

    fn attributes(&self, node: NodeId) -> AttributeMap {
        match self.nodes.get(node.0).map(|n| &n.data) {
            Some(NodeData::Element { attributes, .. }) => attributes.clone(),
            _ => AttributeMap::new(),
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent.map(NodeId)
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?;
        let (siblings, position) = self.element_siblings(node);
        siblings[..position]
            .iter()
            .rev()
            .find(|&&s| self.is_element(s))
            .map(|&s| NodeId(s))
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?;
        let (siblings, position) = self.element_siblings(node);
        siblings
            .iter()
            .skip(position + 1)
            .find(|&&s| self.is_element(s))
            .map(|&s| NodeId(s))
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| {
                n.children
                    .iter()
                    .filter(|&&c| self.is_element(c))
                    .map(|&c| NodeId(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if node.0 < self.nodes.len() {
            self.collect_text(node.0, false, &mut out);
        }
        out
    }

    fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        if node.0 < self.nodes.len() {
            self.write_html(node.0, &mut out);
        }
        out
    }

    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        Ok(SelectorList::parse(selector)?.select_all(self))
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node.0;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn visible_text(&self, node: NodeId) -> String {
        let mut out = String::new();
        if node.0 < self.nodes.len() {
            self.collect_text(node.0, true, &mut out);
        }
        collapse_whitespace(&out)
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
