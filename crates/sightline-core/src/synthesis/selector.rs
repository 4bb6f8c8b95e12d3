use crate::config::SynthesisConfig;
use crate::dom::selector::type_position;
use crate::dom::{DomTree, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Which step of the search produced a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorStrategy {
    Id,
    Class,
    ClassCombination,
    Attribute,
    Path,
}

impl fmt::Display for SelectorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id => "id",
            Self::Class => "class",
            Self::ClassCombination => "class_combination",
            Self::Attribute => "attribute",
            Self::Path => "path",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSynthesis {
    pub selector: String,
    pub strategy: SelectorStrategy,
    /// False when the depth bound ran out first. The selector is then the
    /// longest path built and may match other nodes too.
    pub unique: bool,
}

/// Build a selector that matches exactly `node`, or the best effort within
/// `config.max_depth` ancestor levels.
pub fn synthesize_selector<D: DomTree + ?Sized>(
    dom: &D,
    node: NodeId,
    config: &SynthesisConfig,
) -> SelectorSynthesis {
    let found = |selector: String, strategy: SelectorStrategy| SelectorSynthesis {
        selector,
        strategy,
        unique: true,
    };

    if let Some(id) = dom.id(node) {
        let candidate = format!("#{}", id);
        if verify(dom, &candidate, node) {
            return found(candidate, SelectorStrategy::Id);
        }
    }

    let classes = dom.class_list(node);
    for class in &classes {
        let candidate = format!(".{}", class);
        if verify(dom, &candidate, node) {
            return found(candidate, SelectorStrategy::Class);
        }
    }
    if classes.len() > 1 {
        let candidate: String = classes.iter().map(|c| format!(".{}", c)).collect();
        if verify(dom, &candidate, node) {
            return found(candidate, SelectorStrategy::ClassCombination);
        }
    }

    let tag = dom.tag_name(node);
    for attr in &config.attribute_allow_list {
        if let Some(value) = dom.attribute(node, attr) {
            let candidate = format!("{}[{}={}]", tag, attr, css_string(value));
            if verify(dom, &candidate, node) {
                return found(candidate, SelectorStrategy::Attribute);
            }
        }
    }

    let mut segments: Vec<String> = Vec::new();
    let mut current = Some(node);
    let mut selector = String::new();
    while let Some(level) = current {
        if segments.len() >= config.max_depth.max(1) {
            break;
        }
        segments.insert(0, path_segment(dom, level));
        selector = segments.join(" > ");
        if verify(dom, &selector, node) {
            return found(selector, SelectorStrategy::Path);
        }
        current = dom.parent(level);
    }

    warn!(
        selector = %selector,
        depth = segments.len(),
        "No unique selector within depth bound"
    );
    SelectorSynthesis {
        selector,
        strategy: SelectorStrategy::Path,
        unique: false,
    }
}

fn verify<D: DomTree + ?Sized>(dom: &D, candidate: &str, node: NodeId) -> bool {
    let unique = dom.matches_uniquely(candidate, node);
    debug!(candidate, unique, "Tried selector");
    unique
}

/// `tag`, or `tag:nth-of-type(k)` when a same-tag sibling exists.
pub fn path_segment<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> String {
    let tag = dom.tag_name(node);
    let position = type_position(dom, node);
    if position > 1 || has_same_tag_sibling(dom, node) {
        format!("{}:nth-of-type({})", tag, position)
    } else {
        tag.to_string()
    }
}

fn has_same_tag_sibling<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> bool {
    let tag = dom.tag_name(node);
    let mut current = dom.next_sibling(node);
    while let Some(sibling) = current {
        if dom.tag_name(sibling) == tag {
            return true;
        }
        current = dom.next_sibling(sibling);
    }
    let mut current = dom.previous_sibling(node);
    while let Some(sibling) = current {
        if dom.tag_name(sibling) == tag {
            return true;
        }
        current = dom.previous_sibling(sibling);
    }
    false
}

/// Double-quoted CSS string literal.
pub fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
