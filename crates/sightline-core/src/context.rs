//! Semantic context discovery.
//!
//! Two probes run per selection. The relative-label probe looks for a label
//! attached to a form control; the ancestor probe looks for a nearby landmark
//! container. A label result wins over an ancestor result.

use crate::config::EngineConfig;
use crate::dom::{DomTree, NodeId};
use crate::roles::is_form_control;
use crate::synthesis::css_string;
use std::fmt;
use tracing::debug;

/// How an ancestor container is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AncestorQualifier {
    TestId { attribute: String, value: String },
    Role { role: String, name: String },
    /// Bare tag, narrowed by `aria-label` when the container has one but no role.
    Tag {
        tag: String,
        aria_label: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticContext {
    Label { text: String },
    Ancestor(AncestorQualifier),
}

impl fmt::Display for AncestorQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TestId { attribute, value } => write!(f, "[{}={}]", attribute, css_string(value)),
            Self::Role { role, name } => write!(f, "role={}[name={}]", role, css_string(name)),
            Self::Tag { tag, aria_label } => match aria_label {
                Some(label) => write!(f, "{}[aria-label={}]", tag, css_string(label)),
                None => f.write_str(tag),
            },
        }
    }
}

/// Implicit role of a landmark container.
pub fn landmark_role(tag: &str) -> Option<&'static str> {
    match tag {
        "form" => Some("form"),
        "main" => Some("main"),
        "section" => Some("region"),
        "article" => Some("article"),
        "tr" => Some("row"),
        "nav" => Some("navigation"),
        "aside" => Some("complementary"),
        "header" => Some("banner"),
        "footer" => Some("contentinfo"),
        "table" => Some("table"),
        _ => None,
    }
}

pub fn resolve_context<D: DomTree + ?Sized>(
    dom: &D,
    node: NodeId,
    config: &EngineConfig,
) -> Option<SemanticContext> {
    if let Some(text) = relative_label(dom, node) {
        debug!(label = %text, "Resolved label context");
        return Some(SemanticContext::Label { text });
    }

    let qualifier = ancestor_qualifier(dom, node, config)?;
    debug!(container = %qualifier, "Resolved ancestor context");
    Some(SemanticContext::Ancestor(qualifier))
}

/// Label text for a form control: the immediately preceding `<label>`
/// sibling, else any label associated by `for` or by nesting.
pub fn relative_label<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
    if !is_form_control(dom.tag_name(node)) {
        return None;
    }
    if let Some(previous) = dom.previous_sibling(node)
        && dom.tag_name(previous) == "label"
    {
        let text = dom.visible_text(previous);
        if !text.is_empty() {
            return Some(text);
        }
    }
    associated_label(dom, node)
}

/// Text of a `<label>` bound to `node` by `for`, or one that wraps it.
pub fn associated_label<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
    if let Some(id) = dom.id(node) {
        let selector = format!("label[for={}]", css_string(id));
        let labels = dom.query_all(&selector).unwrap_or_default();
        if let Some(text) = labels
            .into_iter()
            .map(|label| dom.visible_text(label))
            .find(|text| !text.is_empty())
        {
            return Some(text);
        }
    }

    // Nested labels also contain the control's own text, so only text-free
    // controls qualify.
    if matches!(dom.tag_name(node), "input" | "textarea")
        && let Some(label) = dom
            .ancestors(node, usize::MAX)
            .into_iter()
            .find(|&a| dom.tag_name(a) == "label")
    {
        let text = dom.visible_text(label);
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

fn ancestor_qualifier<D: DomTree + ?Sized>(
    dom: &D,
    node: NodeId,
    config: &EngineConfig,
) -> Option<AncestorQualifier> {
    let test_ids = &config.composer.test_id_attributes;
    let landmarks = &config.context.landmark_tags;

    for ancestor in dom.ancestors(node, config.context.max_ancestor_depth) {
        let tag = dom.tag_name(ancestor);
        let test_id = test_ids.iter().find_map(|attr| {
            dom.attribute(ancestor, attr)
                .filter(|v| !v.is_empty())
                .map(|v| (attr.clone(), v.to_string()))
        });
        let aria_label = dom
            .attribute(ancestor, "aria-label")
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let is_landmark = landmarks.iter().any(|l| l == tag);

        if !is_landmark && test_id.is_none() && aria_label.is_none() {
            continue;
        }

        if let Some((attribute, value)) = test_id {
            return Some(AncestorQualifier::TestId { attribute, value });
        }

        let role = dom
            .attribute(ancestor, "role")
            .and_then(|r| r.split_whitespace().next())
            .map(str::to_ascii_lowercase)
            .or_else(|| landmark_role(tag).map(str::to_string));

        return Some(match (role, aria_label) {
            (Some(role), Some(name)) => AncestorQualifier::Role {
                role,
                name: name.to_string(),
            },
            (_, aria_label) => AncestorQualifier::Tag {
                tag: tag.to_string(),
                aria_label: aria_label.map(str::to_string),
            },
        });
    }
    None
}
