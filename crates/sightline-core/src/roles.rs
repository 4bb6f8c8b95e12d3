//! Accessibility role inference.
//!
//! Roles come from an explicit `role` attribute, or else from the first
//! matching entry of [`ROLE_RULES`].

use crate::context::associated_label;
use crate::dom::{DomTree, NodeId};

/// What the `type` attribute must look like for a rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRequirement {
    Any,
    OneOf(&'static [&'static str]),
}

/// A (tag, type) pattern mapped to an implicit role.
#[derive(Debug, Clone, Copy)]
pub struct RoleRule {
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub input_type: TypeRequirement,
    /// Attribute that must be present, such as `href` on anchors.
    pub requires: Option<&'static str>,
    pub role: &'static str,
}

pub const BUTTON_INPUT_TYPES: &[&str] = &["button", "submit", "reset", "image"];

/// Evaluated top to bottom; the first match wins.
pub const ROLE_RULES: &[RoleRule] = &[
    RoleRule {
        name: "button_element",
        tags: &["button"],
        input_type: TypeRequirement::Any,
        requires: None,
        role: "button",
    },
    RoleRule {
        name: "button_input",
        tags: &["input"],
        input_type: TypeRequirement::OneOf(BUTTON_INPUT_TYPES),
        requires: None,
        role: "button",
    },
    RoleRule {
        name: "checkbox_input",
        tags: &["input"],
        input_type: TypeRequirement::OneOf(&["checkbox"]),
        requires: None,
        role: "checkbox",
    },
    RoleRule {
        name: "radio_input",
        tags: &["input"],
        input_type: TypeRequirement::OneOf(&["radio"]),
        requires: None,
        role: "radio",
    },
    RoleRule {
        name: "anchor_with_href",
        tags: &["a"],
        input_type: TypeRequirement::Any,
        requires: Some("href"),
        role: "link",
    },
    RoleRule {
        name: "select_element",
        tags: &["select"],
        input_type: TypeRequirement::Any,
        requires: None,
        role: "combobox",
    },
    RoleRule {
        name: "textarea_element",
        tags: &["textarea"],
        input_type: TypeRequirement::Any,
        requires: None,
        role: "textbox",
    },
    RoleRule {
        name: "other_input",
        tags: &["input"],
        input_type: TypeRequirement::Any,
        requires: None,
        role: "textbox",
    },
    RoleRule {
        name: "heading",
        tags: &["h1", "h2", "h3", "h4", "h5", "h6"],
        input_type: TypeRequirement::Any,
        requires: None,
        role: "heading",
    },
];

impl RoleRule {
    pub fn matches(&self, tag: &str, input_type: Option<&str>, has_attr: impl Fn(&str) -> bool) -> bool {
        if !self.tags.contains(&tag) {
            return false;
        }
        if let Some(attr) = self.requires
            && !has_attr(attr)
        {
            return false;
        }
        match self.input_type {
            TypeRequirement::Any => true,
            TypeRequirement::OneOf(types) => input_type
                .is_some_and(|t| types.iter().any(|allowed| t.eq_ignore_ascii_case(allowed))),
        }
    }
}

/// The rule that assigns `node` its implicit role, if any.
pub fn matching_rule<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> Option<&'static RoleRule> {
    let tag = dom.tag_name(node);
    let input_type = dom.attribute(node, "type");
    ROLE_RULES
        .iter()
        .find(|rule| rule.matches(tag, input_type, |attr| dom.attribute(node, attr).is_some()))
}

/// Explicit `role` attribute (first token), else the implicit role.
pub fn infer_role<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
    if let Some(role) = dom
        .attribute(node, "role")
        .and_then(|r| r.split_whitespace().next())
    {
        return Some(role.to_ascii_lowercase());
    }
    matching_rule(dom, node).map(|rule| rule.role.to_string())
}

pub fn is_button_input<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> bool {
    dom.tag_name(node) == "input"
        && dom
            .attribute(node, "type")
            .is_some_and(|t| BUTTON_INPUT_TYPES.iter().any(|b| t.eq_ignore_ascii_case(b)))
}

/// Form controls whose own text content is never their name.
pub fn is_form_control(tag: &str) -> bool {
    matches!(tag, "input" | "select" | "textarea")
}

/// Best-effort accessible name.
///
/// Checked in order: `aria-label`, an associated `<label>`, visible text,
/// the `value` of button-like inputs, `alt`, `title`.
pub fn accessible_name<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
    let non_empty = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(name) = non_empty(dom.attribute(node, "aria-label")) {
        return Some(name);
    }
    if let Some(label) = associated_label(dom, node) {
        return Some(label);
    }
    if !is_form_control(dom.tag_name(node)) {
        let text = dom.visible_text(node);
        if !text.is_empty() {
            return Some(text);
        }
    }
    if is_button_input(dom, node)
        && let Some(value) = non_empty(dom.attribute(node, "value"))
    {
        return Some(value);
    }
    non_empty(dom.attribute(node, "alt")).or_else(|| non_empty(dom.attribute(node, "title")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_for(tag: &str, input_type: Option<&str>, href: bool) -> Option<&'static str> {
        ROLE_RULES
            .iter()
            .find(|r| r.matches(tag, input_type, |a| href && a == "href"))
            .map(|r| r.role)
    }

    #[test]
    fn test_rule_table_order() {
        assert_eq!(rule_for("button", None, false), Some("button"));
        assert_eq!(rule_for("input", Some("SUBMIT"), false), Some("button"));
        assert_eq!(rule_for("input", Some("image"), false), Some("button"));
        assert_eq!(rule_for("input", Some("checkbox"), false), Some("checkbox"));
        assert_eq!(rule_for("input", Some("radio"), false), Some("radio"));
        assert_eq!(rule_for("input", Some("email"), false), Some("textbox"));
        assert_eq!(rule_for("input", None, false), Some("textbox"));
        assert_eq!(rule_for("a", None, true), Some("link"));
        assert_eq!(rule_for("a", None, false), None);
        assert_eq!(rule_for("select", None, false), Some("combobox"));
        assert_eq!(rule_for("textarea", None, false), Some("textbox"));
        assert_eq!(rule_for("h3", None, false), Some("heading"));
        assert_eq!(rule_for("div", None, false), None);
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names: Vec<_> = ROLE_RULES.iter().map(|r| r.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ROLE_RULES.len());
    }
}
