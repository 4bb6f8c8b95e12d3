use serde_json::json;
use sightline_core::config::EngineConfig;
use sightline_core::context::{AncestorQualifier, SemanticContext, relative_label, resolve_context};
use sightline_core::dom::{Document, NodeId};
use sightline_core::roles::{accessible_name, infer_role};

fn doc(value: serde_json::Value) -> Document {
    Document::from_json(&value.to_string()).unwrap()
}

fn find(doc: &Document, selector: &str) -> NodeId {
    doc.query(selector).unwrap().unwrap()
}

#[test]
fn test_adjacent_label_is_relative_context() {
    let doc = doc(json!({"tag": "form", "children": [
        {"tag": "label", "children": [{"text": "  PIN\n Code "}]},
        {"tag": "input", "attributes": {"name": "pincode"}}
    ]}));
    let input = find(&doc, "input");

    assert_eq!(relative_label(&doc, input).as_deref(), Some("PIN Code"));
    assert_eq!(
        resolve_context(&doc, input, &EngineConfig::default()),
        Some(SemanticContext::Label {
            text: "PIN Code".into()
        })
    );
}

#[test]
fn test_for_attribute_and_nested_labels() {
    let doc = doc(json!({"tag": "form", "children": [
        {"tag": "label", "attributes": {"for": "email"}, "children": [{"text": "Email"}]},
        {"tag": "div", "children": [{"tag": "input", "attributes": {"id": "email"}}]},
        {"tag": "label", "children": [
            {"text": "Remember me"},
            {"tag": "input", "attributes": {"type": "checkbox"}}
        ]}
    ]}));
    let email = find(&doc, "#email");
    let checkbox = find(&doc, "input[type=\"checkbox\"]");

    assert_eq!(relative_label(&doc, email).as_deref(), Some("Email"));
    assert_eq!(relative_label(&doc, checkbox).as_deref(), Some("Remember me"));
    assert_eq!(accessible_name(&doc, checkbox).as_deref(), Some("Remember me"));
    assert_eq!(infer_role(&doc, checkbox).as_deref(), Some("checkbox"));
}

#[test]
fn test_label_wins_over_ancestor() {
    let doc = doc(json!({"tag": "section", "attributes": {"data-testid": "profile"}, "children": [
        {"tag": "label", "children": [{"text": "Name"}]},
        {"tag": "input"}
    ]}));
    let input = find(&doc, "input");
    assert!(matches!(
        resolve_context(&doc, input, &EngineConfig::default()),
        Some(SemanticContext::Label { .. })
    ));
}

#[test]
fn test_non_controls_have_no_relative_label() {
    let doc = doc(json!({"tag": "div", "children": [
        {"tag": "label", "children": [{"text": "Caption"}]},
        {"tag": "span", "children": [{"text": "value"}]}
    ]}));
    let span = find(&doc, "span");
    assert_eq!(relative_label(&doc, span), None);
    assert_eq!(resolve_context(&doc, span, &EngineConfig::default()), None);
}

#[test]
fn test_nearest_landmark_ancestor() {
    let doc = doc(json!({"tag": "main", "children": [
        {"tag": "table", "children": [{"tag": "tr", "children": [
            {"tag": "td", "children": [{"tag": "a", "attributes": {"href": "/x"}, "children": [{"text": "Edit"}]}]}
        ]}]}
    ]}));
    let link = find(&doc, "a");
    assert_eq!(
        resolve_context(&doc, link, &EngineConfig::default()),
        Some(SemanticContext::Ancestor(AncestorQualifier::Tag {
            tag: "tr".into(),
            aria_label: None
        }))
    );
}

#[test]
fn test_ancestor_test_id_beats_role() {
    let doc = doc(json!({"tag": "body", "children": [
        {"tag": "article", "attributes": {"data-cy": "post-1", "aria-label": "First"}, "children": [
            {"tag": "button", "children": [{"text": "Like"}]}
        ]}
    ]}));
    let button = find(&doc, "button");
    assert_eq!(
        resolve_context(&doc, button, &EngineConfig::default()),
        Some(SemanticContext::Ancestor(AncestorQualifier::TestId {
            attribute: "data-cy".into(),
            value: "post-1".into()
        }))
    );
}

#[test]
fn test_explicit_role_with_aria_label() {
    let doc = doc(json!({"tag": "body", "children": [
        {"tag": "div", "attributes": {"role": "dialog", "aria-label": "Confirm"}, "children": [
            {"tag": "button", "children": [{"text": "OK"}]}
        ]}
    ]}));
    let button = find(&doc, "button");
    let context = resolve_context(&doc, button, &EngineConfig::default());
    assert_eq!(
        context,
        Some(SemanticContext::Ancestor(AncestorQualifier::Role {
            role: "dialog".into(),
            name: "Confirm".into()
        }))
    );
}

#[test]
fn test_explicit_role_is_case_folded() {
    let doc = doc(json!({"tag": "body", "children": [
        {"tag": "div", "attributes": {"role": "Navigation Menu", "aria-label": "Main"}, "children": [
            {"tag": "a", "children": [{"text": "Home"}]}
        ]}
    ]}));
    let link = find(&doc, "a");
    assert_eq!(
        resolve_context(&doc, link, &EngineConfig::default()),
        Some(SemanticContext::Ancestor(AncestorQualifier::Role {
            role: "navigation".into(),
            name: "Main".into()
        }))
    );
}

#[test]
fn test_ancestor_search_is_bounded() {
    let doc = doc(json!({"tag": "form", "children": [{"tag": "div", "children": [
        {"tag": "div", "children": [{"tag": "div", "children": [
            {"tag": "div", "children": [{"tag": "span", "children": [{"text": "deep"}]}]}
        ]}]}
    ]}]}));
    let span = find(&doc, "span");
    let mut config = EngineConfig::default();
    assert_eq!(resolve_context(&doc, span, &config), None);

    config.context.max_ancestor_depth = 5;
    assert!(matches!(
        resolve_context(&doc, span, &config),
        Some(SemanticContext::Ancestor(AncestorQualifier::Tag { ref tag, .. })) if tag == "form"
    ));
}

#[test]
fn test_qualifier_display() {
    let by_tag = AncestorQualifier::Tag {
        tag: "nav".into(),
        aria_label: Some("Primary".into()),
    };
    assert_eq!(by_tag.to_string(), "nav[aria-label=\"Primary\"]");
    let by_id = AncestorQualifier::TestId {
        attribute: "data-qa".into(),
        value: "cart".into(),
    };
    assert_eq!(by_id.to_string(), "[data-qa=\"cart\"]");
}
