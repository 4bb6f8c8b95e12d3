use super::escape::quote;
use super::PLAYWRIGHT_ALTERNATIVES;
use crate::config::{ComposerConfig, EngineConfig};
use crate::context::{AncestorQualifier, SemanticContext, associated_label};
use crate::dom::{DomTree, NodeId};
use crate::roles::{accessible_name, infer_role, is_form_control};
use crate::scoring::score;
use crate::synthesis::css_string;
use sightline_common::protocol::{Candidate, StrategyKind};

const DEFAULT_TEST_ID: &str = "data-testid";

/// Grammar A candidates in discovery order.
pub fn candidates<D: DomTree + ?Sized>(
    dom: &D,
    node: NodeId,
    selector: &str,
    context: Option<&SemanticContext>,
    config: &EngineConfig,
) -> Vec<Candidate> {
    let scope = match context {
        Some(SemanticContext::Ancestor(qualifier)) => scope_expression(qualifier),
        _ => "page".to_string(),
    };
    let mut out = Vec::new();
    let mut push = |kind: StrategyKind, value: &str, expression: String| {
        out.push(Candidate::new(
            kind,
            format!("{}.{}", scope, expression),
            score(kind, value),
        ));
    };

    if let Some((attr, value)) = test_id(dom, node, &config.composer.test_id_attributes) {
        push(StrategyKind::TestId, value, test_id_query(attr, value));
    }

    if let Some(role) = infer_role(dom, node)
        && let Some(name) = accessible_name(dom, node)
    {
        push(
            StrategyKind::Role,
            &role,
            format!("getByRole({}, {{ name: {} }})", quote(&role), quote(&name)),
        );
    }

    let label = match context {
        Some(SemanticContext::Label { text }) => Some(text.clone()),
        _ => associated_label(dom, node),
    };
    if let Some(label) = label {
        push(
            StrategyKind::Label,
            &label,
            format!("getByLabel({})", quote(&label)),
        );
    }

    if let Some(placeholder) = dom
        .attribute(node, "placeholder")
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        push(
            StrategyKind::Placeholder,
            placeholder,
            format!("getByPlaceholder({})", quote(placeholder)),
        );
    }

    if dom.child_element_count(node) == 0 && !is_form_control(dom.tag_name(node)) {
        let text = dom.visible_text(node);
        if !text.is_empty() && text.chars().count() <= config.composer.max_text_length {
            push(
                StrategyKind::Text,
                &text,
                format!("getByText({}, {{ exact: true }})", quote(&text)),
            );
        }
    }

    if let Some(id) = dom.id(node) {
        let css = format!("#{}", id);
        if dom.matches_uniquely(&css, node) {
            push(StrategyKind::Id, id, format!("locator({})", quote(&css)));
        }
    }

    if let Some(class_css) = unique_class_selector(dom, node) {
        push(
            StrategyKind::Class,
            &class_css,
            format!("locator({})", quote(&class_css)),
        );
    }

    push(
        StrategyKind::Css,
        selector,
        format!("locator({})", quote(selector)),
    );
    out
}

/// Top alternatives as one `.or()` chain, behind a visibility wait when dynamic.
pub fn render(
    ranked: &[Candidate],
    selector: &str,
    is_dynamic: bool,
    config: &ComposerConfig,
) -> String {
    let mut alternatives = ranked.iter().take(PLAYWRIGHT_ALTERNATIVES);
    let mut chain = match alternatives.next() {
        Some(first) => first.text.clone(),
        None => format!("page.locator({})", quote(selector)),
    };
    for alternative in alternatives {
        chain.push_str(&format!(".or({})", alternative.text));
    }

    if is_dynamic {
        format!("{}\n{}", wait_instruction(selector, config), chain)
    } else {
        chain
    }
}

pub fn wait_instruction(selector: &str, config: &ComposerConfig) -> String {
    format!(
        "await page.waitForSelector({}, {{ state: 'visible', timeout: {} }});",
        quote(selector),
        config.wait_timeout_ms
    )
}

/// Scoping expression for an ancestor container.
pub fn scope_expression(qualifier: &AncestorQualifier) -> String {
    match qualifier {
        AncestorQualifier::TestId { attribute, value } => {
            format!("page.{}", test_id_query(attribute, value))
        }
        AncestorQualifier::Role { role, name } => {
            format!("page.getByRole({}, {{ name: {} }})", quote(role), quote(name))
        }
        AncestorQualifier::Tag { .. } => {
            format!("page.locator({})", quote(&qualifier.to_string()))
        }
    }
}

fn test_id_query(attribute: &str, value: &str) -> String {
    if attribute == DEFAULT_TEST_ID {
        format!("getByTestId({})", quote(value))
    } else {
        format!(
            "locator({})",
            quote(&format!("[{}={}]", attribute, css_string(value)))
        )
    }
}

fn test_id<'a, D: DomTree + ?Sized>(
    dom: &'a D,
    node: NodeId,
    attributes: &'a [String],
) -> Option<(&'a str, &'a str)> {
    attributes.iter().find_map(|attr| {
        dom.attribute(node, attr)
            .filter(|v| !v.is_empty())
            .map(|v| (attr.as_str(), v))
    })
}

/// A single class token, or the full combination, that matches only `node`.
fn unique_class_selector<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> Option<String> {
    let classes = dom.class_list(node);
    if let Some(class) = classes
        .iter()
        .map(|c| format!(".{}", c))
        .find(|css| dom.matches_uniquely(css, node))
    {
        return Some(class);
    }
    if classes.len() > 1 {
        let combined: String = classes.iter().map(|c| format!(".{}", c)).collect();
        if dom.matches_uniquely(&combined, node) {
            return Some(combined);
        }
    }
    None
}
