use crate::composer::LocatorComposer;
use crate::config::EngineConfig;
use crate::context::resolve_context;
use crate::dom::{DomTree, NodeId};
use crate::synthesis::{synthesize_path, synthesize_selector};
use crate::tracker::MutationTracker;
use sightline_common::protocol::SelectionRecord;

/// Everything reported for one selected node.
pub fn build_record<D: DomTree + ?Sized>(
    dom: &D,
    node: NodeId,
    tracker: &MutationTracker,
    now_ms: u64,
    config: &EngineConfig,
) -> SelectionRecord {
    let synthesis = synthesize_selector(dom, node, &config.synthesis);
    let is_dynamic = tracker.is_dynamic(dom, node, now_ms);
    let context = resolve_context(dom, node, config);
    let composed = LocatorComposer::new(dom, config).compose_with_selector(
        node,
        &synthesis.selector,
        context.as_ref(),
        is_dynamic,
    );

    SelectionRecord {
        structural_selector: synthesis.selector,
        selector_unique: synthesis.unique,
        path_locator: synthesize_path(dom, node),
        display_name: display_name(dom, node),
        html_snapshot: truncate_chars(&dom.outer_html(node), config.record.max_snapshot_chars),
        attributes: dom.attributes(node),
        is_dynamic,
        playwright: composed.playwright,
        selenium: composed.selenium,
        candidates: composed.candidates,
    }
}

/// `tag#id.first.second`
pub fn display_name<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> String {
    let mut name = dom.tag_name(node).to_string();
    if let Some(id) = dom.id(node) {
        name.push('#');
        name.push_str(id);
    }
    for class in dom.class_list(node).into_iter().take(2) {
        name.push('.');
        name.push_str(class);
    }
    name
}

pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &value[..index]),
        None => value.to_string(),
    }
}
