use crate::dom::{DomTree, NodeId};

/// Absolute path locator for `node`.
///
/// Nodes with an id get `//*[@id="..."]`. Everything else gets a root-to-node
/// path where each step carries `[k]` only when same-tag siblings precede it.
pub fn synthesize_path<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> String {
    if let Some(id) = dom.id(node) {
        return format!("//*[@id={}]", xpath_literal(id));
    }

    let mut steps = Vec::new();
    let mut current = Some(node);
    while let Some(level) = current {
        steps.push(path_step(dom, level));
        current = dom.parent(level);
    }
    steps.reverse();
    format!("/{}", steps.join("/"))
}

fn path_step<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> String {
    let tag = dom.tag_name(node);
    let mut preceding = 0;
    let mut current = dom.previous_sibling(node);
    while let Some(sibling) = current {
        if dom.tag_name(sibling) == tag {
            preceding += 1;
        }
        current = dom.previous_sibling(sibling);
    }
    if preceding == 0 {
        tag.to_string()
    } else {
        format!("{}[{}]", tag, preceding + 1)
    }
}

/// Quote `value` for an XPath expression. XPath has no escapes, so a value
/// holding both quote kinds is split into `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{}\"", value)
    } else if !value.contains('\'') {
        format!("'{}'", value)
    } else {
        let parts: Vec<String> = value
            .split('"')
            .map(|part| format!("\"{}\"", part))
            .collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

/// Resolve a path produced by [`synthesize_path`] back to a node.
///
/// Unindexed steps take the first same-tag child.
pub fn resolve_path<D: DomTree + ?Sized>(dom: &D, path: &str) -> Option<NodeId> {
    if let Some(id) = crate::scoring::xpath_id(path) {
        return dom
            .elements()
            .into_iter()
            .find(|&n| dom.attribute(n, "id") == Some(id));
    }

    let mut steps = path.strip_prefix('/')?.split('/');
    let root = dom.root();
    let (tag, index) = parse_step(steps.next()?)?;
    if dom.tag_name(root) != tag || index != 1 {
        return None;
    }

    let mut current = root;
    for step in steps {
        let (tag, index) = parse_step(step)?;
        current = dom
            .children(current)
            .into_iter()
            .filter(|&c| dom.tag_name(c) == tag)
            .nth(index - 1)?;
    }
    Some(current)
}

fn parse_step(step: &str) -> Option<(&str, usize)> {
    match step.split_once('[') {
        Some((tag, rest)) => {
            let index: usize = rest.strip_suffix(']')?.parse().ok()?;
            (index > 0).then_some((tag, index))
        }
        None => Some((step, 1)),
    }
}
