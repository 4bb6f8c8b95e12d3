use serde_json::json;
use sightline_common::protocol::StrategyKind;
use sightline_core::composer::LocatorComposer;
use sightline_core::config::EngineConfig;
use sightline_core::context::resolve_context;
use sightline_core::dom::{Document, DomTree, NodeId};
use sightline_core::protocol::ComposedLocators;

fn doc(value: serde_json::Value) -> Document {
    Document::from_json(&value.to_string()).unwrap()
}

fn find(doc: &Document, selector: &str) -> NodeId {
    doc.query(selector).unwrap().unwrap()
}

fn compose(doc: &Document, node: NodeId, is_dynamic: bool) -> ComposedLocators {
    let config = EngineConfig::default();
    let context = resolve_context(doc, node, &config);
    LocatorComposer::new(doc, &config).compose(node, context.as_ref(), is_dynamic)
}

fn pin_form() -> Document {
    doc(json!({"tag": "body", "children": [{"tag": "form", "children": [
        {"tag": "label", "children": [{"text": "PIN Code"}]},
        {"tag": "input", "attributes": {"name": "pincode", "placeholder": "PIN Code"}}
    ]}]}))
}

#[test]
fn test_label_beats_placeholder_and_css() {
    let doc = pin_form();
    let input = find(&doc, "input");
    let composed = compose(&doc, input, false);

    assert_eq!(composed.candidates[0].kind, StrategyKind::Label);
    assert_eq!(composed.candidates[0].score, 85);
    assert_eq!(composed.candidates[1].kind, StrategyKind::Placeholder);
    assert_eq!(composed.candidates[1].score, 80);
    assert_eq!(
        composed.playwright,
        "page.getByLabel('PIN Code').or(page.getByPlaceholder('PIN Code')).or(page.locator('input[name=\"pincode\"]'))"
    );
    assert_eq!(
        composed.selenium,
        "try:\n    element = driver.find_element(By.NAME, 'pincode')\nexcept NoSuchElementException:\n    element = driver.find_element(By.CSS_SELECTOR, 'input[name=\"pincode\"]')"
    );
}

fn buy_button() -> Document {
    doc(json!({"tag": "body", "children": [
        {"tag": "button", "attributes": {
            "id": "item-384920",
            "class": "buy-button",
            "data-testid": "buy"
        }, "children": [{"text": "Buy"}]}
    ]}))
}

#[test]
fn test_generated_id_ranks_low_and_dedups() {
    let doc = buy_button();
    let button = find(&doc, "button");
    let composed = compose(&doc, button, false);

    let ranked: Vec<(StrategyKind, u8)> = composed
        .candidates
        .iter()
        .map(|c| (c.kind, c.score))
        .collect();
    assert_eq!(
        ranked,
        vec![
            (StrategyKind::TestId, 100),
            (StrategyKind::Role, 90),
            (StrategyKind::Text, 60),
            (StrategyKind::Class, 40),
            (StrategyKind::Css, 30),
        ]
    );
    assert_eq!(
        composed.playwright,
        "page.getByTestId('buy').or(page.getByRole('button', { name: 'Buy' })).or(page.getByText('Buy', { exact: true }))"
    );
    assert!(composed.selenium.starts_with(
        "try:\n    element = driver.find_element(By.CSS_SELECTOR, '#item-384920')"
    ));
    assert!(composed.selenium.ends_with("driver.find_element(By.ID, 'item-384920')"));
}

#[test]
fn test_candidates_are_ranked_and_distinct() {
    let doc = buy_button();
    let composed = compose(&doc, find(&doc, "button"), false);

    for pair in composed.candidates.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    let mut texts: Vec<_> = composed.candidates.iter().map(|c| &c.text).collect();
    let total = texts.len();
    texts.sort();
    texts.dedup();
    assert_eq!(texts.len(), total);
}

#[test]
fn test_ancestor_scope_prefixes_candidates() {
    let doc = doc(json!({"tag": "body", "children": [
        {"tag": "section", "attributes": {"data-testid": "billing"}, "children": [
            {"tag": "div", "children": [{"tag": "button", "children": [{"text": "Pay"}]}]}
        ]},
        {"tag": "section", "attributes": {"data-testid": "shipping"}, "children": [
            {"tag": "div", "children": [{"tag": "button", "children": [{"text": "Pay"}]}]}
        ]}
    ]}));
    let button = find(&doc, "section[data-testid=\"billing\"] button");
    let composed = compose(&doc, button, false);

    assert!(
        composed
            .playwright
            .starts_with("page.getByTestId('billing').getByRole('button', { name: 'Pay' })"),
        "{}",
        composed.playwright
    );
    assert!(
        composed
            .candidates
            .iter()
            .all(|c| c.text.starts_with("page.getByTestId('billing')."))
    );
}

#[test]
fn test_aria_labelled_landmark_scopes_by_role() {
    let doc = doc(json!({"tag": "body", "children": [
        {"tag": "form", "attributes": {"aria-label": "Login"}, "children": [
            {"tag": "button", "children": [{"text": "Go"}]}
        ]}
    ]}));
    let composed = compose(&doc, find(&doc, "button"), false);
    assert!(
        composed
            .playwright
            .starts_with("page.getByRole('form', { name: 'Login' }).getByRole('button', { name: 'Go' })")
    );
}

#[test]
fn test_dynamic_nodes_get_waits() {
    let doc = pin_form();
    let input = find(&doc, "input");

    let dynamic = compose(&doc, input, true);
    assert!(
        dynamic
            .playwright
            .starts_with("await page.waitForSelector('input[name=\"pincode\"]', { state: 'visible', timeout: 5000 });\n")
    );
    assert!(dynamic.selenium.starts_with(
        "WebDriverWait(driver, 5).until(EC.visibility_of_element_located((By.NAME, 'pincode')))\n"
    ));

    let settled = compose(&doc, input, false);
    assert!(!settled.playwright.contains("waitForSelector"));
    assert!(!settled.selenium.contains("WebDriverWait"));
}

#[test]
fn test_single_selenium_locator_has_no_fallback() {
    let doc = doc(json!({"tag": "body", "children": [{"tag": "p"}, {"tag": "p"}]}));
    let p = doc.query_all("p").unwrap()[1];
    let composed = compose(&doc, p, false);

    assert_eq!(
        composed.selenium,
        "element = driver.find_element(By.CSS_SELECTOR, 'p:nth-of-type(2)')"
    );
    assert_eq!(composed.playwright, "page.locator('p:nth-of-type(2)')");
}

#[test]
fn test_quotes_in_values_are_escaped() {
    let doc = doc(json!({"tag": "body", "children": [
        {"tag": "button", "children": [{"text": "Don't stop"}]}
    ]}));
    let composed = compose(&doc, find(&doc, "button"), false);
    assert!(
        composed
            .playwright
            .starts_with(r"page.getByRole('button', { name: 'Don\'t stop' })")
    );
}

#[test]
fn test_long_text_is_not_a_candidate() {
    let long = "word ".repeat(30);
    let doc = doc(json!({"tag": "body", "children": [
        {"tag": "p", "children": [{"text": long}]}
    ]}));
    let composed = compose(&doc, find(&doc, "p"), false);
    assert!(composed.candidates.iter().all(|c| c.kind != StrategyKind::Text));
}
