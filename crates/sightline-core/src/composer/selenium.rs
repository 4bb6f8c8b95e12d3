use super::escape::quote;
use super::{SELENIUM_ATTEMPTS, seconds};
use crate::config::ComposerConfig;
use crate::dom::{DomTree, NodeId};
use crate::scoring::score;
use crate::synthesis::css_string;
use sightline_common::protocol::StrategyKind;

/// Selenium `By` strategies the composer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum By {
    Id,
    Name,
    CssSelector,
}

impl By {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "By.ID",
            Self::Name => "By.NAME",
            Self::CssSelector => "By.CSS_SELECTOR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeleniumLocator {
    pub by: By,
    pub value: String,
    pub kind: StrategyKind,
    pub score: u8,
}

impl SeleniumLocator {
    fn new(by: By, kind: StrategyKind, value: &str) -> Self {
        Self {
            by,
            value: value.to_string(),
            kind,
            score: score(kind, value),
        }
    }

    /// `(By.X, 'value')`
    pub fn tuple(&self) -> String {
        format!("({}, {})", self.by.as_str(), quote(&self.value))
    }

    pub fn find_element(&self) -> String {
        format!(
            "driver.find_element({}, {})",
            self.by.as_str(),
            quote(&self.value)
        )
    }
}

/// Grammar B locators, ranked. Id and name locators only appear when they
/// resolve to `node` alone; the structural selector is always last resort.
pub fn candidates<D: DomTree + ?Sized>(dom: &D, node: NodeId, selector: &str) -> Vec<SeleniumLocator> {
    let mut out = Vec::new();

    if let Some(id) = dom.id(node)
        && (dom.matches_uniquely(&format!("#{}", id), node)
            || dom.matches_uniquely(&format!("[id={}]", css_string(id)), node))
    {
        out.push(SeleniumLocator::new(By::Id, StrategyKind::Id, id));
    }

    if let Some(name) = dom.attribute(node, "name").filter(|n| !n.is_empty()) {
        let test = format!("{}[name={}]", dom.tag_name(node), css_string(name));
        if dom.matches_uniquely(&test, node) {
            out.push(SeleniumLocator::new(By::Name, StrategyKind::Name, name));
        }
    }

    // A synthesized `#id` selector ranks as css, above a penalized By.ID.
    out.push(SeleniumLocator::new(
        By::CssSelector,
        StrategyKind::Css,
        selector,
    ));

    out.sort_by(|a, b| b.score.cmp(&a.score));
    out.dedup_by(|a, b| a.find_element() == b.find_element());
    out
}

/// Primary locator with a single fallback, behind a visibility wait when dynamic.
pub fn render(ranked: &[SeleniumLocator], is_dynamic: bool, config: &ComposerConfig) -> String {
    let attempts: Vec<_> = ranked.iter().take(SELENIUM_ATTEMPTS).collect();
    let Some(primary) = attempts.first() else {
        return String::new();
    };

    let mut lines = Vec::new();
    if is_dynamic {
        lines.push(format!(
            "WebDriverWait(driver, {}).until(EC.visibility_of_element_located({}))",
            seconds(config.wait_timeout_ms),
            primary.tuple()
        ));
    }

    match attempts.get(1) {
        Some(fallback) => {
            lines.push("try:".to_string());
            lines.push(format!("    element = {}", primary.find_element()));
            lines.push("except NoSuchElementException:".to_string());
            lines.push(format!("    element = {}", fallback.find_element()));
        }
        None => lines.push(format!("element = {}", primary.find_element())),
    }
    lines.join("\n")
}
