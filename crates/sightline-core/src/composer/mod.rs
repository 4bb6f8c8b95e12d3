//! Locator composition for the two target grammars.
//!
//! Grammar A (Playwright) chains its best alternatives with `.or()`. Grammar B
//! (Selenium, Python) has no alternation, so its best two locators become a
//! try/except pair.

pub mod escape;
pub mod playwright;
pub mod selenium;

use crate::config::EngineConfig;
use crate::context::SemanticContext;
use crate::dom::{DomTree, NodeId};
use crate::synthesis::synthesize_selector;
use sightline_common::protocol::{Candidate, ComposedLocators};
use tracing::debug;

/// Alternatives joined with `.or()` in grammar A.
pub const PLAYWRIGHT_ALTERNATIVES: usize = 3;
/// Locator attempts in grammar B.
pub const SELENIUM_ATTEMPTS: usize = 2;

pub struct LocatorComposer<'a, D: DomTree + ?Sized> {
    dom: &'a D,
    config: &'a EngineConfig,
}

impl<'a, D: DomTree + ?Sized> LocatorComposer<'a, D> {
    pub fn new(dom: &'a D, config: &'a EngineConfig) -> Self {
        Self { dom, config }
    }

    pub fn compose(
        &self,
        node: NodeId,
        context: Option<&SemanticContext>,
        is_dynamic: bool,
    ) -> ComposedLocators {
        let synthesis = synthesize_selector(self.dom, node, &self.config.synthesis);
        self.compose_with_selector(node, &synthesis.selector, context, is_dynamic)
    }

    /// Compose around an already synthesized structural selector.
    pub fn compose_with_selector(
        &self,
        node: NodeId,
        selector: &str,
        context: Option<&SemanticContext>,
        is_dynamic: bool,
    ) -> ComposedLocators {
        let candidates = rank(playwright::candidates(
            self.dom,
            node,
            selector,
            context,
            self.config,
        ));
        for candidate in &candidates {
            debug!(kind = %candidate.kind, score = candidate.score, text = %candidate.text, "Ranked candidate");
        }
        let playwright = playwright::render(&candidates, selector, is_dynamic, &self.config.composer);

        let locators = selenium::candidates(self.dom, node, selector);
        let selenium = selenium::render(&locators, is_dynamic, &self.config.composer);

        ComposedLocators {
            playwright,
            selenium,
            candidates,
        }
    }
}

/// Highest score first, discovery order on ties, duplicates removed.
pub fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    let mut seen = Vec::new();
    candidates.retain(|c| {
        if seen.contains(&c.text) {
            false
        } else {
            seen.push(c.text.clone());
            true
        }
    });
    candidates
}

/// Seconds for a millisecond timeout, without a fraction when whole.
pub(crate) fn seconds(ms: u64) -> String {
    if ms % 1000 == 0 {
        (ms / 1000).to_string()
    } else {
        (ms as f64 / 1000.0).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_common::protocol::StrategyKind;

    #[test]
    fn test_rank_is_stable_and_distinct() {
        let ranked = rank(vec![
            Candidate::new(StrategyKind::Text, "a", 60),
            Candidate::new(StrategyKind::Label, "b", 85),
            Candidate::new(StrategyKind::Name, "c", 60),
            Candidate::new(StrategyKind::Css, "b", 30),
        ]);
        let texts: Vec<_> = ranked.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "a", "c"]);
        assert_eq!(ranked[0].kind, StrategyKind::Label);
    }

    #[test]
    fn test_seconds() {
        assert_eq!(seconds(5000), "5");
        assert_eq!(seconds(2500), "2.5");
    }
}
