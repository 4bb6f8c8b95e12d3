//! Generated pages: every selector reported unique must resolve to its node alone.

use sightline_common::protocol::ElementSnapshot;
use sightline_core::config::SynthesisConfig;
use sightline_core::dom::{Document, DomTree};
use sightline_core::synthesis::{resolve_path, synthesize_path, synthesize_selector};

const TAGS: &[&str] = &["div", "span", "p", "a", "li", "section", "button", "input"];
const CLASSES: &[&str] = &["card", "row", "btn", "active", "item", "x-1"];

/// xorshift64, enough to vary page shapes deterministically.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next() % 100 < percent
    }
}

fn element(rng: &mut Rng, depth: usize) -> ElementSnapshot {
    let mut el = ElementSnapshot::new(TAGS[rng.below(TAGS.len())]);
    if rng.chance(15) {
        el = el.attr("id", &format!("n{}", rng.below(40)));
    }
    if rng.chance(40) {
        let first = CLASSES[rng.below(CLASSES.len())];
        let second = CLASSES[rng.below(CLASSES.len())];
        el = el.attr("class", &format!("{} {}", first, second));
    }
    if rng.chance(10) {
        el = el.attr("name", &format!("field{}", rng.below(5)));
    }
    if depth > 0 {
        for _ in 0..rng.below(4) {
            el = el.child(element(rng, depth - 1));
        }
    }
    el
}

fn page(seed: u64) -> Document {
    let mut rng = Rng(seed);
    let mut body = ElementSnapshot::new("body");
    for _ in 0..3 + rng.below(4) {
        body = body.child(element(&mut rng, 3));
    }
    Document::from_snapshot(&body)
}

#[test]
fn test_unique_selectors_resolve_to_their_node() {
    let config = SynthesisConfig::default();
    let mut total = 0;
    let mut unique = 0;

    for seed in 1..=40u64 {
        let doc = page(seed * 7919);
        for node in doc.elements() {
            let result = synthesize_selector(&doc, node, &config);
            total += 1;
            if result.unique {
                unique += 1;
                assert_eq!(
                    doc.query_all(&result.selector).unwrap(),
                    vec![node],
                    "seed {} selector {}",
                    seed,
                    result.selector
                );
            } else {
                assert!(!result.selector.is_empty());
            }
        }
    }

    assert!(total > 0);
    assert!(
        unique * 100 >= total * 95,
        "only {} of {} selectors unique",
        unique,
        total
    );
}

#[test]
fn test_path_locators_resolve_back() {
    for seed in 1..=20u64 {
        let doc = page(seed * 104_729);
        for node in doc.elements() {
            let path = synthesize_path(&doc, node);
            // Duplicate ids make the id form ambiguous; positional paths never are.
            if path.starts_with("//*") {
                continue;
            }
            assert_eq!(resolve_path(&doc, &path), Some(node), "seed {} path {}", seed, path);
        }
    }
}
