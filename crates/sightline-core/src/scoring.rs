//! Resilience scores for locator strategies.
//!
//! Scores are fixed per strategy kind, except that identifiers carrying a run
//! of four or more digits are treated as generated and heavily penalized.

use regex::Regex;
use sightline_common::protocol::StrategyKind;
use std::sync::LazyLock;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4,}").unwrap());

pub const GENERATED_SCORE: u8 = 10;

/// True when `value` contains four or more consecutive digits.
pub fn has_digit_run(value: &str) -> bool {
    DIGIT_RUN.is_match(value)
}

/// Stability score in `0..=100` for a strategy and its raw value.
///
/// `Id` takes the bare id, `Class` one or more class tokens (space or dot
/// separated), `Css` and `Xpath` the full locator.
pub fn score(kind: StrategyKind, value: &str) -> u8 {
    match kind {
        StrategyKind::TestId => 100,
        StrategyKind::Role => 90,
        StrategyKind::Label => 85,
        StrategyKind::Placeholder => 80,
        StrategyKind::Name => 65,
        StrategyKind::Text => 60,
        StrategyKind::Id => id_score(value),
        StrategyKind::Class => class_score(value),
        StrategyKind::Css => css_score(value),
        StrategyKind::Xpath => xpath_score(value),
    }
}

fn id_score(value: &str) -> u8 {
    if has_digit_run(value) {
        GENERATED_SCORE
    } else {
        70
    }
}

// A combination is only as stable as its weakest token.
fn class_score(value: &str) -> u8 {
    value
        .split(|c: char| c == '.' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            if has_digit_run(token) {
                GENERATED_SCORE
            } else {
                40
            }
        })
        .min()
        .unwrap_or(40)
}

// Scored on shape only: a css `#id` keeps this score even when the bare
// id would be penalized as generated.
fn css_score(value: &str) -> u8 {
    if value.contains("nth-of-type") || css_segment_count(value) > 3 {
        15
    } else {
        30
    }
}

fn xpath_score(value: &str) -> u8 {
    match xpath_id(value) {
        Some(id) => id_score(id),
        None => 5,
    }
}

/// Number of compound selectors in the first complex selector of `css`.
/// Whitespace and combinators inside brackets or quotes do not count.
pub fn css_segment_count(css: &str) -> usize {
    let mut segments = 0;
    let mut in_segment = false;
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in css.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        if let Some(q) = quote {
            match c {
                '\\' => escaped = true,
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '(' => bracket_depth += 1,
            ']' | ')' => bracket_depth = bracket_depth.saturating_sub(1),
            ',' if bracket_depth == 0 => break,
            c if bracket_depth == 0 && (c.is_whitespace() || matches!(c, '>' | '+' | '~')) => {
                in_segment = false;
                continue;
            }
            _ => {}
        }
        if !in_segment {
            segments += 1;
            in_segment = true;
        }
    }
    segments
}

/// The id value of an id-anchored path such as `//*[@id="main"]`.
pub fn xpath_id(path: &str) -> Option<&str> {
    let inner = path.strip_prefix("//*[@id=")?.strip_suffix(']')?;
    inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_segment_count() {
        assert_eq!(css_segment_count("input[name=\"pin code\"]"), 1);
        assert_eq!(css_segment_count("form > div > span"), 3);
        assert_eq!(css_segment_count("a b c d"), 4);
        assert_eq!(css_segment_count("div:nth-of-type(2)>p"), 2);
        assert_eq!(css_segment_count("[title='a > b'] ~ li"), 2);
    }

    #[test]
    fn test_xpath_id() {
        assert_eq!(xpath_id("//*[@id=\"main\"]"), Some("main"));
        assert_eq!(xpath_id("//*[@id='say \"hi\"']"), Some("say \"hi\""));
        assert_eq!(xpath_id("/html/body/div[2]"), None);
    }
}
