//! Selector parsing and matching for the uniqueness oracle.
//!
//! Matching walks right to left: the rightmost compound is tested against the
//! candidate node, then each combinator moves to a parent or earlier sibling.

use super::{DomTree, NodeId};
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "dom/selector.pest"]
struct SelectorParser;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("Invalid selector {selector:?}: {reason}")]
    Invalid { selector: String, reason: String },
}

impl SelectorError {
    fn invalid(selector: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Sibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
    DashMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    /// `None` tests presence only.
    pub test: Option<(AttrOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    NthOfType(usize),
    NthChild(usize),
    FirstOfType,
    LastOfType,
    FirstChild,
    LastChild,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// `None` for universal or omitted type.
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrSelector>,
    pub pseudos: Vec<Pseudo>,
}

/// A chain of compounds. `combinators[i]` joins `compounds[i]` to `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut pairs = SelectorParser::parse(Rule::selector_list, input)
            .map_err(|e| SelectorError::invalid(input, e))?;
        let list = pairs
            .next()
            .ok_or_else(|| SelectorError::invalid(input, "empty selector"))?;

        let mut selectors = Vec::new();
        for inner in list.into_inner() {
            if inner.as_rule() == Rule::complex {
                selectors.push(parse_complex(inner, input)?);
            }
        }
        Ok(Self { selectors })
    }

    pub fn matches<D: DomTree + ?Sized>(&self, dom: &D, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|complex| matches_complex(dom, node, complex, complex.compounds.len() - 1))
    }

    /// Matching connected elements in document order.
    pub fn select_all<D: DomTree + ?Sized>(&self, dom: &D) -> Vec<NodeId> {
        dom.elements()
            .into_iter()
            .filter(|&node| self.matches(dom, node))
            .collect()
    }
}

fn parse_complex(pair: Pair<Rule>, input: &str) -> Result<ComplexSelector, SelectorError> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::compound => compounds.push(parse_compound(inner, input)?),
            Rule::child => combinators.push(Combinator::Child),
            Rule::adjacent => combinators.push(Combinator::Adjacent),
            Rule::sibling => combinators.push(Combinator::Sibling),
            Rule::descendant => combinators.push(Combinator::Descendant),
            other => {
                return Err(SelectorError::invalid(
                    input,
                    format!("unexpected {:?}", other),
                ));
            }
        }
    }

    if compounds.is_empty() || combinators.len() + 1 != compounds.len() {
        return Err(SelectorError::invalid(input, "dangling combinator"));
    }
    Ok(ComplexSelector {
        compounds,
        combinators,
    })
}

fn parse_compound(pair: Pair<Rule>, input: &str) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::type_sel => compound.tag = Some(inner.as_str().to_ascii_lowercase()),
            Rule::universal => {}
            Rule::id_sel => compound.ids.push(first_inner_str(inner)),
            Rule::class_sel => compound.classes.push(first_inner_str(inner)),
            Rule::attr_sel => compound.attrs.push(parse_attr(inner, input)?),
            Rule::pseudo => compound.pseudos.push(parse_pseudo(inner, input)?),
            other => {
                return Err(SelectorError::invalid(
                    input,
                    format!("unexpected {:?}", other),
                ));
            }
        }
    }
    Ok(compound)
}

fn first_inner_str(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

fn parse_attr(pair: Pair<Rule>, input: &str) -> Result<AttrSelector, SelectorError> {
    let mut name = None;
    let mut op = None;
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::attr_name => name = Some(inner.as_str().to_ascii_lowercase()),
            Rule::attr_op => {
                op = Some(match inner.as_str() {
                    "=" => AttrOp::Equals,
                    "~=" => AttrOp::Includes,
                    "^=" => AttrOp::Prefix,
                    "$=" => AttrOp::Suffix,
                    "*=" => AttrOp::Substring,
                    _ => AttrOp::DashMatch,
                })
            }
            Rule::dq_string | Rule::sq_string => value = Some(unescape(&first_inner_str(inner))),
            Rule::bare_value => value = Some(inner.as_str().to_string()),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| SelectorError::invalid(input, "attribute name missing"))?;
    let test = match (op, value) {
        (Some(op), Some(value)) => Some((op, value)),
        (None, None) => None,
        _ => return Err(SelectorError::invalid(input, "incomplete attribute test")),
    };
    Ok(AttrSelector { name, test })
}

fn parse_pseudo(pair: Pair<Rule>, input: &str) -> Result<Pseudo, SelectorError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| SelectorError::invalid(input, "empty pseudo-class"))?;

    match inner.as_rule() {
        Rule::nth_pseudo => {
            let mut kind = "";
            let mut index = 0usize;
            for part in inner.into_inner() {
                match part.as_rule() {
                    Rule::nth_name => kind = part.as_str(),
                    Rule::nth_index => {
                        index = part
                            .as_str()
                            .parse()
                            .map_err(|e| SelectorError::invalid(input, e))?
                    }
                    _ => {}
                }
            }
            Ok(if kind == "nth-child" {
                Pseudo::NthChild(index)
            } else {
                Pseudo::NthOfType(index)
            })
        }
        Rule::bare_pseudo => Ok(match inner.as_str() {
            "first-of-type" => Pseudo::FirstOfType,
            "last-of-type" => Pseudo::LastOfType,
            "first-child" => Pseudo::FirstChild,
            _ => Pseudo::LastChild,
        }),
        other => Err(SelectorError::invalid(
            input,
            format!("unexpected {:?}", other),
        )),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn matches_complex<D: DomTree + ?Sized>(
    dom: &D,
    node: NodeId,
    complex: &ComplexSelector,
    index: usize,
) -> bool {
    if !matches_compound(dom, node, &complex.compounds[index]) {
        return false;
    }
    if index == 0 {
        return true;
    }

    match complex.combinators[index - 1] {
        Combinator::Child => dom
            .parent(node)
            .is_some_and(|p| matches_complex(dom, p, complex, index - 1)),
        Combinator::Descendant => {
            let mut current = dom.parent(node);
            while let Some(ancestor) = current {
                if matches_complex(dom, ancestor, complex, index - 1) {
                    return true;
                }
                current = dom.parent(ancestor);
            }
            false
        }
        Combinator::Adjacent => dom
            .previous_sibling(node)
            .is_some_and(|s| matches_complex(dom, s, complex, index - 1)),
        Combinator::Sibling => {
            let mut current = dom.previous_sibling(node);
            while let Some(sibling) = current {
                if matches_complex(dom, sibling, complex, index - 1) {
                    return true;
                }
                current = dom.previous_sibling(sibling);
            }
            false
        }
    }
}

fn matches_compound<D: DomTree + ?Sized>(dom: &D, node: NodeId, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag
        && dom.tag_name(node) != tag
    {
        return false;
    }

    if !compound
        .ids
        .iter()
        .all(|id| dom.attribute(node, "id") == Some(id.as_str()))
    {
        return false;
    }

    if !compound.classes.is_empty() {
        let classes = dom.class_list(node);
        if !compound
            .classes
            .iter()
            .all(|c| classes.contains(&c.as_str()))
        {
            return false;
        }
    }

    compound
        .attrs
        .iter()
        .all(|attr| matches_attr(dom.attribute(node, &attr.name), attr))
        && compound
            .pseudos
            .iter()
            .all(|pseudo| matches_pseudo(dom, node, *pseudo))
}

fn matches_attr(actual: Option<&str>, attr: &AttrSelector) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    let Some((op, expected)) = &attr.test else {
        return true;
    };

    match op {
        AttrOp::Equals => actual == expected,
        AttrOp::Includes => actual.split_whitespace().any(|t| t == expected),
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected.as_str()),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected.as_str()),
        AttrOp::Substring => !expected.is_empty() && actual.contains(expected.as_str()),
        AttrOp::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
        }
    }
}

fn matches_pseudo<D: DomTree + ?Sized>(dom: &D, node: NodeId, pseudo: Pseudo) -> bool {
    let tag = dom.tag_name(node);
    match pseudo {
        Pseudo::NthOfType(k) => type_position(dom, node) == k,
        Pseudo::NthChild(k) => child_position(dom, node) == k,
        Pseudo::FirstOfType => type_position(dom, node) == 1,
        Pseudo::LastOfType => {
            let mut current = dom.next_sibling(node);
            while let Some(sibling) = current {
                if dom.tag_name(sibling) == tag {
                    return false;
                }
                current = dom.next_sibling(sibling);
            }
            true
        }
        Pseudo::FirstChild => dom.previous_sibling(node).is_none(),
        Pseudo::LastChild => dom.next_sibling(node).is_none(),
    }
}

/// 1-based position among same-tag element siblings.
pub fn type_position<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> usize {
    let tag = dom.tag_name(node);
    let mut position = 1;
    let mut current = dom.previous_sibling(node);
    while let Some(sibling) = current {
        if dom.tag_name(sibling) == tag {
            position += 1;
        }
        current = dom.previous_sibling(sibling);
    }
    position
}

fn child_position<D: DomTree + ?Sized>(dom: &D, node: NodeId) -> usize {
    let mut position = 1;
    let mut current = dom.previous_sibling(node);
    while let Some(sibling) = current {
        position += 1;
        current = dom.previous_sibling(sibling);
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> SelectorList {
        SelectorList::parse(input).unwrap()
    }

    #[test]
    fn test_parse_compound_parts() {
        let list = parse("input.a.b#x[name=\"q\"]:nth-of-type(2)");
        let compound = &list.selectors[0].compounds[0];
        assert_eq!(compound.tag.as_deref(), Some("input"));
        assert_eq!(compound.ids, vec!["x"]);
        assert_eq!(compound.classes, vec!["a", "b"]);
        assert_eq!(
            compound.attrs[0].test,
            Some((AttrOp::Equals, "q".to_string()))
        );
        assert_eq!(compound.pseudos, vec![Pseudo::NthOfType(2)]);
    }

    #[test]
    fn test_parse_combinators() {
        let list = parse("form > div  span + a ~ b");
        assert_eq!(
            list.selectors[0].combinators,
            vec![
                Combinator::Child,
                Combinator::Descendant,
                Combinator::Adjacent,
                Combinator::Sibling
            ]
        );
    }

    #[test]
    fn test_parse_list_and_quotes() {
        let list = parse("a[title='it\\'s'], [data-testid=\"say \\\"hi\\\"\"]");
        assert_eq!(list.selectors.len(), 2);
        assert_eq!(
            list.selectors[0].compounds[0].attrs[0].test,
            Some((AttrOp::Equals, "it's".to_string()))
        );
        assert_eq!(
            list.selectors[1].compounds[0].attrs[0].test,
            Some((AttrOp::Equals, "say \"hi\"".to_string()))
        );
    }

    #[test]
    fn test_parse_attribute_operators() {
        let list = parse("[a~=x][b^=y][c$=z][d*=w][e|=en][f]");
        let ops: Vec<_> = list.selectors[0].compounds[0]
            .attrs
            .iter()
            .map(|a| a.test.as_ref().map(|(op, _)| *op))
            .collect();
        assert_eq!(
            ops,
            vec![
                Some(AttrOp::Includes),
                Some(AttrOp::Prefix),
                Some(AttrOp::Suffix),
                Some(AttrOp::Substring),
                Some(AttrOp::DashMatch),
                None
            ]
        );
    }

    #[test]
    fn test_malformed_selectors_rejected() {
        for bad in ["", "#123", ".9lives", "div >", "a[", "a[b=]", "div:hover", "a,,b", "p:nth-of-type(0)"] {
            assert!(SelectorList::parse(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_dash_match() {
        let attr = AttrSelector {
            name: "lang".into(),
            test: Some((AttrOp::DashMatch, "en".into())),
        };
        assert!(matches_attr(Some("en"), &attr));
        assert!(matches_attr(Some("en-US"), &attr));
        assert!(!matches_attr(Some("eng"), &attr));
        assert!(!matches_attr(None, &attr));
    }
}
