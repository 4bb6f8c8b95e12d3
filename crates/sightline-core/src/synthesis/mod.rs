//! Structural selector and path locator synthesis.

pub mod selector;
pub mod xpath;

pub use selector::{SelectorStrategy, SelectorSynthesis, css_string, synthesize_selector};
pub use xpath::{resolve_path, synthesize_path, xpath_literal};
