use crate::protocol::{AttributeMap, Candidate, SelectionRecord};

const DEFAULT_SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "cvv",
    "ssn",
    "card_number",
    "credit_card",
];

const MASK: &str = "••••••••";

/// Mask `value` when `field_name` looks like a credential.
pub fn mask_sensitive(value: &str, field_name: &str, sensitive_fields: &[String]) -> String {
    let lower_field = field_name.to_lowercase();

    let is_sensitive = sensitive_fields
        .iter()
        .any(|f| lower_field.contains(&f.to_lowercase()))
        || DEFAULT_SENSITIVE_FIELDS
            .iter()
            .any(|f| lower_field.contains(*f));

    if is_sensitive {
        MASK.to_string()
    } else {
        value.to_string()
    }
}

/// Attribute value for display. The `value` of a password input is always
/// masked, and so is any attribute whose name looks sensitive.
pub fn display_attribute(attributes: &AttributeMap, name: &str, value: &str) -> String {
    if name == "value"
        && attributes
            .get("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("password"))
    {
        return MASK.to_string();
    }
    mask_sensitive(value, name, &[])
}

/// Human readable rendering of a selection record.
pub fn format_record(record: &SelectionRecord) -> String {
    let mut output = record.display_name.clone();
    if record.is_dynamic {
        output.push_str("  [dynamic]");
    }

    let uniqueness = if record.selector_unique {
        "unique"
    } else {
        "not unique"
    };
    output.push_str(&format!(
        "\n  selector: {} ({})",
        record.structural_selector, uniqueness
    ));
    output.push_str(&format!("\n  xpath:    {}", record.path_locator));

    if !record.attributes.is_empty() {
        output.push_str("\n  attributes:");
        for (name, value) in record.attributes.iter() {
            let shown = display_attribute(&record.attributes, name, value);
            output.push_str(&format!("\n    {}={:?}", name, shown));
        }
    }

    if !record.candidates.is_empty() {
        output.push_str("\n  candidates:");
        for candidate in &record.candidates {
            output.push_str(&format!("\n    {}", format_candidate(candidate)));
        }
    }

    output.push_str("\n  playwright:");
    for line in record.playwright.lines() {
        output.push_str(&format!("\n    {}", line));
    }
    output.push_str("\n  selenium:");
    for line in record.selenium.lines() {
        output.push_str(&format!("\n    {}", line));
    }
    output
}

pub fn format_candidate(candidate: &Candidate) -> String {
    format!(
        "{:>3} {:<11} {}",
        candidate.score,
        candidate.kind.as_str(),
        candidate.text
    )
}
