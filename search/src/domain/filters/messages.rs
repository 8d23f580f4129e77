//! User-facing validation messages
//!
//! Maps machine error codes to short, field-labelled sentences for the
//! search form. Codes without a template fall back to the technical message.

use super::error::FilterValidationError;
use super::rules::RuleTable;

/// `{label}` is replaced with the filter's display label
const MESSAGE_TEMPLATES: &[(&str, &str)] = &[
    ("REQUIRED_FIELD", "{label} is required."),
    ("UNKNOWN_FILTER", "This search filter is not supported."),
    ("INVALID_TYPE", "{label} has an unexpected value. Please reselect it."),
    ("MAX_LENGTH_EXCEEDED", "{label} is too long."),
    ("MAX_ITEMS_EXCEEDED", "Too many {label} options selected."),
    ("INVALID_FORMAT", "{label} is not in a recognized format."),
    ("INVALID_VALUE", "Please choose a valid option for {label}."),
    ("INVALID_VALUES", "Some {label} selections are not available."),
];

fn template(code: &str) -> Option<&'static str> {
    MESSAGE_TEMPLATES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, t)| *t)
}

/// Message for a raw code string, e.g. one read back from a client
pub fn user_message_for_code(code: &str, label: &str, technical: &str) -> String {
    match template(code) {
        Some(t) => t.replace("{label}", label),
        None => technical.to_string(),
    }
}

/// Message for a validation error, labelled from the rule table
pub fn user_message(rules: &RuleTable, error: &FilterValidationError) -> String {
    user_message_for_code(
        error.code.as_str(),
        rules.label(&error.field),
        &error.message,
    )
}
