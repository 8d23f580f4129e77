//! Filter validation against the rule table

use serde::Serialize;

use super::error::{ErrorCode, FilterValidationError};
use super::rules::RuleTable;
use super::types::{FilterSet, FilterValue};

/// Outcome of validating a whole filter set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FilterValidationError>,
    /// Reserved; nothing produces warnings yet
    pub warnings: Vec<String>,
}

/// Validate one filter value.
///
/// Empty values always pass, including for rules marked `required`; the
/// required check lives in [`validate_filters`] behind `enforce_required`.
pub fn validate_filter(
    rules: &RuleTable,
    name: &str,
    value: &FilterValue,
) -> Result<(), FilterValidationError> {
    if value.is_empty() {
        return Ok(());
    }

    let compiled = rules
        .get(name)
        .ok_or_else(|| FilterValidationError::unknown_filter(name))?;
    let rule = &compiled.rule;

    if !rule.filter_type.matches(value) {
        return Err(FilterValidationError::new(
            name,
            ErrorCode::InvalidType,
            format!(
                "{} must be a {}, got {}",
                name,
                rule.filter_type,
                value.type_name()
            ),
        ));
    }

    match value {
        FilterValue::Text(text) => {
            if let Some(max) = rule.max_length
                && text.chars().count() > max
            {
                return Err(FilterValidationError::new(
                    name,
                    ErrorCode::MaxLengthExceeded,
                    format!("{} must be at most {} characters", name, max),
                ));
            }

            if let Some(pattern) = compiled.pattern()
                && !pattern.is_match(text)
            {
                return Err(FilterValidationError::new(
                    name,
                    ErrorCode::InvalidFormat,
                    format!("{} has an invalid format: {}", name, text),
                ));
            }

            if !compiled.allows(text) {
                return Err(FilterValidationError::new(
                    name,
                    ErrorCode::InvalidValue,
                    format!("Invalid value for {}: {}", name, text),
                ));
            }
        }
        FilterValue::List(items) => {
            if let Some(max) = rule.max_items
                && items.len() > max
            {
                return Err(FilterValidationError::new(
                    name,
                    ErrorCode::MaxItemsExceeded,
                    format!("{} must contain at most {} items", name, max),
                ));
            }

            let invalid: Vec<String> = items
                .iter()
                .filter(|item| !compiled.allows(item))
                .cloned()
                .collect();
            if !invalid.is_empty() {
                return Err(FilterValidationError::invalid_values(name, invalid));
            }
        }
        FilterValue::Flag(_) | FilterValue::Null => {}
    }

    Ok(())
}

/// Validate every entry of a filter set.
///
/// Never fails: per-filter errors are collected into the result in input
/// order.
pub fn validate_filters(rules: &RuleTable, filters: &FilterSet) -> ValidationResult {
    let mut errors: Vec<FilterValidationError> = filters
        .active()
        .filter_map(|(name, value)| validate_filter(rules, name, value).err())
        .collect();

    if rules.enforce_required() {
        for (name, compiled) in rules.iter() {
            let present = filters.get(name).is_some_and(|v| !v.is_empty());
            if compiled.rule.required && !present {
                errors.push(FilterValidationError::required(name));
            }
        }
    }

    if !errors.is_empty() {
        tracing::debug!(
            error_count = errors.len(),
            fields = ?errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>(),
            "Filter validation failed"
        );
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings: Vec::new(),
    }
}
