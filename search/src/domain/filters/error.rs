//! Filter validation error types

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable validation error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RequiredField,
    UnknownFilter,
    InvalidType,
    MaxLengthExceeded,
    MaxItemsExceeded,
    InvalidFormat,
    InvalidValue,
    InvalidValues,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiredField => "REQUIRED_FIELD",
            Self::UnknownFilter => "UNKNOWN_FILTER",
            Self::InvalidType => "INVALID_TYPE",
            Self::MaxLengthExceeded => "MAX_LENGTH_EXCEEDED",
            Self::MaxItemsExceeded => "MAX_ITEMS_EXCEEDED",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidValue => "INVALID_VALUE",
            Self::InvalidValues => "INVALID_VALUES",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single filter that failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct FilterValidationError {
    pub field: String,
    pub code: ErrorCode,
    pub message: String,
    /// Offending elements of a multi-select filter (`INVALID_VALUES` only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_values: Vec<String>,
}

impl FilterValidationError {
    pub fn new(field: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
            invalid_values: Vec::new(),
        }
    }

    pub fn unknown_filter(field: &str) -> Self {
        Self::new(field, ErrorCode::UnknownFilter, format!("Unknown filter: {}", field))
    }

    pub fn required(field: &str) -> Self {
        Self::new(field, ErrorCode::RequiredField, format!("{} is required", field))
    }

    pub fn invalid_values(field: &str, values: Vec<String>) -> Self {
        Self {
            field: field.to_string(),
            code: ErrorCode::InvalidValues,
            message: format!("Invalid values for {}: {}", field, values.join(", ")),
            invalid_values: values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_serde_matches_as_str() {
        for code in [
            ErrorCode::RequiredField,
            ErrorCode::UnknownFilter,
            ErrorCode::InvalidType,
            ErrorCode::MaxLengthExceeded,
            ErrorCode::MaxItemsExceeded,
            ErrorCode::InvalidFormat,
            ErrorCode::InvalidValue,
            ErrorCode::InvalidValues,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn error_serializes_camel_case() {
        let err = FilterValidationError::invalid_values("custodians", vec!["Nope".to_string()]);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["field"], "custodians");
        assert_eq!(json["code"], "INVALID_VALUES");
        assert_eq!(json["invalidValues"][0], "Nope");
        assert_eq!(err.to_string(), "Invalid values for custodians: Nope");
    }

    #[test]
    fn invalid_values_omitted_when_empty() {
        let err = FilterValidationError::unknown_filter("zip");
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("invalidValues").is_none());
    }
}
