//! Filter rule table
//!
//! Rules are loaded from JSON so they can change without a rebuild. A
//! default table is embedded at compile time and used when no file is
//! configured.
//!
//! ```json
//! {
//!   "enforce_required": false,
//!   "rules": {
//!     "principalOfficeCity": { "label": "City", "type": "string", "category": "location", "max_length": 100 }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::types::FilterValue;

/// Embedded default rule table (compile-time)
const EMBEDDED_RULES_JSON: &str = include_str!("../../../data/filter_rules.json");

#[derive(Error, Debug)]
pub enum RuleConfigError {
    #[error("Failed to read rule table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse rule table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid rule for filter '{filter}': {reason}")]
    InvalidRule { filter: String, reason: String },
    #[error("Rule table defines no filters")]
    Empty,
}

/// Expected value shape for a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    String,
    Array,
    Boolean,
}

impl FilterType {
    pub fn matches(&self, value: &FilterValue) -> bool {
        matches!(
            (self, value),
            (Self::String, FilterValue::Text(_))
                | (Self::Array, FilterValue::List(_))
                | (Self::Boolean, FilterValue::Flag(_))
        )
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterType::String => write!(f, "string"),
            FilterType::Array => write!(f, "array"),
            FilterType::Boolean => write!(f, "boolean"),
        }
    }
}

/// How the document store evaluates a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCategory {
    /// Equality on a location field
    Location,
    /// Inequality (range) clause; the store allows one per query
    Range,
    /// Equality on a boolean field
    Boolean,
    /// `array-contains-any` membership clause
    Array,
}

/// Validation rule for one filter
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct ValidationRule {
    /// Display name used in user-facing messages
    #[validate(length(min = 1, message = "label must not be empty"))]
    pub label: String,

    #[serde(default)]
    pub required: bool,

    #[serde(rename = "type")]
    pub filter_type: FilterType,

    pub category: FilterCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "max_length must be at least 1"))]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "max_items must be at least 1"))]
    pub max_items: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

/// On-disk shape of the rule table
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuleTableConfig {
    /// Report `REQUIRED_FIELD` for empty required filters
    #[serde(default)]
    pub enforce_required: bool,
    pub rules: BTreeMap<String, ValidationRule>,
}

/// A rule with its pattern compiled
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: ValidationRule,
    pattern: Option<Regex>,
}

impl CompiledRule {
    fn compile(name: &str, rule: ValidationRule) -> Result<Self, RuleConfigError> {
        rule.validate().map_err(|e| RuleConfigError::InvalidRule {
            filter: name.to_string(),
            reason: format_validation_errors(&e),
        })?;

        if rule.filter_type == FilterType::Boolean && rule.allowed_values.is_some() {
            return Err(RuleConfigError::InvalidRule {
                filter: name.to_string(),
                reason: "boolean filters cannot declare allowed_values".to_string(),
            });
        }

        let pattern = rule
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| RuleConfigError::InvalidRule {
                filter: name.to_string(),
                reason: format!("pattern does not compile: {}", e),
            })?;

        Ok(Self { rule, pattern })
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    pub fn allows(&self, value: &str) -> bool {
        self.rule
            .allowed_values
            .as_ref()
            .is_none_or(|allowed| allowed.iter().any(|a| a == value))
    }
}

/// Loaded, immutable rule table
#[derive(Debug, Clone)]
pub struct RuleTable {
    enforce_required: bool,
    rules: BTreeMap<String, CompiledRule>,
}

impl RuleTable {
    /// Default rule table shipped with the binary
    pub fn embedded() -> Result<Self, RuleConfigError> {
        Self::from_json_str(EMBEDDED_RULES_JSON)
    }

    pub fn from_json_str(json: &str) -> Result<Self, RuleConfigError> {
        let config: RuleTableConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    pub fn from_config(config: RuleTableConfig) -> Result<Self, RuleConfigError> {
        if config.rules.is_empty() {
            return Err(RuleConfigError::Empty);
        }

        let rules = config
            .rules
            .into_iter()
            .map(|(name, rule)| {
                let compiled = CompiledRule::compile(&name, rule)?;
                Ok((name, compiled))
            })
            .collect::<Result<BTreeMap<_, _>, RuleConfigError>>()?;

        Ok(Self {
            enforce_required: config.enforce_required,
            rules,
        })
    }

    /// Load from `path`, or the embedded table when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, RuleConfigError> {
        let Some(path) = path else {
            tracing::debug!("Using embedded filter rules");
            return Self::embedded();
        };

        tracing::debug!(path = %path.display(), "Loading filter rules");
        let json = std::fs::read_to_string(path).map_err(|source| RuleConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_json_str(&json)?;
        tracing::debug!(filters = table.len(), "Filter rules loaded");
        Ok(table)
    }

    /// Override the table's `enforce_required` setting
    pub fn with_enforce_required(mut self, enforce: bool) -> Self {
        self.enforce_required = enforce;
        self
    }

    pub fn enforce_required(&self) -> bool {
        self.enforce_required
    }

    pub fn get(&self, name: &str) -> Option<&CompiledRule> {
        self.rules.get(name)
    }

    pub fn category(&self, name: &str) -> Option<FilterCategory> {
        self.rules.get(name).map(|r| r.rule.category)
    }

    /// Display label for a filter, falling back to its name
    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        self.rules
            .get(name)
            .map_or(name, |r| r.rule.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompiledRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Serializable view of the active table
    pub fn to_config(&self) -> RuleTableConfig {
        RuleTableConfig {
            enforce_required: self.enforce_required,
            rules: self
                .rules
                .iter()
                .map(|(k, v)| (k.clone(), v.rule.clone()))
                .collect(),
        }
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}
