//! Advisor search filter shaping
//!
//! Validates, checks and reorders the filter object built by the search form
//! before a separate query builder turns it into store clauses.
//!
//! ## Usage
//!
//! ```no_run
//! use advisor_search::domain::filters::{FilterService, FilterSet, RuleTable};
//!
//! let service = FilterService::new(RuleTable::embedded().unwrap());
//! let filters = FilterSet::from_json_str(r#"{"principalOfficeCity": "Seattle"}"#).unwrap();
//! let prepared = service.prepare(&filters);
//! assert!(prepared.validation.is_valid);
//! ```

mod complexity;
mod error;
mod messages;
mod optimizer;
mod rules;
mod types;
mod validation;

pub use complexity::{
    ComplexityMetrics, ComplexityReport, MAX_ARRAY_CONTAINS_ANY, MAX_RANGE_QUERIES,
    MAX_WHERE_CLAUSES, check_query_complexity,
};
pub use error::{ErrorCode, FilterValidationError};
pub use messages::{user_message, user_message_for_code};
pub use optimizer::{FILTER_PRIORITY, optimize_filter_order};
pub use rules::{
    CompiledRule, FilterCategory, FilterType, RuleConfigError, RuleTable, RuleTableConfig,
    ValidationRule,
};
pub use types::{AdvisorFilters, FilterParseError, FilterSet, FilterValue};
pub use validation::{ValidationResult, validate_filter, validate_filters};

use serde::Serialize;

/// Everything the search form needs from one pass over its filters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedSearch {
    pub validation: ValidationResult,
    /// One user-facing message per validation error, same order
    pub messages: Vec<String>,
    pub complexity: ComplexityReport,
    /// Sanitized, reordered filters for the query builder
    pub filters: FilterSet,
}

impl PreparedSearch {
    /// Safe to hand to the query builder
    pub fn is_ready(&self) -> bool {
        self.validation.is_valid
    }
}

/// Owner of the loaded rule table
///
/// Constructed once per application session and shared by reference.
#[derive(Debug, Clone)]
pub struct FilterService {
    rules: RuleTable,
}

impl FilterService {
    pub fn new(rules: RuleTable) -> Self {
        tracing::debug!(
            filters = rules.len(),
            enforce_required = rules.enforce_required(),
            "Filter service initialized"
        );
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn validate_filter(
        &self,
        name: &str,
        value: &FilterValue,
    ) -> Result<(), FilterValidationError> {
        validate_filter(&self.rules, name, value)
    }

    pub fn validate_filters(&self, filters: &FilterSet) -> ValidationResult {
        validate_filters(&self.rules, filters)
    }

    pub fn check_query_complexity(&self, filters: &FilterSet) -> ComplexityReport {
        check_query_complexity(&self.rules, filters)
    }

    pub fn optimize_filter_order(&self, filters: &FilterSet) -> FilterSet {
        optimize_filter_order(filters)
    }

    pub fn user_messages(&self, result: &ValidationResult) -> Vec<String> {
        result
            .errors
            .iter()
            .map(|e| user_message(&self.rules, e))
            .collect()
    }

    /// Sanitize, validate, check and reorder in one pass
    pub fn prepare(&self, filters: &FilterSet) -> PreparedSearch {
        let sanitized = filters.sanitized();
        let validation = self.validate_filters(&sanitized);
        let messages = self.user_messages(&validation);
        let complexity = self.check_query_complexity(&sanitized);
        let filters = self.optimize_filter_order(&sanitized);

        tracing::debug!(
            valid = validation.is_valid,
            within_limits = complexity.is_valid,
            active = filters.len(),
            "Prepared search filters"
        );

        PreparedSearch {
            validation,
            messages,
            complexity,
            filters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> FilterService {
        FilterService::new(RuleTable::embedded().unwrap())
    }

    #[test]
    fn prepare_valid_search() {
        let filters = FilterSet::new()
            .with("fees", vec!["Hourly", "Hourly"])
            .with("principalOfficeCity", " Seattle ")
            .with("custodians", vec!["Fidelity"])
            .with("accountMinimum", "");
        let prepared = service().prepare(&filters);

        assert!(prepared.is_ready());
        assert!(prepared.messages.is_empty());
        assert!(prepared.complexity.is_valid);
        let keys: Vec<_> = prepared.filters.keys().collect();
        assert_eq!(keys, vec!["principalOfficeCity", "custodians", "fees"]);
        assert_eq!(
            prepared.filters.get("fees"),
            Some(&FilterValue::from(vec!["Hourly"]))
        );
        assert_eq!(
            prepared.filters.get("principalOfficeCity"),
            Some(&FilterValue::from("Seattle"))
        );
    }

    #[test]
    fn prepare_invalid_search() {
        let filters = FilterSet::new()
            .with("custodians", vec!["Charles Schwab", "Fidelity", "Not-A-Custodian"])
            .with("assetsUnderManagement", "10000000-50000000")
            .with("accountMinimum", "0-100000");
        let prepared = service().prepare(&filters);

        assert!(!prepared.is_ready());
        assert_eq!(prepared.validation.errors.len(), 1);
        assert_eq!(
            prepared.messages,
            vec!["Some Custodians selections are not available.".to_string()]
        );
        assert!(!prepared.complexity.is_valid);
        assert_eq!(prepared.complexity.metrics.range_query_count, 2);
    }

    #[test]
    fn typed_form_round_trip() {
        let form = AdvisorFilters {
            principal_office_city: Some("Denver".to_string()),
            professional_designations: vec!["CFP".to_string(), "CFA".to_string()],
            discretionary_authority: Some(true),
            ..Default::default()
        };
        let prepared = service().prepare(&FilterSet::from(&form));

        assert!(prepared.is_ready());
        let keys: Vec<_> = prepared.filters.keys().collect();
        assert_eq!(
            keys,
            vec![
                "principalOfficeCity",
                "discretionaryAuthority",
                "professionalDesignations"
            ]
        );
    }

    #[test]
    fn prepared_serializes() {
        let prepared = service().prepare(&FilterSet::new().with("zip", "98101"));
        let json = serde_json::to_value(&prepared).unwrap();
        assert_eq!(json["validation"]["isValid"], false);
        assert_eq!(json["validation"]["errors"][0]["code"], "UNKNOWN_FILTER");
        assert_eq!(json["messages"][0], "This search filter is not supported.");
        assert_eq!(json["filters"]["zip"], "98101");
    }
}
