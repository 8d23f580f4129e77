//! Query complexity check
//!
//! Counts the clauses a filter set would produce and compares them to the
//! document store's composite-query ceilings. Advisory only; callers decide
//! whether to reject.

use serde::Serialize;

use super::rules::{FilterCategory, RuleTable};
use super::types::FilterSet;

/// Maximum conjunctive conditions per composite query
pub const MAX_WHERE_CLAUSES: usize = 10;

/// Maximum `array-contains-any` clauses per query
pub const MAX_ARRAY_CONTAINS_ANY: usize = 10;

/// Maximum range (inequality) clauses per query
pub const MAX_RANGE_QUERIES: usize = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityMetrics {
    pub where_clause_count: usize,
    pub array_contains_any_count: usize,
    pub range_query_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub metrics: ComplexityMetrics,
}

/// Count active clauses and report every ceiling that is exceeded.
///
/// Filters missing from the rule table count toward the total only.
pub fn check_query_complexity(rules: &RuleTable, filters: &FilterSet) -> ComplexityReport {
    let mut metrics = ComplexityMetrics::default();

    for (name, _) in filters.active() {
        metrics.where_clause_count += 1;
        match rules.category(name) {
            Some(FilterCategory::Array) => metrics.array_contains_any_count += 1,
            Some(FilterCategory::Range) => metrics.range_query_count += 1,
            _ => {}
        }
    }

    let mut issues = Vec::new();
    if metrics.where_clause_count > MAX_WHERE_CLAUSES {
        issues.push(format!(
            "Too many filter conditions ({}/{}). Firestore limits composite queries.",
            metrics.where_clause_count, MAX_WHERE_CLAUSES
        ));
    }
    if metrics.array_contains_any_count > MAX_ARRAY_CONTAINS_ANY {
        issues.push(format!(
            "Too many array-contains-any filters ({}/{}).",
            metrics.array_contains_any_count, MAX_ARRAY_CONTAINS_ANY
        ));
    }
    if metrics.range_query_count > MAX_RANGE_QUERIES {
        issues.push(format!(
            "Too many range filters ({}/{}). Firestore allows only one range filter per query.",
            metrics.range_query_count, MAX_RANGE_QUERIES
        ));
    }

    if !issues.is_empty() {
        tracing::debug!(metrics = ?metrics, "Query exceeds store limits");
    }

    ComplexityReport {
        is_valid: issues.is_empty(),
        issues,
        metrics,
    }
}
