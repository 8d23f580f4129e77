//! Filter order optimization
//!
//! The query builder adds clauses in filter-set order. Emitting the most
//! selective filters first keeps the store's planner on the narrowest index.

use super::types::FilterSet;

/// Construction order: location, numeric ranges, booleans, then array
/// membership
pub const FILTER_PRIORITY: &[&str] = &[
    "principalOfficeCity",
    "assetsUnderManagement",
    "accountMinimum",
    "discretionaryAuthority",
    "performanceFees",
    "professionalDesignations",
    "custodians",
    "fees",
];

/// Return the active filters reordered by [`FILTER_PRIORITY`].
///
/// Filters not in the priority list follow in their input order. Empty
/// entries are dropped.
pub fn optimize_filter_order(filters: &FilterSet) -> FilterSet {
    let mut ordered = FilterSet::new();

    for name in FILTER_PRIORITY {
        if let Some(value) = filters.get(name)
            && !value.is_empty()
        {
            ordered.insert(*name, value.clone());
        }
    }

    for (name, value) in filters.active() {
        if !FILTER_PRIORITY.contains(&name) {
            ordered.insert(name, value.clone());
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::FilterValue;

    #[test]
    fn location_first_and_custodians_before_fees() {
        let filters = FilterSet::new()
            .with("fees", vec!["Hourly"])
            .with("principalOfficeCity", "Seattle")
            .with("custodians", vec!["Fidelity"]);
        let optimized = optimize_filter_order(&filters);

        let keys: Vec<_> = optimized.keys().collect();
        assert_eq!(keys, vec!["principalOfficeCity", "custodians", "fees"]);
    }

    #[test]
    fn drops_empty_entries() {
        let filters = FilterSet::new()
            .with("accountMinimum", "")
            .with("fees", FilterValue::Null)
            .with("performanceFees", false);
        let optimized = optimize_filter_order(&filters);

        assert_eq!(optimized.len(), 1);
        assert_eq!(optimized.get("performanceFees"), Some(&FilterValue::Flag(false)));
    }

    #[test]
    fn unlisted_filters_keep_relative_order() {
        let filters = FilterSet::new()
            .with("zeta", "1")
            .with("fees", vec!["Hourly"])
            .with("alpha", "2")
            .with("assetsUnderManagement", "500000000+");
        let optimized = optimize_filter_order(&filters);

        let keys: Vec<_> = optimized.keys().collect();
        assert_eq!(keys, vec!["assetsUnderManagement", "fees", "zeta", "alpha"]);
    }

    #[test]
    fn input_untouched() {
        let filters = FilterSet::new().with("fees", vec!["Hourly"]).with("accountMinimum", "");
        let before = filters.clone();
        let _ = optimize_filter_order(&filters);
        assert_eq!(filters, before);
    }
}
