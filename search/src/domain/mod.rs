//! Domain logic: search filter shaping and store operation monitoring

pub mod filters;
pub mod monitor;

pub use filters::{FilterService, FilterSet, FilterValue, PreparedSearch, RuleTable};
pub use monitor::{OperationKind, PerformanceMonitor, Recommendation};
