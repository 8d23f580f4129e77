//! Performance monitor types

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// OPERATION KIND
// ============================================================================

/// Kind of document store operation being timed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Read,
    Write,
    Query,
}

impl OperationKind {
    /// Estimated USD cost per document touched
    pub fn unit_cost(self) -> f64 {
        match self {
            OperationKind::Read | OperationKind::Query => 0.000_000_36,
            OperationKind::Write => 0.000_001_08,
        }
    }

    /// Upper bounds (ms) of the fast and medium buckets
    pub fn thresholds_ms(self) -> (f64, f64) {
        match self {
            OperationKind::Read => (100.0, 500.0),
            OperationKind::Write => (200.0, 1000.0),
            OperationKind::Query => (300.0, 1500.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Query => "query",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(OperationKind::Read),
            "write" => Ok(OperationKind::Write),
            "query" => Ok(OperationKind::Query),
            _ => Err(format!(
                "Invalid operation kind '{}'. Valid options: read, write, query",
                s
            )),
        }
    }
}

/// Estimated USD cost of an operation touching `documents` documents
pub fn estimate_cost(kind: OperationKind, documents: u64) -> f64 {
    documents as f64 * kind.unit_cost()
}

// ============================================================================
// PERFORMANCE BUCKET
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceBucket {
    Fast,
    Medium,
    Slow,
}

impl PerformanceBucket {
    pub fn classify(kind: OperationKind, duration: Duration) -> Self {
        let ms = duration.as_secs_f64() * 1000.0;
        let (fast, medium) = kind.thresholds_ms();
        if ms < fast {
            Self::Fast
        } else if ms < medium {
            Self::Medium
        } else {
            Self::Slow
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketDistribution {
    pub fast: u64,
    pub medium: u64,
    pub slow: u64,
}

impl BucketDistribution {
    pub fn add(&mut self, bucket: PerformanceBucket) {
        match bucket {
            PerformanceBucket::Fast => self.fast += 1,
            PerformanceBucket::Medium => self.medium += 1,
            PerformanceBucket::Slow => self.slow += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.fast + self.medium + self.slow
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// Caller-supplied context for a monitored operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMetadata {
    /// Documents written by a batch write; defaults to 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl OperationMetadata {
    pub fn with_document_count(count: u64) -> Self {
        Self {
            document_count: Some(count),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// One completed (or failed) store operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    pub kind: OperationKind,
    pub collection: String,
    pub duration_ms: f64,
    pub document_count: u64,
    pub estimated_cost: f64,
    pub bucket: PerformanceBucket,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub metadata: OperationMetadata,
}

/// Running totals for one (kind, collection) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStats {
    pub count: u64,
    pub total_duration_ms: f64,
    pub total_documents: u64,
    pub total_cost: f64,
    pub error_count: u64,
    /// Largest document count seen in a single operation
    pub max_documents: u64,
}

impl OperationStats {
    pub fn record(&mut self, record: &MetricRecord) {
        self.count += 1;
        self.total_duration_ms += record.duration_ms;
        self.total_documents += record.document_count;
        self.total_cost += record.estimated_cost;
        self.max_documents = self.max_documents.max(record.document_count);
        if !record.success {
            self.error_count += 1;
        }
    }

    pub fn average_duration_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_duration_ms / self.count as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub kind: OperationKind,
    pub collection: String,
    #[serde(flatten)]
    pub stats: OperationStats,
    pub average_duration_ms: f64,
}

/// Aggregate view over every recorded operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub total_operations: u64,
    pub total_duration_ms: f64,
    pub total_documents: u64,
    pub total_cost: f64,
    pub error_count: u64,
    pub average_duration_ms: f64,
    pub average_cost: f64,
    pub error_rate: f64,
    pub distribution: BucketDistribution,
    pub operations: Vec<CollectionSummary>,
}

// ============================================================================
// DOCUMENT COUNT
// ============================================================================

/// Number of documents a query result carries, used for cost estimates
pub trait DocumentCount {
    fn document_count(&self) -> u64;
}

impl<T> DocumentCount for Vec<T> {
    fn document_count(&self) -> u64 {
        self.len() as u64
    }
}

impl<T> DocumentCount for [T] {
    fn document_count(&self) -> u64 {
        self.len() as u64
    }
}

impl<T> DocumentCount for Option<T> {
    fn document_count(&self) -> u64 {
        u64::from(self.is_some())
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Failure reported by the document store
///
/// The monitor records and passes through whatever error the wrapped
/// operation returns; it never converts into this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} on '{collection}' failed: {message}")]
pub struct DocumentStoreError {
    pub operation: OperationKind,
    pub collection: String,
    pub message: String,
}

impl DocumentStoreError {
    pub fn new(
        operation: OperationKind,
        collection: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            collection: collection.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_cost_per_document() {
        assert_eq!(estimate_cost(OperationKind::Read, 100), 100.0 * 0.00000036);
        assert_eq!(estimate_cost(OperationKind::Write, 0), 0.0);
    }

    #[test]
    fn classify_buckets() {
        let ms = Duration::from_millis;
        assert_eq!(
            PerformanceBucket::classify(OperationKind::Read, ms(50)),
            PerformanceBucket::Fast
        );
        assert_eq!(
            PerformanceBucket::classify(OperationKind::Read, ms(100)),
            PerformanceBucket::Medium
        );
        assert_eq!(
            PerformanceBucket::classify(OperationKind::Read, ms(500)),
            PerformanceBucket::Slow
        );
        assert_eq!(
            PerformanceBucket::classify(OperationKind::Query, ms(1000)),
            PerformanceBucket::Medium
        );
        assert_eq!(
            PerformanceBucket::classify(OperationKind::Write, ms(150)),
            PerformanceBucket::Fast
        );
    }

    #[test]
    fn operation_kind_parse() {
        assert_eq!("QUERY".parse::<OperationKind>(), Ok(OperationKind::Query));
        assert!("delete".parse::<OperationKind>().is_err());
        assert_eq!(OperationKind::Write.to_string(), "write");
    }

    #[test]
    fn document_counts() {
        assert_eq!(vec![1, 2, 3].document_count(), 3);
        assert_eq!(Some("doc").document_count(), 1);
        assert_eq!(None::<u8>.document_count(), 0);
        assert_eq!([1u8, 2][..].document_count(), 2);
    }

    #[test]
    fn metadata_serializes_flat() {
        let meta = OperationMetadata::with_document_count(5).with_field("page", 2);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["documentCount"], 5);
        assert_eq!(json["page"], 2);
    }

    #[test]
    fn store_error_display() {
        let err = DocumentStoreError::new(OperationKind::Query, "advisors", "deadline exceeded");
        assert_eq!(err.to_string(), "query on 'advisors' failed: deadline exceeded");
    }
}
