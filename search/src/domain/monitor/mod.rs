//! Document store performance and cost monitor
//!
//! Wraps store operations to time them, estimate their cost, and keep a
//! bounded history plus running per-collection totals for the session.
//!
//! The monitor is an explicitly constructed service shared via `Arc`; the
//! lock is only taken after the wrapped future completes, never across an
//! `.await`.

mod types;

pub use types::{
    BucketDistribution, CollectionSummary, DocumentCount, DocumentStoreError, MetricRecord,
    OperationKind, OperationMetadata, OperationStats, PerformanceBucket, PerformanceSummary,
    estimate_cost,
};

use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::core::constants::DEFAULT_HISTORY_CAPACITY;

// ============================================================================
// RECOMMENDATION THRESHOLDS
// ============================================================================

/// Total estimated spend (USD) above which caching is recommended
const COST_ALERT_USD: f64 = 1.0;

/// Share of slow operations that triggers an index review
const SLOW_RATIO_ALERT: f64 = 0.10;

/// Error rate that triggers a reliability warning
const ERROR_RATE_ALERT: f64 = 0.05;

/// Documents in a single query result above which pagination is advised
const LARGE_QUERY_DOCUMENTS: u64 = 50;

/// Queries against one collection above which result caching is advised
const FREQUENT_QUERY_COUNT: u64 = 20;

/// Advisory produced from the aggregated metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    HighCost,
    SlowOperations,
    HighErrorRate,
    LargeQueryResults,
    FrequentCollectionQueries,
}

impl Recommendation {
    pub fn message(self) -> &'static str {
        match self {
            Recommendation::HighCost => {
                "Estimated store cost is high. Cache frequently read documents and avoid re-reading unchanged data."
            }
            Recommendation::SlowOperations => {
                "More than 10% of operations are slow. Review composite indexes for the slowest queries."
            }
            Recommendation::HighErrorRate => {
                "More than 5% of operations failed. Check security rules and network connectivity."
            }
            Recommendation::LargeQueryResults => {
                "Some queries return more than 50 documents. Add pagination with limit() and cursors."
            }
            Recommendation::FrequentCollectionQueries => {
                "A collection is queried more than 20 times. Cache search results for repeated filters."
            }
        }
    }
}

// ============================================================================
// MONITOR
// ============================================================================

#[derive(Debug, Default)]
struct MonitorState {
    history: VecDeque<MetricRecord>,
    stats: FxHashMap<(OperationKind, String), OperationStats>,
    distribution: BucketDistribution,
}

/// Session-scoped store operation monitor
#[derive(Debug)]
pub struct PerformanceMonitor {
    capacity: usize,
    state: Mutex<MonitorState>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl PerformanceMonitor {
    /// Create a monitor keeping at most `capacity` recent records
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(MonitorState {
                history: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
                ..Default::default()
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Start timing an operation; finish it with [`OperationTimer::finish`]
    /// or [`OperationTimer::fail`]
    pub fn start_timer(&self, kind: OperationKind, collection: impl Into<String>) -> OperationTimer<'_> {
        OperationTimer {
            monitor: self,
            kind,
            collection: collection.into(),
            metadata: OperationMetadata::default(),
            started: Instant::now(),
        }
    }

    /// Time a single-document read
    pub async fn monitor_read<F, Fut, T, E>(
        &self,
        collection: &str,
        metadata: Option<OperationMetadata>,
        op: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.monitor(OperationKind::Read, collection, metadata, op, |_, _| 1)
            .await
    }

    /// Time a write; batch writes pass `metadata.document_count`
    pub async fn monitor_write<F, Fut, T, E>(
        &self,
        collection: &str,
        metadata: Option<OperationMetadata>,
        op: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.monitor(OperationKind::Write, collection, metadata, op, |_, meta| {
            meta.document_count.unwrap_or(1)
        })
        .await
    }

    /// Time a query; documents are counted from the result
    pub async fn monitor_query<F, Fut, T, E>(
        &self,
        collection: &str,
        metadata: Option<OperationMetadata>,
        op: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: DocumentCount,
        E: Display,
    {
        self.monitor(OperationKind::Query, collection, metadata, op, |result, _| {
            result.document_count()
        })
        .await
    }

    async fn monitor<F, Fut, T, E, C>(
        &self,
        kind: OperationKind,
        collection: &str,
        metadata: Option<OperationMetadata>,
        op: F,
        count: C,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        C: FnOnce(&T, &OperationMetadata) -> u64,
    {
        let metadata = metadata.unwrap_or_default();
        let started = Instant::now();
        let result = op().await;
        let elapsed = started.elapsed();

        match &result {
            Ok(value) => {
                let documents = count(value, &metadata);
                self.record_operation(kind, collection, elapsed, documents, metadata, None);
            }
            Err(e) => {
                self.record_operation(kind, collection, elapsed, 0, metadata, Some(e.to_string()));
            }
        }

        result
    }

    /// Record a finished operation.
    ///
    /// Failed operations (`error` set) are recorded with the given document
    /// count; the async wrappers always pass 0 for them.
    pub fn record_operation(
        &self,
        kind: OperationKind,
        collection: &str,
        duration: Duration,
        documents: u64,
        metadata: OperationMetadata,
        error: Option<String>,
    ) -> MetricRecord {
        let record = MetricRecord {
            kind,
            collection: collection.to_string(),
            duration_ms: duration.as_secs_f64() * 1000.0,
            document_count: documents,
            estimated_cost: estimate_cost(kind, documents),
            bucket: PerformanceBucket::classify(kind, duration),
            success: error.is_none(),
            error,
            timestamp: chrono::Utc::now(),
            metadata,
        };

        match &record.error {
            Some(e) => tracing::warn!(
                kind = %kind,
                collection,
                duration_ms = record.duration_ms,
                error = %e,
                "Store operation failed"
            ),
            None if record.bucket == PerformanceBucket::Slow => tracing::warn!(
                kind = %kind,
                collection,
                duration_ms = record.duration_ms,
                documents,
                "Slow store operation"
            ),
            None => tracing::trace!(
                kind = %kind,
                collection,
                duration_ms = record.duration_ms,
                documents,
                cost = record.estimated_cost,
                "Store operation recorded"
            ),
        }

        let mut state = self.state.lock();
        state
            .stats
            .entry((kind, record.collection.clone()))
            .or_default()
            .record(&record);
        state.distribution.add(record.bucket);
        if state.history.len() == self.capacity {
            state.history.pop_front();
        }
        state.history.push_back(record.clone());

        record
    }

    /// Number of records currently held in history
    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }

    /// Most recent `n` records, oldest first
    pub fn recent(&self, n: usize) -> Vec<MetricRecord> {
        let state = self.state.lock();
        let skip = state.history.len().saturating_sub(n);
        state.history.iter().skip(skip).cloned().collect()
    }

    /// Running totals for one (kind, collection) pair
    pub fn stats(&self, kind: OperationKind, collection: &str) -> Option<OperationStats> {
        self.state
            .lock()
            .stats
            .get(&(kind, collection.to_string()))
            .copied()
    }

    pub fn summary(&self) -> PerformanceSummary {
        let state = self.state.lock();

        let mut summary = PerformanceSummary {
            distribution: state.distribution,
            ..Default::default()
        };

        for ((kind, collection), stats) in &state.stats {
            summary.total_operations += stats.count;
            summary.total_duration_ms += stats.total_duration_ms;
            summary.total_documents += stats.total_documents;
            summary.total_cost += stats.total_cost;
            summary.error_count += stats.error_count;
            summary.operations.push(CollectionSummary {
                kind: *kind,
                collection: collection.clone(),
                stats: *stats,
                average_duration_ms: stats.average_duration_ms(),
            });
        }
        summary
            .operations
            .sort_by(|a, b| (a.kind, &a.collection).cmp(&(b.kind, &b.collection)));

        if summary.total_operations > 0 {
            let n = summary.total_operations as f64;
            summary.average_duration_ms = summary.total_duration_ms / n;
            summary.average_cost = summary.total_cost / n;
            summary.error_rate = summary.error_count as f64 / n;
        }

        summary
    }

    /// Advisories for the metrics gathered so far
    pub fn recommendations(&self) -> Vec<Recommendation> {
        let summary = self.summary();
        let mut out = Vec::new();

        if summary.total_cost > COST_ALERT_USD {
            out.push(Recommendation::HighCost);
        }

        if summary.total_operations > 0 {
            let n = summary.total_operations as f64;
            if summary.distribution.slow as f64 / n > SLOW_RATIO_ALERT {
                out.push(Recommendation::SlowOperations);
            }
            if summary.error_rate > ERROR_RATE_ALERT {
                out.push(Recommendation::HighErrorRate);
            }
        }

        let queries: Vec<&OperationStats> = summary
            .operations
            .iter()
            .filter(|o| o.kind == OperationKind::Query)
            .map(|o| &o.stats)
            .collect();
        if queries.iter().any(|s| s.max_documents > LARGE_QUERY_DOCUMENTS) {
            out.push(Recommendation::LargeQueryResults);
        }
        if queries.iter().any(|s| s.count > FREQUENT_QUERY_COUNT) {
            out.push(Recommendation::FrequentCollectionQueries);
        }

        out
    }

    /// Drop all history and totals
    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = MonitorState::default();
        tracing::debug!("Performance monitor reset");
    }

    /// Summary, recommendations and recent history as JSON
    pub fn export_json(&self) -> serde_json::Value {
        let recommendations: Vec<_> = self
            .recommendations()
            .into_iter()
            .map(|r| serde_json::json!({ "kind": r, "message": r.message() }))
            .collect();
        serde_json::json!({
            "summary": self.summary(),
            "recommendations": recommendations,
            "history": self.recent(self.capacity),
        })
    }
}

/// In-flight operation started by [`PerformanceMonitor::start_timer`]
#[must_use = "a timer records nothing until finished"]
pub struct OperationTimer<'a> {
    monitor: &'a PerformanceMonitor,
    kind: OperationKind,
    collection: String,
    metadata: OperationMetadata,
    started: Instant,
}

impl OperationTimer<'_> {
    pub fn with_metadata(mut self, metadata: OperationMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn finish(self, documents: u64) -> MetricRecord {
        let elapsed = self.started.elapsed();
        self.monitor.record_operation(
            self.kind,
            &self.collection,
            elapsed,
            documents,
            self.metadata,
            None,
        )
    }

    pub fn fail(self, error: &dyn Display) -> MetricRecord {
        let elapsed = self.started.elapsed();
        self.monitor.record_operation(
            self.kind,
            &self.collection,
            elapsed,
            0,
            self.metadata,
            Some(error.to_string()),
        )
    }
}
