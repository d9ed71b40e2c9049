//! Dispatch metrics.
//!
//! Totals are plain atomics. Per-tool counts live in a concurrent map keyed
//! by tool name.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

/// Thread-safe atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Simple histogram using fixed buckets.
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<AtomicU64>,
    bucket_bounds: Vec<f64>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    pub fn new(bucket_bounds: Vec<f64>) -> Self {
        let buckets = (0..=bucket_bounds.len())
            .map(|_| AtomicU64::new(0))
            .collect();
        Self {
            buckets,
            bucket_bounds,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn default_latency() -> Self {
        Self::new(vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0])
    }

    pub fn observe(&self, value: f64) {
        let bucket_idx = self
            .bucket_bounds
            .iter()
            .position(|&bound| value <= bound)
            .unwrap_or(self.bucket_bounds.len());

        self.buckets[bucket_idx].fetch_add(1, Ordering::Relaxed);
        self.sum
            .fetch_add((value * 1000.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Sum in the observed unit. Stored internally scaled by 1000.
    pub fn sum_ms(&self) -> f64 {
        self.sum.load(Ordering::Relaxed) as f64 / 1000.0
    }

    pub fn bucket_counts(&self) -> Vec<u64> {
        self.buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect()
    }
}

/// Process-lifetime dispatch counters.
#[derive(Debug)]
pub struct MetricsRegistry {
    pub requests_total: Counter,
    pub requests_success: Counter,
    pub requests_error: Counter,
    pub dispatch_latency_ms: Histogram,
    tool_calls: DashMap<String, Counter>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            requests_total: Counter::new(),
            requests_success: Counter::new(),
            requests_error: Counter::new(),
            dispatch_latency_ms: Histogram::default_latency(),
            tool_calls: DashMap::new(),
        }
    }

    /// Records one finished dispatch. Call exactly once per tool call.
    pub fn record_dispatch(&self, tool: &str, success: bool, latency_ms: f64) {
        self.requests_total.inc();
        if success {
            self.requests_success.inc();
        } else {
            self.requests_error.inc();
        }
        self.tool_calls.entry(tool.to_string()).or_default().inc();
        self.dispatch_latency_ms.observe(latency_ms);
    }

    pub fn tool_calls(&self, tool: &str) -> u64 {
        self.tool_calls.get(tool).map(|c| c.get()).unwrap_or(0)
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary::from_registry(self)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`MetricsRegistry`] for status output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Percentage of successful dispatches; 0 when nothing was recorded.
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub tool_calls: BTreeMap<String, u64>,
}

impl MetricsSummary {
    pub fn from_registry(registry: &MetricsRegistry) -> Self {
        let total = registry.requests_total.get();
        let successful = registry.requests_success.get();
        let success_rate = if total > 0 {
            successful as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let count = registry.dispatch_latency_ms.count();
        let avg_latency_ms = if count > 0 {
            registry.dispatch_latency_ms.sum_ms() / count as f64
        } else {
            0.0
        };

        Self {
            total_requests: total,
            successful_requests: successful,
            failed_requests: registry.requests_error.get(),
            success_rate,
            avg_latency_ms,
            tool_calls: registry
                .tool_calls
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().get()))
                .collect(),
        }
    }
}
