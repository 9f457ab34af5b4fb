//! Router counters.

use crate::formats::OutputFormat;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters updated by every routed conversion. Read them through [`RouterMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct RouterMetrics {
    conversions: AtomicU64,
    structured: AtomicU64,
    flat: AtomicU64,
    errors: AtomicU64,
    cache_hits: AtomicU64,
    latency_micros: AtomicU64,
}

/// Point-in-time copy of [`RouterMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_conversions: u64,
    pub structured_conversions: u64,
    pub flat_conversions: u64,
    pub errors: u64,
    pub cache_hit_rate: f64,
    pub average_latency_ms: f64,
    pub error_rate: f64,
}

impl RouterMetrics {
    pub(crate) fn record(
        &self,
        format: OutputFormat,
        cache_hit: bool,
        failed: bool,
        latency: Duration,
    ) {
        self.conversions.fetch_add(1, Ordering::Relaxed);
        let by_format = match format {
            OutputFormat::Structured => &self.structured,
            OutputFormat::Flat => &self.flat,
        };
        by_format.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        if failed {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_micros.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.conversions.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let ratio = |count: u64| {
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            }
        };
        MetricsSnapshot {
            total_conversions: total,
            structured_conversions: self.structured.load(Ordering::Relaxed),
            flat_conversions: self.flat.load(Ordering::Relaxed),
            errors,
            cache_hit_rate: ratio(self.cache_hits.load(Ordering::Relaxed)),
            average_latency_ms: ratio(self.latency_micros.load(Ordering::Relaxed)) / 1000.0,
            error_rate: ratio(errors),
        }
    }
}
