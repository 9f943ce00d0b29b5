//! Per-operation request telemetry.
//!
//! Every operation owns a latency histogram (microseconds), a success counter and a failure
//! counter, named `requests/latency/<tag>`, `requests/total/<tag>` and `requests/failed/<tag>`.
//! They are created when the gateway is built and registered with the caller's registry, if
//! one is supplied. Without a registry they are still collected, just not exported.
//!
//! All metric types are `Send + Sync` and safe to update from concurrent calls.

use crate::constants::{
    HISTOGRAM_RESERVOIR_SIZE, METRIC_FAILED_PREFIX, METRIC_LATENCY_PREFIX, METRIC_TOTAL_PREFIX,
};
use erx_wire::Operation;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// Destination for the gateway's metrics.
pub trait MetricsRegistry: Send + Sync {
    fn register_counter(&self, name: &str, counter: Arc<Counter>);
    fn register_histogram(&self, name: &str, histogram: Arc<Histogram>);
}

/// Monotonic event counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
struct HistogramState {
    count: u64,
    sum: u64,
    min: u64,
    max: u64,
    samples: Vec<u64>,
}

/// Histogram with exact count/sum/min/max and a uniform sample reservoir for percentiles.
#[derive(Debug, Default)]
pub struct Histogram {
    state: Mutex<HistogramState>,
}

/// Point-in-time view of a [`Histogram`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
}

impl Histogram {
    pub fn record(&self, value: u64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        state.min = if state.count == 0 {
            value
        } else {
            state.min.min(value)
        };
        state.max = state.max.max(value);
        state.count += 1;
        state.sum = state.sum.saturating_add(value);

        if state.samples.len() < HISTOGRAM_RESERVOIR_SIZE {
            state.samples.push(value);
        } else {
            let slot = rand::thread_rng().gen_range(0..state.count);
            if let Some(sample) = usize::try_from(slot)
                .ok()
                .and_then(|slot| state.samples.get_mut(slot))
            {
                *sample = value;
            }
        }
    }

    /// Record a duration in whole microseconds.
    pub fn record_duration(&self, elapsed: Duration) {
        self.record(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
    }

    pub fn count(&self) -> u64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).count
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut sorted = state.samples.clone();
        sorted.sort_unstable();

        HistogramSnapshot {
            count: state.count,
            sum: state.sum,
            min: state.min,
            max: state.max,
            p50: percentile(&sorted, 0.50),
            p90: percentile(&sorted, 0.90),
            p99: percentile(&sorted, 0.99),
        }
    }
}

fn percentile(sorted: &[u64], quantile: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (quantile * (sorted.len() - 1) as f64).round() as usize;
    sorted.get(rank).copied().unwrap_or(0)
}

/// The telemetry triple for one operation.
#[derive(Clone, Debug, Default)]
pub struct OperationMetrics {
    pub latency: Arc<Histogram>,
    pub total: Arc<Counter>,
    pub failed: Arc<Counter>,
}

impl OperationMetrics {
    fn register(operation: Operation, registry: Option<&dyn MetricsRegistry>) -> Self {
        let metrics = Self::default();
        if let Some(registry) = registry {
            let tag = operation.tag();
            registry.register_histogram(
                &format!("{METRIC_LATENCY_PREFIX}{tag}"),
                Arc::clone(&metrics.latency),
            );
            registry.register_counter(
                &format!("{METRIC_TOTAL_PREFIX}{tag}"),
                Arc::clone(&metrics.total),
            );
            registry.register_counter(
                &format!("{METRIC_FAILED_PREFIX}{tag}"),
                Arc::clone(&metrics.failed),
            );
        }
        metrics
    }
}

/// Telemetry for every operation in the catalogue.
#[derive(Debug)]
pub struct Telemetry {
    operations: [OperationMetrics; Operation::ALL.len()],
}

impl Telemetry {
    pub fn new(registry: Option<&dyn MetricsRegistry>) -> Self {
        Self {
            operations: Operation::ALL.map(|operation| OperationMetrics::register(operation, registry)),
        }
    }

    pub fn operation(&self, operation: Operation) -> &OperationMetrics {
        &self.operations[operation as usize]
    }
}

/// Registry that keeps metrics in memory, keyed by name.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    counters: RwLock<BTreeMap<String, Arc<Counter>>>,
    histograms: RwLock<BTreeMap<String, Arc<Histogram>>>,
}

/// Serializable view of everything in an [`InMemoryRegistry`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RegistrySnapshot {
    pub counters: BTreeMap<String, u64>,
    pub histograms: BTreeMap<String, HistogramSnapshot>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> Option<Arc<Counter>> {
        self.counters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn histogram(&self, name: &str) -> Option<Arc<Histogram>> {
        self.histograms
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Current counter value, zero when the counter is unknown.
    pub fn counter_value(&self, name: &str) -> u64 {
        self.counter(name).map(|c| c.get()).unwrap_or(0)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            counters: self
                .counters
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .map(|(name, counter)| (name.clone(), counter.get()))
                .collect(),
            histograms: self
                .histograms
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .map(|(name, histogram)| (name.clone(), histogram.snapshot()))
                .collect(),
        }
    }
}

impl MetricsRegistry for InMemoryRegistry {
    fn register_counter(&self, name: &str, counter: Arc<Counter>) {
        self.counters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_owned(), counter);
    }

    fn register_histogram(&self, name: &str, histogram: Arc<Histogram>) {
        self.histograms
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_owned(), histogram);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_triple_for_every_operation() {
        let registry = InMemoryRegistry::new();
        let _telemetry = Telemetry::new(Some(&registry));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.counters.len(), Operation::ALL.len() * 2);
        assert_eq!(snapshot.histograms.len(), Operation::ALL.len());
        assert!(registry
            .histogram("requests/latency/SendMultiplePrescriptions")
            .is_some());
        assert!(registry.counter("requests/failed/DenyRefill").is_some());
    }

    #[test]
    fn registry_sees_updates_through_shared_handles() {
        let registry = InMemoryRegistry::new();
        let telemetry = Telemetry::new(Some(&registry));

        let metrics = telemetry.operation(Operation::IgnoreAlert);
        metrics.total.inc();
        metrics.total.inc();
        metrics.failed.inc();

        assert_eq!(registry.counter_value("requests/total/IgnoreAlert"), 2);
        assert_eq!(registry.counter_value("requests/failed/IgnoreAlert"), 1);
        assert_eq!(registry.counter_value("requests/total/ApproveRefill"), 0);
    }

    #[test]
    fn telemetry_without_registry_still_counts() {
        let telemetry = Telemetry::new(None);
        telemetry.operation(Operation::AllergySearch).failed.inc();
        assert_eq!(telemetry.operation(Operation::AllergySearch).failed.get(), 1);
    }

    #[test]
    fn histogram_tracks_exact_aggregates() {
        let histogram = Histogram::default();
        for value in [30, 10, 20] {
            histogram.record(value);
        }

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.count, 3);
        assert_eq!(snapshot.sum, 60);
        assert_eq!(snapshot.min, 10);
        assert_eq!(snapshot.max, 30);
        assert_eq!(snapshot.p50, 20);
    }

    #[test]
    fn reservoir_is_bounded() {
        let histogram = Histogram::default();
        for value in 0..5_000u64 {
            histogram.record(value);
        }

        let state = histogram.state.lock().unwrap();
        assert_eq!(state.samples.len(), HISTOGRAM_RESERVOIR_SIZE);
        assert_eq!(state.count, 5_000);
        assert_eq!(state.max, 4_999);
    }

    #[test]
    fn durations_are_recorded_in_microseconds() {
        let histogram = Histogram::default();
        histogram.record_duration(Duration::from_millis(3));
        assert_eq!(histogram.snapshot().sum, 3_000);
    }
}
