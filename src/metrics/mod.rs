use crate::{client::Operation, table::ExecuteOptions};
use parking_lot::Mutex;
use serde_json::Value;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// Receives every successful dispatch.
///
/// Called concurrently from in-flight operations, so implementations must synchronise
/// their own state.
pub trait Metrics: Send + Sync {
    fn add(
        &self,
        model: &str,
        operation: Operation,
        result: &Value,
        options: &ExecuteOptions,
        started: Instant,
    );
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OperationStats {
    pub requests: u64,
    pub capacity: f64,
    pub latency: Duration,
}

/// Sums requests, consumed capacity and latency per model and operation.
#[derive(Debug, Default)]
pub struct OperationMetrics {
    stats: Mutex<HashMap<(String, Operation), OperationStats>>,
}

impl OperationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, model: &str, operation: Operation) -> Option<OperationStats> {
        self.stats
            .lock()
            .get(&(model.to_string(), operation))
            .copied()
    }

    pub fn snapshot(&self) -> HashMap<(String, Operation), OperationStats> {
        self.stats.lock().clone()
    }

    pub fn total_requests(&self) -> u64 {
        self.stats.lock().values().map(|s| s.requests).sum()
    }
}

/// Capacity units reported in a response, whether a single entry or one per table.
pub fn consumed_capacity(result: &Value) -> f64 {
    fn units(entry: &Value) -> f64 {
        entry["CapacityUnits"].as_f64().unwrap_or_default()
    }

    match &result["ConsumedCapacity"] {
        Value::Array(entries) => entries.iter().map(units).sum(),
        entry @ Value::Object(_) => units(entry),
        _ => 0.0,
    }
}

impl Metrics for OperationMetrics {
    fn add(
        &self,
        model: &str,
        operation: Operation,
        result: &Value,
        _options: &ExecuteOptions,
        started: Instant,
    ) {
        let latency = started.elapsed();
        let capacity = consumed_capacity(result);

        let mut stats = self.stats.lock();
        let entry = stats.entry((model.to_string(), operation)).or_default();
        entry.requests += 1;
        entry.capacity += capacity;
        entry.latency += latency;
    }
}
