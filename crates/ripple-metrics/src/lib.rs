//! # Ripple Metrics
//!
//! Summaries of a simulation's delivery log: delivery counts, queue delay
//! statistics per receiving channel, and a SHA-256 digest of the log that
//! two runs share exactly when their event sequences are identical.

use ripple_sim::{Event, Tick};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Errors produced while summarizing a log
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to encode event: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Delivery statistics for one receiving channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    pub deliveries: u64,
    pub total_queue_delay: Tick,
    pub max_queue_delay: Tick,
}

impl ChannelMetrics {
    pub fn mean_queue_delay(&self) -> f64 {
        if self.deliveries == 0 {
            0.0
        } else {
            self.total_queue_delay as f64 / self.deliveries as f64
        }
    }

    fn record(&mut self, queue_delay: Tick) {
        self.deliveries += 1;
        self.total_queue_delay += queue_delay;
        self.max_queue_delay = self.max_queue_delay.max(queue_delay);
    }
}

/// Whole-run summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub deliveries: u64,
    pub first_delivery: Option<Tick>,
    pub last_delivery: Option<Tick>,
    pub mean_queue_delay: f64,
    pub max_queue_delay: Tick,
    /// Keyed by receiving address, in address order
    pub per_address: BTreeMap<String, ChannelMetrics>,
    /// SHA-256 over the log encoded as one JSON document per line
    pub digest: [u8; 32],
}

impl RunMetrics {
    /// Summarize a complete log
    pub fn from_events<P: Serialize>(events: &[Event<P>]) -> Result<Self, MetricsError> {
        let mut collector = InMemoryCollector::new();
        for event in events {
            collector.record(event)?;
        }
        Ok(collector.summary())
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

/// Trait for consuming a delivery log incrementally
pub trait MetricsCollector {
    /// Account for one delivery; events must arrive in log order
    fn record<P: Serialize>(&mut self, event: &Event<P>) -> Result<(), MetricsError>;

    /// Summary of everything recorded so far
    fn summary(&self) -> RunMetrics;
}

/// In-memory metrics collector implementation
#[derive(Clone)]
pub struct InMemoryCollector {
    hasher: Sha256,
    total: ChannelMetrics,
    first_delivery: Option<Tick>,
    last_delivery: Option<Tick>,
    per_address: BTreeMap<String, ChannelMetrics>,
}

impl InMemoryCollector {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            total: ChannelMetrics::default(),
            first_delivery: None,
            last_delivery: None,
            per_address: BTreeMap::new(),
        }
    }
}

impl Default for InMemoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector for InMemoryCollector {
    fn record<P: Serialize>(&mut self, event: &Event<P>) -> Result<(), MetricsError> {
        let encoded = serde_json::to_vec(event)?;
        self.hasher.update(&encoded);
        self.hasher.update(b"\n");

        self.total.record(event.queue_delay);
        self.per_address
            .entry(event.to.to_string())
            .or_default()
            .record(event.queue_delay);
        self.first_delivery.get_or_insert(event.time);
        self.last_delivery = Some(event.time);
        Ok(())
    }

    fn summary(&self) -> RunMetrics {
        RunMetrics {
            deliveries: self.total.deliveries,
            first_delivery: self.first_delivery,
            last_delivery: self.last_delivery,
            mean_queue_delay: self.total.mean_queue_delay(),
            max_queue_delay: self.total.max_queue_delay,
            per_address: self.per_address.clone(),
            digest: self.hasher.clone().finalize().into(),
        }
    }
}
