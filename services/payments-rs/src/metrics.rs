// services/payments-rs/src/metrics.rs

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub const INVALID: &str = "invalid";
pub const STORAGE_FAILURE: &str = "storage_failure";

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    records: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let records = IntCounterVec::new(
            Opts::new("payments_record_total", "payment submissions by outcome"),
            &["status"],
        )?;
        registry.register(Box::new(records.clone()))?;
        Ok(Self { registry, records })
    }

    pub fn observe(&self, status: &str) {
        self.records.with_label_values(&[status]).inc();
    }

    pub fn count(&self, status: &str) -> u64 {
        self.records.with_label_values(&[status]).get()
    }

    /// Prometheus text exposition of everything registered.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
