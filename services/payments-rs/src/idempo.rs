// services/payments-rs/src/idempo.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::fingerprint::Fingerprint;
use crate::store::PaymentRecord;

/// Optional bounds. Default is unbounded with no expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    pub max_capacity: Option<u64>,
    pub time_to_live: Option<Duration>,
}

#[derive(Clone)]
struct Entry {
    seq: u64,
    record: PaymentRecord,
}

/// In-process mirror of durable payment records. Never authoritative.
#[derive(Clone)]
pub struct IdempoCache {
    inner: Cache<String, Entry>, // fingerprint -> record
    next_seq: Arc<AtomicU64>,
}

impl IdempoCache {
    pub fn new() -> Self {
        Self::with_policy(CachePolicy::default())
    }

    pub fn with_policy(policy: CachePolicy) -> Self {
        let mut builder = Cache::builder();
        if let Some(cap) = policy.max_capacity {
            builder = builder.max_capacity(cap);
        }
        if let Some(ttl) = policy.time_to_live {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, key: &Fingerprint) -> Option<PaymentRecord> {
        self.inner.get(key.as_str()).await.map(|e| e.record)
    }

    /// Overwrite-or-insert. An overwritten key keeps its original position.
    pub async fn put(&self, key: Fingerprint, record: PaymentRecord) {
        let seq = match self.inner.get(key.as_str()).await {
            Some(old) => old.seq,
            None => self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        self.inner.insert(key.into_string(), Entry { seq, record }).await;
    }

    /// Entries in insertion order.
    pub fn snapshot(&self) -> Vec<(String, PaymentRecord)> {
        let mut entries: Vec<(u64, String, PaymentRecord)> = self
            .inner
            .iter()
            .map(|(k, e)| (e.seq, (*k).clone(), e.record))
            .collect();
        entries.sort_by_key(|(seq, _, _)| *seq);
        entries.into_iter().map(|(_, k, r)| (k, r)).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IdempoCache {
    fn default() -> Self {
        Self::new()
    }
}
