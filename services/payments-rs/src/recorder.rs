// services/payments-rs/src/recorder.rs

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{RecordError, Result};
use crate::fingerprint::{self, Fingerprint, PaymentPayload};
use crate::idempo::IdempoCache;
use crate::store::{InsertOutcome, PaymentRecord, PaymentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    CacheHit,
    StoreHit,
    Created,
}

impl RecordStatus {
    pub fn is_created(self) -> bool {
        self == RecordStatus::Created
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::CacheHit => "cache_hit",
            RecordStatus::StoreHit => "store_hit",
            RecordStatus::Created => "created",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RecordStatus::CacheHit => "Idempotent response: Data already exists.",
            RecordStatus::StoreHit => "Idempotent response: Data fetched from database.",
            RecordStatus::Created => "Data successfully created.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub fingerprint: Fingerprint,
    pub record: PaymentRecord,
    pub status: RecordStatus,
}

/// Two-tier idempotent writer: cache, then store, then create-if-absent.
///
/// Holds no locks of its own. The store's insert is the only serialization
/// point; the cache only ever receives rows the store has already returned.
#[derive(Clone)]
pub struct PaymentRecorder {
    store: PaymentStore,
    cache: IdempoCache,
}

impl PaymentRecorder {
    pub fn new(store: PaymentStore, cache: IdempoCache) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &PaymentStore {
        &self.store
    }

    pub fn cache(&self) -> &IdempoCache {
        &self.cache
    }

    pub async fn record(&self, payload: PaymentPayload) -> Result<Recorded> {
        // 1) presence check
        if let Some(field) = payload.missing_field() {
            debug!(field, "rejecting payment payload");
            return Err(RecordError::InvalidPayload { field });
        }

        // 2) fingerprint
        let fp = fingerprint::derive(&payload);

        // 3) fast path
        if let Some(record) = self.cache.get(&fp).await {
            return Ok(self.done(fp, record, RecordStatus::CacheHit, &payload));
        }

        // 4) durable lookup
        if let Some(record) = self.store.get(&fp).await? {
            self.cache.put(fp.clone(), record.clone()).await;
            return Ok(self.done(fp, record, RecordStatus::StoreHit, &payload));
        }

        // 5) create-if-absent
        self.create_or_adopt(fp, &payload).await
    }

    /// Inserts the payload, or adopts the row a concurrent caller stored
    /// between the lookup and the insert. Either way the cache gets the
    /// stored row.
    async fn create_or_adopt(&self, fp: Fingerprint, payload: &PaymentPayload) -> Result<Recorded> {
        let outcome = self.store.insert_if_absent(&fp, payload, &now_iso()).await?;
        let status = match &outcome {
            InsertOutcome::Created(_) => RecordStatus::Created,
            InsertOutcome::Existing(_) => {
                debug!(fingerprint = %fp, "concurrent insert won, returning stored row");
                RecordStatus::StoreHit
            }
        };
        let (record, _) = outcome.into_parts();
        self.cache.put(fp.clone(), record.clone()).await;
        Ok(self.done(fp, record, status, payload))
    }

    fn done(
        &self,
        fingerprint: Fingerprint,
        record: PaymentRecord,
        status: RecordStatus,
        payload: &PaymentPayload,
    ) -> Recorded {
        info!(
            fingerprint = %fingerprint,
            card = %payload.masked_card(),
            amount = %payload.amount,
            status = status.as_str(),
            "payment recorded"
        );
        Recorded {
            fingerprint,
            record,
            status,
        }
    }
}

/// UTC, millisecond precision, `Z` suffix.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn recorder() -> PaymentRecorder {
        let store = PaymentStore::connect("sqlite::memory:", 1).await.unwrap();
        PaymentRecorder::new(store, IdempoCache::new())
    }

    #[tokio::test]
    async fn rejects_empty_fields_without_writing() {
        let r = recorder().await;
        let err = r
            .record(PaymentPayload::new("", "10"))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidPayload { field: "ccNumber" }));

        let err = r
            .record(PaymentPayload::new("4111111111111111", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidPayload { field: "amount" }));
        assert!(err.is_client_error());

        assert_eq!(r.store().count().await.unwrap(), 0);
        assert!(r.cache().is_empty());
    }

    #[tokio::test]
    async fn created_then_cache_hit_with_same_record() {
        let r = recorder().await;
        let p = PaymentPayload::new("4111111111111111", "9.99");

        let first = r.record(p.clone()).await.unwrap();
        assert_eq!(first.status, RecordStatus::Created);
        assert_eq!(first.fingerprint.as_str().len(), 64);
        assert_eq!(first.record.amount, "9.99");
        assert_eq!(first.record.id, first.fingerprint.as_str());

        let second = r.record(p).await.unwrap();
        assert_eq!(second.status, RecordStatus::CacheHit);
        assert_eq!(second.fingerprint, first.fingerprint);
        assert_eq!(second.record, first.record);
    }

    #[tokio::test]
    async fn cold_cache_falls_back_to_store() {
        let r = recorder().await;
        let p = PaymentPayload::new("5500000000000004", "12.50");
        let first = r.record(p.clone()).await.unwrap();

        // same store, fresh cache, as after a restart
        let cold = PaymentRecorder::new(r.store().clone(), IdempoCache::new());
        let second = cold.record(p).await.unwrap();
        assert_eq!(second.status, RecordStatus::StoreHit);
        assert_eq!(second.record.created_at, first.record.created_at);

        // the store hit filled the cache
        assert_eq!(
            cold.cache().get(&second.fingerprint).await,
            Some(second.record.clone())
        );
    }

    #[tokio::test]
    async fn cache_mirrors_store_after_record() {
        let r = recorder().await;
        for amount in ["1", "2", "1"] {
            let out = r
                .record(PaymentPayload::new("4111111111111111", amount))
                .await
                .unwrap();
            let cached = r.cache().get(&out.fingerprint).await;
            let stored = r.store().get(&out.fingerprint).await.unwrap();
            assert_eq!(cached, stored);
        }
        assert_eq!(r.store().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn lost_insert_race_adopts_stored_row() {
        let r = recorder().await;
        let p = PaymentPayload::new("4111111111111111", "77.00");
        let fp = fingerprint::derive(&p);

        // another writer lands the row after this caller's lookup missed
        r.store()
            .insert_if_absent(&fp, &p, "2024-01-01T00:00:00.000Z")
            .await
            .unwrap();
        assert!(r.cache().get(&fp).await.is_none());

        let out = r.create_or_adopt(fp.clone(), &p).await.unwrap();
        assert_eq!(out.status, RecordStatus::StoreHit);
        assert_eq!(out.record.created_at, "2024-01-01T00:00:00.000Z");
        assert_eq!(r.cache().get(&fp).await, Some(out.record.clone()));
        assert_eq!(r.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_or_adopt_creates_when_absent() {
        let r = recorder().await;
        let p = PaymentPayload::new("4111111111111111", "78.00");
        let fp = fingerprint::derive(&p);

        let out = r.create_or_adopt(fp.clone(), &p).await.unwrap();
        assert_eq!(out.status, RecordStatus::Created);
        assert_eq!(r.cache().get(&fp).await, Some(out.record));
    }

    #[test]
    fn timestamps_look_like_iso_millis() {
        let ts = now_iso();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn only_created_is_new() {
        assert!(RecordStatus::Created.is_created());
        assert!(!RecordStatus::StoreHit.is_created());
        assert!(!RecordStatus::CacheHit.is_created());
    }
}
