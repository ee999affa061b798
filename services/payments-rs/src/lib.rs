// services/payments-rs/src/lib.rs

//! Exactly-once recording of payment submissions.
//!
//! A submission is identified by the SHA-256 fingerprint of its content. The
//! [`recorder::PaymentRecorder`] looks it up in an in-process cache, then in
//! the SQLite store, and finally performs an atomic create-if-absent insert,
//! so every caller with the same payload sees the same stored record.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod handlers;
pub mod idempo;
pub mod metrics;
pub mod recorder;
pub mod store;

pub use error::RecordError;
pub use fingerprint::{Fingerprint, PaymentPayload};
pub use idempo::{CachePolicy, IdempoCache};
pub use recorder::{PaymentRecorder, RecordStatus, Recorded};
pub use store::{InsertOutcome, PaymentRecord, PaymentStore};
