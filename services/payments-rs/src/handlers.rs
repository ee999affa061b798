// services/payments-rs/src/handlers.rs

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::RecordError;
use crate::fingerprint::PaymentPayload;
use crate::metrics::{self, Metrics};
use crate::recorder::PaymentRecorder;
use crate::store::PaymentRecord;

pub const REQUIRED_FIELDS: &str = "ccNumber and amount are required.";
pub const FETCH_FAILED: &str = "Failed to fetch data";
pub const RECORD_FAILED: &str = "Failed to record payment";

#[derive(Clone)]
pub struct AppState {
    pub recorder: PaymentRecorder,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(recorder: PaymentRecorder, metrics: Metrics) -> Self {
        Self { recorder, metrics }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/payment", post(create_payment))
        .route("/all-data", get(all_data))
        .route("/metrics", get(metrics_text))
        .with_state(state)
}

// no Debug: carries the cleartext card number
#[derive(Default, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(rename = "ccNumber")]
    pub cc_number: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub uuid: String,
    pub data: PaymentRecord,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllDataResponse {
    pub cache: Vec<(String, PaymentRecord)>,
    pub database: Vec<PaymentRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: msg.to_string(),
        }),
    )
        .into_response()
}

pub async fn root() -> &'static str {
    "payments-rs is running"
}

pub async fn create_payment(
    State(state): State<AppState>,
    body: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!(%rejection, "unreadable payment body");
            state.metrics.observe(metrics::INVALID);
            return error_response(StatusCode::BAD_REQUEST, REQUIRED_FIELDS);
        }
    };

    let payload = PaymentPayload::new(
        req.cc_number.unwrap_or_default(),
        req.amount.unwrap_or_default(),
    );

    match state.recorder.record(payload).await {
        Ok(out) => {
            state.metrics.observe(out.status.as_str());
            let code = if out.status.is_created() {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let body = PaymentResponse {
                uuid: out.fingerprint.into_string(),
                data: out.record,
                message: out.status.message().to_string(),
            };
            (code, Json(body)).into_response()
        }
        Err(RecordError::InvalidPayload { .. }) => {
            state.metrics.observe(metrics::INVALID);
            error_response(StatusCode::BAD_REQUEST, REQUIRED_FIELDS)
        }
        Err(e @ RecordError::StorageFailure(_)) => {
            state.metrics.observe(metrics::STORAGE_FAILURE);
            error!(error = %e, "recording payment failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, RECORD_FAILED)
        }
    }
}

pub async fn all_data(State(state): State<AppState>) -> Response {
    let cache = state.recorder.cache().snapshot();
    match state.recorder.store().list_all().await {
        Ok(database) => Json(AllDataResponse { cache, database }).into_response(),
        Err(e) => {
            error!(error = %e, "error fetching data");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED)
        }
    }
}

pub async fn metrics_text(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
