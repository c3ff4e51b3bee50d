//! HTTP surface of the signing service.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;
use tracing::error;

use crate::error::SignError;
use crate::service::{SignRequest, SignResponse, SigningService};

/// Status code reported in the body of malformed-request responses.
pub const VALIDATION_ERROR_CODE: u32 = 10422;

pub fn create_router(service: Arc<SigningService>) -> Router {
    Router::new()
        .route("/", get(read_root))
        .route("/healthz", get(read_healthz))
        .route("/health", get(read_health))
        .route("/cert/sign", put(cert_sign))
        .with_state(service)
}

async fn read_root() -> Json<serde_json::Value> {
    Json(json!({ "msg": "Hello World" }))
}

async fn read_healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn read_health(State(service): State<Arc<SigningService>>) -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "node": service.node_name() }))
}

async fn cert_sign(
    State(service): State<Arc<SigningService>>,
    payload: Result<Json<SignRequest>, JsonRejection>,
) -> Result<Json<SignResponse>, ApiError> {
    let Json(request) = payload?;

    // Signing is CPU-bound; keep it off the async workers.
    let response = tokio::task::spawn_blocking(move || service.sign(&request))
        .await
        .map_err(|e| SignError::IssuanceFailure(e.to_string()))??;

    Ok(Json(response))
}

/// Errors as they leave the HTTP layer.
#[derive(Debug)]
pub enum ApiError {
    Sign(SignError),
    Rejection(JsonRejection),
}

impl From<SignError> for ApiError {
    fn from(err: SignError) -> Self {
        ApiError::Sign(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejection(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Rejection(rejection) => {
                let message = rejection.body_text().replace('\n', " ");
                error!(message = %message, "rejecting malformed signing request");
                let body = Json(json!({
                    "status_code": VALIDATION_ERROR_CODE,
                    "message": message,
                    "data": null,
                }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            ApiError::Sign(err) if err.is_client_error() => {
                let body = Json(json!({ "detail": err.to_string() }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            ApiError::Sign(err) => {
                error!(error = %err, "signing request failed");
                let body = Json(json!({ "detail": "certificate issuance failed" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
