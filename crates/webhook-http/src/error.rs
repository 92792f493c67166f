use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use webhook_service::ServiceError;
use webhook_store::StoreError;

/// Every way a request into this surface can fail, mapped one-to-one onto
/// the taxonomy: `ClientBad`, `EmptyPatch`, `AuthFailure`, `NotFound`,
/// `NotSubscribed`, `Overloaded`, `StoreError`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input: 422.
    #[error("{0}")]
    ClientBad(String),
    /// A `PUT` patch with no fields set: 400, distinct from the create
    /// endpoint's 422 validation errors.
    #[error("patch has no fields to update")]
    EmptyPatch,
    /// Missing or mismatched signature: 403.
    #[error("{0}")]
    AuthFailure(&'static str),
    /// Subscription or delivery log absent: 404.
    #[error("{0}")]
    NotFound(&'static str),
    /// Event type not accepted by the subscription: 403.
    #[error("event not subscribed")]
    NotSubscribed,
    /// The handoff queue is at capacity: 503.
    #[error("queue is full")]
    Overloaded,
    /// The document store failed.
    #[error(transparent)]
    Store(#[from] ServiceError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(ServiceError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::ClientBad(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail.clone()),
            ApiError::EmptyPatch => (StatusCode::BAD_REQUEST, "patch has no fields to update".to_string()),
            ApiError::AuthFailure(detail) => (StatusCode::FORBIDDEN, detail.to_string()),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, detail.to_string()),
            ApiError::NotSubscribed => (StatusCode::FORBIDDEN, "Event not subscribed".to_string()),
            ApiError::Overloaded => (StatusCode::SERVICE_UNAVAILABLE, "Queue is full".to_string()),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store error serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
