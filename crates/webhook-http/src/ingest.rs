use std::collections::BTreeSet;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use webhook_types::DeliveryTask;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IngestQuery {
    /// Comma-separated event type filter, e.g. `?event_types=a,b`.
    event_types: Option<String>,
}

impl IngestQuery {
    fn requested(&self) -> Option<BTreeSet<String>> {
        self.event_types.as_ref().map(|raw| {
            raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
        })
    }
}

/// `POST /ingest/{sub_id}`: authenticates and enqueues one inbound event.
///
/// The HMAC, when the subscription has a secret, is verified over the raw
/// request body bytes exactly as received — never a re-serialization —
/// so there is no canonicalization drift between what the producer signed
/// and what gets checked.
#[tracing::instrument(skip_all, fields(subscription_id = %sub_id))]
pub async fn ingest(
    State(state): State<AppState>,
    Path(sub_id): Path<String>,
    Query(query): Query<IngestQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state.service.get(&sub_id, None).await?.ok_or(ApiError::NotFound("Subscription not found"))?;

    if let Some(secret) = &subscription.secret {
        let header = headers
            .get(webhook_signature::SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());
        match header {
            None => return Err(ApiError::AuthFailure("Missing signature")),
            Some(header) if !webhook_signature::verify(secret, &body, header) => {
                return Err(ApiError::AuthFailure("Invalid signature"));
            }
            Some(_) => {}
        }
    }

    let payload: serde_json::Value =
        serde_json::from_slice(&body).map_err(|err| ApiError::ClientBad(format!("invalid JSON body: {err}")))?;

    let requested = query.requested();
    if let Some(requested) = &requested {
        if !subscription.accepts(requested) {
            return Err(ApiError::NotSubscribed);
        }
    }
    let event_types: Vec<String> = requested.unwrap_or_default().into_iter().collect();

    let task = DeliveryTask { subscription_id: sub_id, event_types, payload };
    state.queue.try_push(task).map_err(|_| ApiError::Overloaded)?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "detail": "Accepted" }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_splits_and_trims_comma_separated_list() {
        let query = IngestQuery { event_types: Some(" a, b ,c".to_string()) };
        let requested = query.requested().unwrap();
        assert_eq!(requested, ["a".to_string(), "b".to_string(), "c".to_string()].into_iter().collect());
    }

    #[test]
    fn absent_query_param_requests_nothing() {
        let query = IngestQuery::default();
        assert!(query.requested().is_none());
    }
}
