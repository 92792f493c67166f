use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use webhook_types::{DeliveryLog, FinalStatus};

use crate::error::ApiError;
use crate::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    limit: Option<i64>,
}

impl LimitQuery {
    fn limit_or_default(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default)
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = state.logger.list(query.limit_or_default(DEFAULT_LIST_LIMIT), None).await?;
    Ok(Json(logs))
}

pub async fn find(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let log = state.logger.find(&delivery_id).await?;
    match log {
        Some(log) => Ok(Json(log)),
        None => Err(ApiError::NotFound("Delivery log not found")),
    }
}

#[derive(Debug, Serialize)]
struct RenderedAttempt {
    timestamp: String,
    attempt: u32,
    status_code: Option<u16>,
    success: bool,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RenderedDeliveryLog {
    #[serde(rename = "_id")]
    id: String,
    subscription_id: String,
    target_url: String,
    event_types: Vec<String>,
    payload: Value,
    attempts: Vec<RenderedAttempt>,
    final_status: Option<FinalStatus>,
    created_at: String,
}

impl From<DeliveryLog> for RenderedDeliveryLog {
    fn from(log: DeliveryLog) -> Self {
        Self {
            id: log.id,
            subscription_id: log.subscription_id,
            target_url: log.target_url,
            event_types: log.event_types,
            payload: log.payload,
            attempts: log
                .attempts
                .into_iter()
                .map(|attempt| RenderedAttempt {
                    timestamp: attempt.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    attempt: attempt.attempt,
                    status_code: attempt.status_code,
                    success: attempt.success,
                    error: attempt.error,
                })
                .collect(),
            final_status: log.final_status,
            created_at: log.created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

pub async fn recent_for_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = state
        .logger
        .list(query.limit_or_default(DEFAULT_LIST_LIMIT), Some(&subscription_id))
        .await?;
    let rendered: Vec<RenderedDeliveryLog> = logs.into_iter().map(RenderedDeliveryLog::from).collect();
    Ok(Json(rendered))
}
