use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use webhook_types::{Subscription, SubscriptionPatch};

use crate::error::ApiError;
use crate::AppState;

const LIST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub target_url: String,
    #[serde(default)]
    pub event_types: BTreeSet<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubscriptionRequest {
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub event_types: Option<BTreeSet<String>>,
    #[serde(default)]
    pub secret: Option<String>,
}

fn normalize_target_url(raw: &str) -> Result<String, ApiError> {
    url::Url::parse(raw)
        .map(|url| url.to_string())
        .map_err(|err| ApiError::ClientBad(format!("invalid target_url: {err}")))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target_url = normalize_target_url(&request.target_url)?;
    let subscription = Subscription::new(target_url, request.event_types, request.secret);
    let created = state.service.create(subscription).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.service.get(&id, None).await? {
        Some(subscription) => Ok(Json(subscription)),
        None => Err(ApiError::NotFound("Subscription not found")),
    }
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let subscriptions = state.service.list(LIST_LIMIT).await?;
    Ok(Json(subscriptions))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSubscriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target_url = request.target_url.as_deref().map(normalize_target_url).transpose()?;
    let patch = SubscriptionPatch {
        target_url,
        event_types: request.event_types,
        secret: request.secret.map(Some),
    };
    if patch.is_empty() {
        return Err(ApiError::EmptyPatch);
    }
    match state.service.update(&id, patch).await? {
        Some(merged) => Ok(Json(merged)),
        None => Err(ApiError::NotFound("Subscription not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_trailing_slash_to_bare_domain() {
        assert_eq!(normalize_target_url("https://test.com").unwrap(), "https://test.com/");
    }

    #[test]
    fn normalize_rejects_unparseable_url() {
        assert!(normalize_target_url("not a url").is_err());
    }

    #[test]
    fn patch_with_only_secret_none_is_not_empty() {
        let patch = SubscriptionPatch { target_url: None, event_types: None, secret: Some(Some("s".into())) };
        assert!(!patch.is_empty());
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.service.delete(&id).await? {
        Ok(Json(json!({ "detail": "Subscription deleted" })))
    } else {
        Err(ApiError::NotFound("Subscription not found"))
    }
}
