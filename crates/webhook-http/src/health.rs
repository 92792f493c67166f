use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn welcome() -> Json<Value> {
    Json(json!({ "detail": "Webhook ingestion and delivery service" }))
}
