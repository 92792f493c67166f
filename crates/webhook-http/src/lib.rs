//! axum HTTP surface: subscriptions CRUD, event ingest, delivery-log
//! status, and health.

#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unused_must_use)]

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use webhook_service::SubscriptionService;
use webhook_store::DeliveryLogger;
use webhook_queue::WebhookQueue;

mod error;
mod health;
mod ingest;
mod status;
mod subscriptions;

pub use error::ApiError;

/// Shared handler state. Every field is itself a cheaply-cloneable handle
/// (a connection-backed client or a channel), so this whole struct is
/// `Clone` and handed to axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Composed subscription read/write surface.
    pub service: SubscriptionService,
    /// Bounded handoff queue the ingest endpoint pushes tasks onto.
    pub queue: WebhookQueue,
    /// Delivery log DAO, read by the status routes.
    pub logger: DeliveryLogger,
}

/// Builds the full router: ingest, subscriptions CRUD, delivery-log
/// status, health, and a root welcome route.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::welcome))
        .route("/health", get(health::health))
        .route("/ingest/{sub_id}", post(ingest::ingest))
        .route("/subscriptions", post(subscriptions::create).get(subscriptions::list))
        .route(
            "/subscriptions/{id}",
            get(subscriptions::get).put(subscriptions::update).delete(subscriptions::delete),
        )
        .route("/status/delivery-logs", get(status::list))
        .route("/status/delivery/{delivery_id}", get(status::find))
        .route("/status/delivery/subscription/{sub_id}", get(status::recent_for_subscription))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
