//! Mongo-backed subscription store and delivery logger.
//!
//! Two independent DAOs over the same [`mongodb::Database`] handle, each
//! responsible for one collection. Neither knows about the other or about
//! caching — that composition lives in `webhook-service`.

#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unused_must_use)]

mod delivery_logs;
mod error;
mod subscriptions;

pub use delivery_logs::DeliveryLogger;
pub use error::StoreError;
pub use subscriptions::SubscriptionStore;
