//! Connection wiring to the document store (MongoDB) and key/value cache
//! (Redis).
//!
//! This crate is deliberately thin: it owns no business logic, only the
//! handshake needed to hand a live client to the crates that do
//! (`webhook-store`, `webhook-cache`). It is the "external collaborator"
//! the core pipeline spec treats as given.

#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unused_must_use)]

use thiserror::Error;

/// Errors establishing a connection to a backing store.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// MongoDB client construction or initial ping failed.
    #[error("mongodb connection error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    /// Redis client construction or connection-manager handshake failed.
    #[error("redis connection error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Connects to MongoDB and returns the named database handle.
pub async fn connect_mongo(uri: &str, db_name: &str) -> Result<mongodb::Database, ConnectError> {
    let client = mongodb::Client::with_uri_str(uri).await?;
    let db = client.database(db_name);
    tracing::info!(%db_name, "connected to mongodb");
    Ok(db)
}

/// Connects to Redis via a multiplexed, auto-reconnecting connection
/// manager suitable for sharing across the worker pool.
pub async fn connect_redis(url: &str) -> Result<redis::aio::ConnectionManager, ConnectError> {
    let client = redis::Client::open(url)?;
    let manager = redis::aio::ConnectionManager::new(client).await?;
    tracing::info!("connected to redis");
    Ok(manager)
}
