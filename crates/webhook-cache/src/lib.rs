//! Redis-backed read-through cache for subscriptions.
//!
//! Every operation here is best-effort: a Redis failure is logged and
//! degrades to a cache miss (`get`) or a no-op (`set`/`invalidate`), never
//! propagated. The cache is never the source of truth and nothing downstream
//! should distinguish "cache down" from "cache miss".

#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unused_must_use)]

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use webhook_types::Subscription;

const KEY_PREFIX: &str = "subscription:";

/// Read-through cache over a shared [`ConnectionManager`].
#[derive(Debug, Clone)]
pub struct SubscriptionCache {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl SubscriptionCache {
    /// Wraps a connection manager, caching entries for `ttl_secs` seconds.
    pub fn new(conn: ConnectionManager, ttl_secs: u64) -> Self {
        Self { conn, ttl_secs }
    }

    fn key(id: &str) -> String {
        format!("{KEY_PREFIX}{id}")
    }

    /// Returns the cached subscription, or `None` on a miss or any Redis
    /// error.
    pub async fn get(&self, id: &str) -> Option<Subscription> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = match conn.get(Self::key(id)).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(%id, error = %err, "cache get failed, treating as miss");
                return None;
            }
        };
        raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                tracing::warn!(%id, error = %err, "cached subscription was malformed, treating as miss");
                None
            }
        })
    }

    /// Caches `subscription` under its own id with this cache's TTL.
    pub async fn set(&self, subscription: &Subscription) {
        let mut conn = self.conn.clone();
        let raw = match serde_json::to_string(subscription) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize subscription for caching");
                return;
            }
        };
        if let Err(err) = conn
            .set_ex::<_, _, ()>(Self::key(&subscription.id), raw, self.ttl_secs)
            .await
        {
            tracing::warn!(id = %subscription.id, error = %err, "cache set failed");
        }
    }

    /// Evicts the cached entry for `id`, if any.
    pub async fn invalidate(&self, id: &str) {
        let mut conn = self.conn.clone();
        if let Err(err) = conn.del::<_, ()>(Self::key(id)).await {
            tracing::warn!(%id, error = %err, "cache invalidate failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_prefixed() {
        assert_eq!(SubscriptionCache::key("abc"), "subscription:abc");
    }
}
