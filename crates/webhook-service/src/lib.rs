//! Composes the subscription store and cache behind one read/write API.
//!
//! This is the only surface the HTTP layer and the worker pool use to touch
//! subscription data — neither ever talks to `webhook-store` or
//! `webhook-cache` directly.

#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unused_must_use)]

use std::collections::BTreeSet;

use thiserror::Error;
use webhook_cache::SubscriptionCache;
use webhook_store::{StoreError, SubscriptionStore};
use webhook_types::{Subscription, SubscriptionPatch};

/// Errors from the composed read/write surface. Cache failures never reach
/// here — only the store can fail a call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Composes [`SubscriptionStore`] (authoritative) and [`SubscriptionCache`]
/// (non-authoritative) behind a single read-through/write-through API.
#[derive(Debug, Clone)]
pub struct SubscriptionService {
    store: SubscriptionStore,
    cache: SubscriptionCache,
}

impl SubscriptionService {
    /// Wires a store and cache together.
    pub fn new(store: SubscriptionStore, cache: SubscriptionCache) -> Self {
        Self { store, cache }
    }

    /// Resolves a subscription by id, optionally requiring it to accept at
    /// least one of `event_types`.
    ///
    /// Cache hits and misses are filtered identically: the cache always
    /// holds the unfiltered record, and `event_types` filtering happens
    /// here, after the read, regardless of which path produced it.
    pub async fn get(
        &self,
        id: &str,
        event_types: Option<&BTreeSet<String>>,
    ) -> Result<Option<Subscription>, ServiceError> {
        let record = match self.cache.get(id).await {
            Some(record) => record,
            None => match self.store.find_by_id(id, None).await? {
                Some(record) => {
                    self.cache.set(&record).await;
                    record
                }
                None => return Ok(None),
            },
        };
        match event_types {
            Some(types) if !record.accepts(types) => Ok(None),
            _ => Ok(Some(record)),
        }
    }

    /// Creates a subscription and primes the cache with it.
    pub async fn create(&self, record: Subscription) -> Result<Subscription, ServiceError> {
        self.store.insert(&record).await?;
        self.cache.set(&record).await;
        Ok(record)
    }

    /// Lists subscriptions, bounded to `limit`.
    pub async fn list(&self, limit: i64) -> Result<Vec<Subscription>, ServiceError> {
        Ok(self.store.list(limit).await?)
    }

    /// Merges `patch` onto the stored record, persists it, and refreshes
    /// the cache with the merged record. Returns the merged record, or
    /// `None` if `id` doesn't exist.
    pub async fn update(
        &self,
        id: &str,
        patch: SubscriptionPatch,
    ) -> Result<Option<Subscription>, ServiceError> {
        let Some(existing) = self.store.find_by_id(id, None).await? else {
            return Ok(None);
        };
        let merged = patch.merge_onto(existing);
        self.store.update(id, &patch).await?;
        self.cache.set(&merged).await;
        Ok(Some(merged))
    }

    /// Deletes a subscription and evicts it from the cache. Returns `true`
    /// if a record was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        let removed = self.store.delete(id).await?;
        self.cache.invalidate(id).await;
        Ok(removed)
    }
}
