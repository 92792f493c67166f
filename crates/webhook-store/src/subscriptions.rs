use std::collections::BTreeSet;

use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Collection;
use webhook_types::{Subscription, SubscriptionPatch};

use crate::error::StoreError;

/// Mongo-backed store for subscriptions, collection `subscriptions`,
/// primary key `_id`.
#[derive(Debug, Clone)]
pub struct SubscriptionStore {
    collection: Collection<Subscription>,
}

impl SubscriptionStore {
    /// Wraps an existing `subscriptions` collection handle.
    pub fn new(db: &mongodb::Database) -> Self {
        Self { collection: db.collection("subscriptions") }
    }

    /// Inserts a new subscription record.
    pub async fn insert(&self, subscription: &Subscription) -> Result<(), StoreError> {
        self.collection.insert_one(subscription).await?;
        Ok(())
    }

    /// Looks up a subscription by id. When `event_types` is supplied,
    /// requires the record's own event types to be empty (accepts
    /// anything) or to overlap `event_types` — a non-matching record is
    /// treated the same as absent.
    pub async fn find_by_id(
        &self,
        id: &str,
        event_types: Option<&BTreeSet<String>>,
    ) -> Result<Option<Subscription>, StoreError> {
        let filter = match event_types {
            Some(types) if !types.is_empty() => {
                let types: Vec<String> = types.iter().cloned().collect();
                doc! {
                    "_id": id,
                    "$or": [
                        { "event_types": { "$size": 0 } },
                        { "event_types": { "$in": types } },
                    ],
                }
            }
            _ => doc! { "_id": id },
        };
        Ok(self.collection.find_one(filter).await?)
    }

    /// Lists subscriptions, most recently inserted order is not
    /// guaranteed; bounded to `limit`.
    pub async fn list(&self, limit: i64) -> Result<Vec<Subscription>, StoreError> {
        let cursor = self.collection.find(doc! {}).limit(limit).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Applies a partial update. Returns `true` if a matching document was
    /// found (and possibly modified).
    pub async fn update(&self, id: &str, patch: &SubscriptionPatch) -> Result<bool, StoreError> {
        let mut set = doc! {};
        if let Some(target_url) = &patch.target_url {
            set.insert("target_url", target_url.as_str());
        }
        if let Some(event_types) = &patch.event_types {
            set.insert("event_types", event_types.iter().cloned().collect::<Vec<String>>());
        }
        let mut unset = doc! {};
        match &patch.secret {
            Some(Some(secret)) => {
                set.insert("secret", secret.as_str());
            }
            Some(None) => {
                unset.insert("secret", "");
            }
            None => {}
        }
        let mut update = doc! {};
        if !set.is_empty() {
            update.insert("$set", set);
        }
        if !unset.is_empty() {
            update.insert("$unset", unset);
        }
        if update.is_empty() {
            return Ok(self.find_by_id(id, None).await?.is_some());
        }
        let result = self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(result.matched_count > 0)
    }

    /// Deletes a subscription. Returns `true` if a record was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_empty_patch_builds_no_update_document() {
        let patch = SubscriptionPatch::default();
        assert!(patch.is_empty());
    }
}
