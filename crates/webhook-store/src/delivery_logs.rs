use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Collection;
use webhook_types::DeliveryLog;

use crate::error::StoreError;

/// Mongo-backed delivery attempt history, collection `delivery_logs`,
/// primary key `_id`, queried by `subscription_id` and sorted by
/// `created_at`.
#[derive(Debug, Clone)]
pub struct DeliveryLogger {
    collection: Collection<DeliveryLog>,
}

impl DeliveryLogger {
    /// Wraps an existing `delivery_logs` collection handle.
    pub fn new(db: &mongodb::Database) -> Self {
        Self { collection: db.collection("delivery_logs") }
    }

    /// Records a delivery log, complete with its final attempt history.
    pub async fn insert(&self, log: &DeliveryLog) -> Result<(), StoreError> {
        self.collection.insert_one(log).await?;
        Ok(())
    }

    /// Lists logs newest-first, optionally restricted to one subscription.
    /// A negative `limit` means unbounded.
    pub async fn list(
        &self,
        limit: i64,
        subscription_id: Option<&str>,
    ) -> Result<Vec<DeliveryLog>, StoreError> {
        let filter = match subscription_id {
            Some(id) => doc! { "subscription_id": id },
            None => doc! {},
        };
        let cursor = if limit < 0 {
            self.collection.find(filter).sort(doc! { "created_at": -1 }).await?
        } else {
            self.collection.find(filter).sort(doc! { "created_at": -1 }).limit(limit).await?
        };
        Ok(cursor.try_collect().await?)
    }

    /// Looks up one log by id.
    pub async fn find(&self, id: &str) -> Result<Option<DeliveryLog>, StoreError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// Deletes every log created before `threshold`. Returns the count
    /// removed, for the garbage collector's log line.
    pub async fn delete_older_than(&self, threshold: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = self
            .collection
            .delete_many(doc! { "created_at": { "$lt": threshold } })
            .await?;
        Ok(result.deleted_count)
    }
}
