//! Shared data model for the webhook ingestion and delivery service.
//!
//! This crate has no I/O of its own: it is the set of value types that
//! `webhook-store`, `webhook-cache`, `webhook-queue`, `webhook-worker`, and
//! `webhook-http` all pass between each other.

#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unused_must_use)]

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod canonical;
pub use canonical::canonical_json;

mod patch;
pub use patch::SubscriptionPatch;

/// A registered delivery target: identity, target URL, event filter, and an
/// optional signing secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Opaque identifier, unique, assigned at creation. Never changes.
    #[serde(rename = "_id")]
    pub id: String,
    /// Absolute HTTP(S) target URL.
    pub target_url: String,
    /// Event types this subscription accepts. An empty set means "any".
    #[serde(default)]
    pub event_types: BTreeSet<String>,
    /// HMAC signing secret. When present, ingest requires a valid signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl Subscription {
    /// Creates a new subscription with a freshly generated id.
    pub fn new(target_url: String, event_types: BTreeSet<String>, secret: Option<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), target_url, event_types, secret }
    }

    /// Returns true if `types` overlaps this subscription's event types, or
    /// if this subscription's event types is empty (accepts anything).
    pub fn accepts(&self, types: &BTreeSet<String>) -> bool {
        self.event_types.is_empty() || !self.event_types.is_disjoint(types)
    }
}

/// An in-memory unit of work: one payload addressed to one subscription,
/// pending dispatch. Lives only inside the handoff queue and the worker
/// that eventually picks it up; never persisted.
#[derive(Debug, Clone)]
pub struct DeliveryTask {
    /// The subscription this payload is addressed to.
    pub subscription_id: String,
    /// The event types carried from ingest, used to re-confirm opt-in at
    /// dispatch time.
    pub event_types: Vec<String>,
    /// The parsed JSON payload.
    pub payload: serde_json::Value,
}

/// One outbound delivery try.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// When this attempt was made.
    pub timestamp: DateTime<Utc>,
    /// 1-based ordinal within the enclosing [`DeliveryLog`].
    pub attempt: u32,
    /// HTTP status code, if a response was received at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Whether this attempt was a success (2xx response).
    pub success: bool,
    /// Short error tag, absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Terminal outcome of a [`DeliveryLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalStatus {
    /// The last attempt succeeded.
    Success,
    /// No attempt succeeded and none will be tried again.
    Failed,
}

/// Durable record of one task's full attempt history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLog {
    /// New opaque identifier, distinct from the subscription id.
    #[serde(rename = "_id")]
    pub id: String,
    /// The subscription this delivery was addressed to.
    pub subscription_id: String,
    /// Snapshot of the target URL at dispatch time.
    pub target_url: String,
    /// Snapshot of the event types at dispatch time.
    pub event_types: Vec<String>,
    /// The payload that was delivered.
    pub payload: serde_json::Value,
    /// Ordered list of attempts, 1-indexed, strictly increasing timestamps.
    pub attempts: Vec<Attempt>,
    /// Terminal outcome; absent until the task reaches a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_status: Option<FinalStatus>,
    /// When this log entry was created (dispatch time).
    pub created_at: DateTime<Utc>,
}

impl DeliveryLog {
    /// Starts a new, empty delivery log for a task about to be dispatched.
    pub fn new(
        subscription_id: String,
        target_url: String,
        event_types: Vec<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            subscription_id,
            target_url,
            event_types,
            payload,
            attempts: Vec::new(),
            final_status: None,
            created_at: Utc::now(),
        }
    }

    /// Appends an attempt and, if it succeeded, marks the log `Success`.
    pub fn record(&mut self, attempt: Attempt) {
        if attempt.success {
            self.final_status = Some(FinalStatus::Success);
        }
        self.attempts.push(attempt);
    }

    /// Marks the log `Failed` if no attempt has already marked it `Success`.
    pub fn mark_exhausted(&mut self) {
        if self.final_status.is_none() {
            self.final_status = Some(FinalStatus::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_accepts_empty_filter_is_wildcard() {
        let sub = Subscription::new("https://example.com".into(), BTreeSet::new(), None);
        let requested: BTreeSet<String> = ["anything".to_string()].into_iter().collect();
        assert!(sub.accepts(&requested));
    }

    #[test]
    fn subscription_accepts_requires_overlap() {
        let types: BTreeSet<String> = ["a".to_string()].into_iter().collect();
        let sub = Subscription::new("https://example.com".into(), types, None);
        let requested: BTreeSet<String> = ["b".to_string()].into_iter().collect();
        assert!(!sub.accepts(&requested));
    }

    #[test]
    fn delivery_log_final_status_follows_last_attempt() {
        let mut log = DeliveryLog::new("sub".into(), "https://x".into(), vec![], serde_json::json!({}));
        log.record(Attempt { timestamp: Utc::now(), attempt: 1, status_code: Some(500), success: false, error: Some("500".into()) });
        assert!(log.final_status.is_none());
        log.record(Attempt { timestamp: Utc::now(), attempt: 2, status_code: Some(200), success: true, error: None });
        assert_eq!(log.final_status, Some(FinalStatus::Success));
    }

    #[test]
    fn delivery_log_mark_exhausted_only_when_no_success() {
        let mut log = DeliveryLog::new("sub".into(), "https://x".into(), vec![], serde_json::json!({}));
        log.record(Attempt { timestamp: Utc::now(), attempt: 1, status_code: Some(500), success: false, error: Some("500".into()) });
        log.mark_exhausted();
        assert_eq!(log.final_status, Some(FinalStatus::Failed));
    }
}
