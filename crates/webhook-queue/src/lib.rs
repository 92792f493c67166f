//! Bounded handoff queue between the ingest endpoint and the delivery
//! worker pool.
//!
//! `async_channel` is used instead of `tokio::sync::mpsc` because the
//! queue has many consumers popping from the same channel, which `mpsc`
//! cannot express.

#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unused_must_use)]

use thiserror::Error;
use webhook_types::DeliveryTask;

/// One slot in the queue: either real work, or a sentinel telling one
/// worker to exit. Shutdown is modeled with sentinels rather than closing
/// the channel, since closing would be observed identically by every
/// consumer at once and the lifecycle controller needs to terminate
/// exactly N workers.
#[derive(Debug, Clone)]
pub enum QueueItem {
    /// A delivery task to dispatch.
    Task(DeliveryTask),
    /// Tells the worker that pops it to exit cleanly.
    End,
}

/// The queue is at capacity; the producer should reject the request
/// rather than block.
#[derive(Debug, Error)]
#[error("queue is at capacity")]
pub struct QueueFullError;

/// Fixed-capacity FIFO of [`QueueItem`]s. Push is non-blocking; pop is
/// async and blocks until an item is available.
#[derive(Debug, Clone)]
pub struct WebhookQueue {
    sender: async_channel::Sender<QueueItem>,
    receiver: async_channel::Receiver<QueueItem>,
}

impl WebhookQueue {
    /// Creates a queue holding at most `capacity` items.
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = async_channel::bounded(capacity);
        Self { sender, receiver }
    }

    /// Attempts to enqueue a task without blocking. Fails with
    /// [`QueueFullError`] if the queue is full or every receiver has
    /// dropped.
    pub fn try_push(&self, task: DeliveryTask) -> Result<(), QueueFullError> {
        self.sender.try_send(QueueItem::Task(task)).map_err(|_| QueueFullError)
    }

    /// Pushes an end sentinel, terminating exactly one worker's loop. The
    /// lifecycle controller pushes `N` of these to stop `N` workers.
    ///
    /// Unlike [`try_push`](Self::try_push), this blocks if the queue is
    /// momentarily full — shutdown must not be dropped by backpressure.
    pub async fn push_end(&self) {
        let _ = self.sender.send(QueueItem::End).await;
    }

    /// Pops the next item, waiting if the queue is empty. Returns `None`
    /// only once every sender has been dropped.
    pub async fn pop(&self) -> Option<QueueItem> {
        self.receiver.recv().await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(subscription_id: &str) -> DeliveryTask {
        DeliveryTask {
            subscription_id: subscription_id.to_string(),
            event_types: vec!["user.created".to_string()],
            payload: json!({"id": 1}),
        }
    }

    #[tokio::test]
    async fn push_then_pop_is_fifo() {
        let queue = WebhookQueue::bounded(4);
        queue.try_push(task("a")).unwrap();
        queue.try_push(task("b")).unwrap();
        match queue.pop().await {
            Some(QueueItem::Task(t)) => assert_eq!(t.subscription_id, "a"),
            other => panic!("unexpected {other:?}"),
        }
        match queue.pop().await {
            Some(QueueItem::Task(t)) => assert_eq!(t.subscription_id, "b"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn try_push_fails_once_full() {
        let queue = WebhookQueue::bounded(1);
        queue.try_push(task("a")).unwrap();
        assert!(queue.try_push(task("b")).is_err());
    }

    #[tokio::test]
    async fn end_sentinel_terminates_a_pop() {
        let queue = WebhookQueue::bounded(1);
        queue.push_end().await;
        assert!(matches!(queue.pop().await, Some(QueueItem::End)));
    }
}
