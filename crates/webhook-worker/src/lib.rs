//! Delivery worker pool: pops tasks off the handoff queue and runs each
//! one through the retry state machine against its subscription's target
//! URL.

#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unused_must_use)]

use std::collections::BTreeSet;
use std::error::Error as StdError;
use std::time::Duration;

use chrono::Utc;
use tracing::instrument;
use webhook_queue::{QueueItem, WebhookQueue};
use webhook_service::SubscriptionService;
use webhook_store::DeliveryLogger;
use webhook_types::{Attempt, DeliveryLog, DeliveryTask, Subscription};

mod outcome;
pub use outcome::AttemptOutcome;

/// Backoff schedule and per-attempt timeout for the retry state machine.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before retry `i`, 0-indexed. Total attempts = `intervals.len() + 1`.
    pub intervals: Vec<Duration>,
    /// Per-attempt HTTP timeout.
    pub request_timeout: Duration,
}

impl RetryConfig {
    /// Total number of attempts this schedule allows (initial + retries).
    pub fn total_attempts(&self) -> usize {
        self.intervals.len() + 1
    }
}

/// Performs one worker's consume loop until it pops an [`QueueItem::End`]
/// sentinel or the queue closes.
pub async fn run_worker(
    worker_id: usize,
    queue: WebhookQueue,
    service: SubscriptionService,
    logger: DeliveryLogger,
    client: reqwest::Client,
    config: RetryConfig,
) {
    loop {
        let task = match queue.pop().await {
            Some(QueueItem::Task(task)) => task,
            Some(QueueItem::End) | None => {
                tracing::info!(worker_id, "worker stopping");
                return;
            }
        };

        let event_types: BTreeSet<String> = task.event_types.iter().cloned().collect();
        let event_filter = if event_types.is_empty() { None } else { Some(&event_types) };
        let subscription = match service.get(&task.subscription_id, event_filter).await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                tracing::warn!(
                    worker_id,
                    subscription_id = %task.subscription_id,
                    "subscription no longer accepts this task, dropping without a delivery log"
                );
                continue;
            }
            Err(err) => {
                tracing::error!(worker_id, error = %err, "failed to resolve subscription, dropping task");
                continue;
            }
        };

        let mut log = DeliveryLog::new(
            task.subscription_id.clone(),
            subscription.target_url.clone(),
            task.event_types.clone(),
            task.payload.clone(),
        );

        for attempt in deliver_with_retries(&client, &subscription, &task, &config).await {
            log.record(attempt);
        }
        log.mark_exhausted();

        if let Err(err) = logger.insert(&log).await {
            tracing::error!(worker_id, error = %err, delivery_id = %log.id, "failed to persist delivery log");
        }
    }
}

/// Runs the full retry state machine for one task against one
/// subscription, returning the complete attempt history.
#[instrument(skip_all, fields(subscription_id = %subscription.id, target_url = %subscription.target_url))]
pub async fn deliver_with_retries(
    client: &reqwest::Client,
    subscription: &Subscription,
    task: &DeliveryTask,
    config: &RetryConfig,
) -> Vec<Attempt> {
    let body = match serde_json::to_vec(&task.payload) {
        Ok(body) => body,
        Err(err) => {
            return vec![Attempt {
                timestamp: Utc::now(),
                attempt: 1,
                status_code: None,
                success: false,
                error: Some(format!("failed to serialize payload: {err}")),
            }];
        }
    };
    let signature = subscription.secret.as_deref().map(|secret| webhook_signature::sign(secret, &body));
    let event_header = task.event_types.join(",");

    let mut attempts = Vec::with_capacity(config.total_attempts());
    let total = config.total_attempts();
    for attempt_no in 1..=total {
        let outcome = perform_attempt(
            client,
            &subscription.target_url,
            body.clone(),
            &event_header,
            signature.as_deref(),
            config.request_timeout,
        )
        .await;

        let fatal = matches!(outcome, AttemptOutcome::Fatal { .. });
        let success = matches!(outcome, AttemptOutcome::Success { .. });
        let (status_code, error) = outcome.into_parts();
        attempts.push(Attempt {
            timestamp: Utc::now(),
            attempt: attempt_no as u32,
            status_code,
            success,
            error,
        });

        if success || fatal {
            break;
        }
        if attempt_no < total {
            tokio::time::sleep(config.intervals[attempt_no - 1]).await;
        }
    }
    attempts
}

async fn perform_attempt(
    client: &reqwest::Client,
    target_url: &str,
    body: Vec<u8>,
    event_header: &str,
    signature: Option<&str>,
    timeout: Duration,
) -> AttemptOutcome {
    let mut request = client
        .post(target_url)
        .timeout(timeout)
        .header("Content-Type", "application/json")
        .header("X-Webhook-Event", event_header)
        .body(body);
    if let Some(signature) = signature {
        request = request.header(webhook_signature::SIGNATURE_HEADER, signature);
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                AttemptOutcome::Success { status_code: status.as_u16() }
            } else {
                AttemptOutcome::Retryable {
                    status_code: Some(status.as_u16()),
                    error: status.canonical_reason().unwrap_or("non-2xx response").to_string(),
                }
            }
        }
        Err(err) => classify_error(&err),
    }
}

fn classify_error(err: &reqwest::Error) -> AttemptOutcome {
    if err.is_timeout() {
        return AttemptOutcome::Retryable { status_code: None, error: "Timeout".to_string() };
    }
    if err.is_connect() {
        if is_tls_certificate_error(err) {
            return AttemptOutcome::Fatal { error: "SSL certificate verification failed".to_string() };
        }
        return AttemptOutcome::Retryable { status_code: None, error: "Connection error".to_string() };
    }
    AttemptOutcome::Retryable { status_code: None, error: err.to_string() }
}

/// `reqwest` surfaces the TLS backend's own error text inside the source
/// chain; there is no typed variant for "the certificate didn't verify",
/// so this matches on the substrings both `native-tls` and `rustls` use.
fn is_tls_certificate_error(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if message.contains("certificate")
            || message.contains("CertificateVerification")
            || message.contains("UnknownIssuer")
            || message.contains("InvalidCertificate")
        {
            return true;
        }
        source = cause.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(intervals: Vec<Duration>) -> RetryConfig {
        RetryConfig { intervals, request_timeout: Duration::from_secs(2) }
    }

    fn task() -> DeliveryTask {
        DeliveryTask {
            subscription_id: "sub-1".to_string(),
            event_types: vec!["user.created".to_string()],
            payload: json!({"event": "user.created", "data": {"id": 123}}),
        }
    }

    #[tokio::test]
    async fn first_attempt_success_records_one_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let subscription = Subscription::new(format!("{}/hook", server.uri()), Default::default(), None);
        let attempts =
            deliver_with_retries(&reqwest::Client::new(), &subscription, &task(), &config(vec![Duration::from_millis(1)])).await;

        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].success);
        assert_eq!(attempts[0].status_code, Some(200));
    }

    #[tokio::test]
    async fn retries_until_exhausted_on_persistent_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let subscription = Subscription::new(format!("{}/hook", server.uri()), Default::default(), None);
        let intervals = vec![Duration::from_millis(1), Duration::from_millis(1)];
        let attempts = deliver_with_retries(&reqwest::Client::new(), &subscription, &task(), &config(intervals)).await;

        assert_eq!(attempts.len(), 3);
        assert!(attempts.iter().all(|a| !a.success));
        assert_eq!(attempts.last().unwrap().status_code, Some(500));
    }

    #[tokio::test]
    async fn succeeds_on_a_later_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let subscription = Subscription::new(format!("{}/hook", server.uri()), Default::default(), None);
        let intervals = vec![Duration::from_millis(1), Duration::from_millis(1)];
        let attempts = deliver_with_retries(&reqwest::Client::new(), &subscription, &task(), &config(intervals)).await;

        assert_eq!(attempts.len(), 2);
        assert!(!attempts[0].success);
        assert!(attempts[1].success);
    }

    #[tokio::test]
    async fn signs_body_when_subscription_has_a_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(wiremock::matchers::header_exists("X-Hub-Signature-256"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let subscription =
            Subscription::new(format!("{}/hook", server.uri()), Default::default(), Some("s3cr3t".to_string()));
        let attempts =
            deliver_with_retries(&reqwest::Client::new(), &subscription, &task(), &config(vec![Duration::from_millis(1)])).await;

        assert!(attempts[0].success);
    }
}
