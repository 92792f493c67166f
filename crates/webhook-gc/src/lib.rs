//! Periodic deletion of delivery logs past their retention horizon.

#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use webhook_store::DeliveryLogger;

/// Runs the GC loop until `stop` is notified. Each tick computes
/// `now - retention` and deletes every log created before it.
///
/// Racing the interval tick against the stop signal with `select!` (rather
/// than aborting the task from outside) means a shutdown never interrupts
/// an in-flight delete.
pub async fn run_gc(logger: DeliveryLogger, interval: Duration, retention: Duration, stop: Arc<Notify>) {
    let mut ticker = tokio::time::interval(interval);
    let retention = retention_as_chrono(retention);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let threshold = Utc::now() - retention;
                match logger.delete_older_than(threshold).await {
                    Ok(count) => tracing::info!(count, %threshold, "deleted expired delivery logs"),
                    Err(err) => tracing::error!(error = %err, "failed to delete expired delivery logs"),
                }
            }
            _ = stop.notified() => {
                tracing::info!("gc stopping");
                return;
            }
        }
    }
}

fn retention_as_chrono(retention: Duration) -> chrono::Duration {
    chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::hours(72))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_std_duration_to_chrono() {
        assert_eq!(retention_as_chrono(Duration::from_secs(3600)), chrono::Duration::hours(1));
    }

    #[test]
    fn falls_back_to_72_hours_on_overflow() {
        assert_eq!(retention_as_chrono(Duration::MAX), chrono::Duration::hours(72));
    }
}
