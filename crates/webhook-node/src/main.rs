//! Boots the document store and cache clients, the delivery worker pool,
//! the log GC task, and the HTTP server; on a shutdown signal, drains the
//! queue and awaits every background task before exiting.

use std::sync::Arc;

use eyre::Context;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use webhook_cache::SubscriptionCache;
use webhook_gc::run_gc;
use webhook_http::{build_router, AppState};
use webhook_queue::WebhookQueue;
use webhook_service::SubscriptionService;
use webhook_store::{DeliveryLogger, SubscriptionStore};
use webhook_worker::{run_worker, RetryConfig};

mod config;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();
    tracing::info!(worker_count = config.worker_count, bind_addr = %config.bind_addr, "starting webhook-node");

    let db = webhook_db::connect_mongo(&config.mongo_uri, &config.db_name)
        .await
        .context("connecting to mongodb")?;
    let redis = webhook_db::connect_redis(&config.redis_url).await.context("connecting to redis")?;

    let store = SubscriptionStore::new(&db);
    let cache = SubscriptionCache::new(redis, config.cache_expiry_secs);
    let service = SubscriptionService::new(store, cache);
    let logger = DeliveryLogger::new(&db);
    let queue = WebhookQueue::bounded(config.queue_capacity);

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("building the outbound HTTP client")?;
    let retry_config = RetryConfig { intervals: config.retry_intervals(), request_timeout: config.request_timeout() };

    let mut handles = Vec::new();
    for worker_id in 0..config.worker_count {
        let worker_queue = queue.clone();
        let worker_service = service.clone();
        let worker_logger = logger.clone();
        let worker_client = client.clone();
        let worker_config = retry_config.clone();
        handles.push(tokio::spawn(async move {
            run_worker(worker_id, worker_queue, worker_service, worker_logger, worker_client, worker_config).await;
        }));
    }

    let gc_stop = Arc::new(Notify::new());
    let gc_handle = {
        let gc_logger = logger.clone();
        let gc_interval = config.gc_interval();
        let gc_retention = config.log_retention();
        let gc_stop = gc_stop.clone();
        tokio::spawn(async move {
            run_gc(gc_logger, gc_interval, gc_retention, gc_stop).await;
        })
    };

    let state = AppState { service, queue: queue.clone(), logger };
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding to {}", config.bind_addr))?;
    tracing::info!(bind_addr = %config.bind_addr, "listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await.context("serving HTTP")?;

    tracing::info!("shutdown signal received, draining queue");
    for _ in 0..config.worker_count {
        queue.push_end().await;
    }
    gc_stop.notify_one();

    for result in futures::future::join_all(handles).await {
        if let Err(err) = result {
            tracing::error!(error = %err, "delivery worker task panicked");
        }
    }
    if let Err(err) = gc_handle.await {
        tracing::error!(error = %err, "gc task panicked");
    }

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
