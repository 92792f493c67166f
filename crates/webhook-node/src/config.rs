use std::time::Duration;

use clap::Parser;

/// Runtime configuration, loaded from environment variables (optionally via
/// a `.env` file) with a CLI-flag override for every field.
#[derive(Debug, Clone, Parser)]
#[command(name = "webhook-node", about = "Webhook ingestion and delivery service")]
pub struct Config {
    /// MongoDB connection string.
    #[arg(long, env = "MONGO_URI", default_value = "mongodb://localhost:27017")]
    pub mongo_uri: String,

    /// MongoDB database name.
    #[arg(long, env = "DB_NAME", default_value = "webhooks")]
    pub db_name: String,

    /// Redis connection string.
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub redis_url: String,

    /// Number of delivery worker tasks.
    #[arg(long, env = "WORKER_COUNT", default_value_t = 10)]
    pub worker_count: usize,

    /// Per-attempt outbound HTTP timeout, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Backoff schedule between retries, in seconds.
    #[arg(long, env = "RETRY_INTERVALS", value_delimiter = ',', default_value = "10,30,60")]
    pub retry_intervals_secs: Vec<u64>,

    /// Subscription cache entry TTL, in seconds.
    #[arg(long, env = "CACHE_EXPIRY_SECONDS", default_value_t = 300)]
    pub cache_expiry_secs: u64,

    /// Delivery logs older than this are deleted by the GC.
    #[arg(long, env = "LOG_RETENTION_HOURS", default_value_t = 72)]
    pub log_retention_hours: i64,

    /// How often the GC sweeps for expired delivery logs, in seconds.
    #[arg(long, env = "CLEANUP_INTERVAL_SECONDS", default_value_t = 3600)]
    pub gc_interval_secs: u64,

    /// Maximum number of tasks the handoff queue will hold.
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = 1000)]
    pub queue_capacity: usize,

    /// Address the HTTP server binds to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind_addr: String,
}

impl Config {
    /// Loads configuration from `.env` (if present), the process
    /// environment, and the command line, in that order of increasing
    /// precedence.
    pub fn load() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            tracing::debug!(%err, "no .env file loaded");
        }
        Config::parse()
    }

    /// Per-attempt outbound HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The backoff schedule as `Duration`s.
    pub fn retry_intervals(&self) -> Vec<Duration> {
        self.retry_intervals_secs.iter().copied().map(Duration::from_secs).collect()
    }

    /// GC sweep interval.
    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs(self.gc_interval_secs)
    }

    /// Delivery log retention horizon.
    pub fn log_retention(&self) -> Duration {
        Duration::from_secs((self.log_retention_hours.max(0) as u64) * 3600)
    }
}
