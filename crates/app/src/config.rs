//! Runtime configuration

use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::{database::TransactionLimits, retry::RetryPolicy};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Compact,

    /// One JSON object per event.
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Checkout and settlement tuning
#[derive(Debug, Clone, Args)]
pub struct CheckoutConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Longest wait for a cart, product or order row lock, in milliseconds
    #[arg(long, env = "CHECKOUT_LOCK_TIMEOUT_MS", default_value_t = 2_000)]
    pub lock_timeout_ms: u64,

    /// Longest single statement, in milliseconds
    #[arg(long, env = "CHECKOUT_STATEMENT_TIMEOUT_MS", default_value_t = 5_000)]
    pub statement_timeout_ms: u64,

    /// Deadline for a whole checkout or settlement call including retries, in milliseconds
    #[arg(long, env = "CHECKOUT_OPERATION_TIMEOUT_MS", default_value_t = 10_000)]
    pub operation_timeout_ms: u64,

    /// Attempts made for a call that keeps hitting concurrency conflicts
    #[arg(long, env = "CHECKOUT_RETRY_ATTEMPTS", default_value_t = 3)]
    pub retry_attempts: u32,

    /// Delay before the first retry, in milliseconds; doubles on each retry
    #[arg(long, env = "CHECKOUT_RETRY_BASE_DELAY_MS", default_value_t = 50)]
    pub retry_base_delay_ms: u64,
}

impl CheckoutConfig {
    #[must_use]
    pub fn transaction_limits(&self) -> TransactionLimits {
        TransactionLimits {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            statement_timeout: Duration::from_millis(self.statement_timeout_ms),
        }
    }

    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            ..RetryPolicy::default()
        }
    }
}

/// Load `.env` if present; missing files are ignored.
pub fn load_dotenv() {
    _ = dotenvy::dotenv();
}
