use std::env;
use std::time::Duration;

use dotenvy::dotenv;

use crate::retry::RetryConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Page size used when the caller does not pass a limit.
    pub default_page_size: usize,
    /// Hard cap applied to caller-supplied limits.
    pub max_page_size: usize,
    /// Maximum message content length in bytes.
    pub max_content_bytes: usize,
    /// Retry policy for the message append (the durability point).
    pub append_retry: RetryConfig,
    /// Retry policy for the catalog/directory fan-out writes.
    pub fanout_retry: RetryConfig,
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_millis(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(
        env::var(key)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default_ms),
    )
}

impl Config {
    pub fn from_env() -> Result<Self, crate::error::AppError> {
        dotenv().ok();

        let default_page_size = env_usize("MSGSTORE_DEFAULT_PAGE_SIZE", 20);
        let max_page_size = env_usize("MSGSTORE_MAX_PAGE_SIZE", 100);
        if default_page_size == 0 || default_page_size > max_page_size {
            return Err(crate::error::AppError::Config(
                "MSGSTORE_DEFAULT_PAGE_SIZE must be between 1 and MSGSTORE_MAX_PAGE_SIZE".into(),
            ));
        }
        let max_content_bytes = env_usize("MSGSTORE_MAX_CONTENT_BYTES", 4096);

        let append_retry = RetryConfig {
            max_retries: env_u32("MSGSTORE_APPEND_MAX_RETRIES", 3),
            initial_backoff: env_millis("MSGSTORE_APPEND_INITIAL_BACKOFF_MS", 50),
            max_backoff: env_millis("MSGSTORE_APPEND_MAX_BACKOFF_MS", 1_000),
            ..RetryConfig::default()
        };
        let fanout_retry = RetryConfig {
            max_retries: env_u32("MSGSTORE_FANOUT_MAX_RETRIES", 3),
            initial_backoff: env_millis("MSGSTORE_FANOUT_INITIAL_BACKOFF_MS", 50),
            max_backoff: env_millis("MSGSTORE_FANOUT_MAX_BACKOFF_MS", 2_000),
            ..RetryConfig::default()
        };

        Ok(Self {
            default_page_size,
            max_page_size,
            max_content_bytes,
            append_retry,
            fanout_retry,
        })
    }

    pub fn test_defaults() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            max_content_bytes: 4096,
            append_retry: RetryConfig {
                initial_backoff: Duration::from_millis(5),
                max_backoff: Duration::from_millis(20),
                jitter: false,
                ..RetryConfig::default()
            },
            fanout_retry: RetryConfig {
                initial_backoff: Duration::from_millis(5),
                max_backoff: Duration::from_millis(20),
                jitter: false,
                ..RetryConfig::default()
            },
        }
    }
}
