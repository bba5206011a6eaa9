use std::time::Duration;

use campusqa_core::reputation::ReputationPolicy;

/// Default number of attempts for one read-modify-write unit.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base backoff between attempts, in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 10;

/// Default upper bound for one coordinator operation, in milliseconds.
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5000;

/// Retry, timeout, and reputation settings for the coordinator.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Attempts before a version conflict is surfaced as `Conflict`.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n * retry_backoff`.
    pub retry_backoff: Duration,
    /// Upper bound for one whole operation including retries.
    pub operation_timeout: Duration,
    pub policy: ReputationPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS),
            policy: ReputationPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load engine configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default |
    /// |----------------------------------|---------|
    /// | `VOTE_MAX_ATTEMPTS`              | `5`     |
    /// | `VOTE_RETRY_BACKOFF_MS`          | `10`    |
    /// | `OPERATION_TIMEOUT_MS`           | `5000`  |
    /// | `REPUTATION_REVERSE_ON_WITHDRAW` | `false` |
    pub fn from_env() -> Self {
        let max_attempts: u32 = std::env::var("VOTE_MAX_ATTEMPTS")
            .unwrap_or_else(|_| DEFAULT_MAX_ATTEMPTS.to_string())
            .parse()
            .expect("VOTE_MAX_ATTEMPTS must be a valid u32");

        let retry_backoff_ms: u64 = std::env::var("VOTE_RETRY_BACKOFF_MS")
            .unwrap_or_else(|_| DEFAULT_RETRY_BACKOFF_MS.to_string())
            .parse()
            .expect("VOTE_RETRY_BACKOFF_MS must be a valid u64");

        let operation_timeout_ms: u64 = std::env::var("OPERATION_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_OPERATION_TIMEOUT_MS.to_string())
            .parse()
            .expect("OPERATION_TIMEOUT_MS must be a valid u64");

        let reverse_on_withdraw: bool = std::env::var("REPUTATION_REVERSE_ON_WITHDRAW")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("REPUTATION_REVERSE_ON_WITHDRAW must be true or false");

        Self {
            max_attempts: max_attempts.max(1),
            retry_backoff: Duration::from_millis(retry_backoff_ms),
            operation_timeout: Duration::from_millis(operation_timeout_ms),
            policy: ReputationPolicy {
                reverse_on_withdraw,
                ..ReputationPolicy::default()
            },
        }
    }
}
