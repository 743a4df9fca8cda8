//! Bounded retry with exponential backoff and jitter.
//!
//! Two stock policies cover the transient classes the brokerage documents:
//! rate limiting (429, 3 attempts) and server errors (502/503/504, 4
//! attempts). Each class keeps its own attempt budget. Every other error
//! status propagates immediately without retry.

use std::time::Duration;

use rand::Rng;
use reqwest::RequestBuilder;
use tokio::time::sleep;
use tracing::warn;

use crate::error::{BrokerError, BrokerResult};
use fxgate_telemetry::metrics::API_RETRY_TOTAL;

/// Retry policy: a pure description of when and how long to wait.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// HTTP statuses this policy retries.
    pub retryable_statuses: &'static [u16],
    /// Base for exponential backoff in seconds.
    pub backoff_base: f64,
    /// Jitter as a fraction of the base wait.
    pub jitter_factor: f64,
}

impl RetryPolicy {
    /// Policy for 429 responses.
    pub fn rate_limit() -> Self {
        Self {
            max_attempts: 3,
            retryable_statuses: &[429],
            backoff_base: 1.0,
            jitter_factor: 0.2,
        }
    }

    /// Policy for transient server errors and network faults.
    pub fn server_error() -> Self {
        Self {
            max_attempts: 4,
            retryable_statuses: &[502, 503, 504],
            backoff_base: 1.0,
            jitter_factor: 0.2,
        }
    }

    /// Whether this policy retries the given status.
    pub fn retries(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Backoff before jitter for a 1-based attempt number.
    pub fn base_wait(&self, attempt: u32) -> f64 {
        self.backoff_base.powi(attempt.saturating_sub(1) as i32)
    }

    /// Wait time for a 1-based attempt number, jitter applied.
    pub fn wait_time(&self, attempt: u32) -> Duration {
        let base = self.base_wait(attempt);
        let jitter = rand::thread_rng().gen_range(-self.jitter_factor..=self.jitter_factor) * base;
        Duration::from_secs_f64((base + jitter).max(0.0))
    }
}

/// Send a request, retrying transient failures under the given policies.
///
/// Returns the final response for the caller to interpret; statuses outside
/// both retry sets (including non-retryable 4xx) are returned as-is.
pub async fn send_with_retry(
    builder: RequestBuilder,
    rate_limit: &RetryPolicy,
    server_error: &RetryPolicy,
) -> BrokerResult<reqwest::Response> {
    let mut rate_attempts = 1u32;
    let mut server_attempts = 1u32;

    loop {
        let request = builder.try_clone().ok_or_else(|| {
            BrokerError::MalformedResponse("request body is not cloneable".to_string())
        })?;

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();

                if rate_limit.retries(status) {
                    if rate_attempts >= rate_limit.max_attempts {
                        return Err(BrokerError::RetryExhausted {
                            attempts: rate_attempts,
                            status,
                        });
                    }
                    let wait = rate_limit.wait_time(rate_attempts);
                    warn!(
                        status,
                        attempt = rate_attempts,
                        max_attempts = rate_limit.max_attempts,
                        wait_s = wait.as_secs_f64(),
                        "Rate limited, retrying"
                    );
                    API_RETRY_TOTAL.with_label_values(&["rate_limit"]).inc();
                    rate_attempts += 1;
                    sleep(wait).await;
                    continue;
                }

                if server_error.retries(status) {
                    if server_attempts >= server_error.max_attempts {
                        return Err(BrokerError::RetryExhausted {
                            attempts: server_attempts,
                            status,
                        });
                    }
                    let wait = server_error.wait_time(server_attempts);
                    warn!(
                        status,
                        attempt = server_attempts,
                        max_attempts = server_error.max_attempts,
                        wait_s = wait.as_secs_f64(),
                        "Server error, retrying"
                    );
                    API_RETRY_TOTAL.with_label_values(&["server_error"]).inc();
                    server_attempts += 1;
                    sleep(wait).await;
                    continue;
                }

                return Ok(response);
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                // Network faults share the server-error budget.
                if server_attempts >= server_error.max_attempts {
                    return Err(BrokerError::Transport(e));
                }
                let wait = server_error.wait_time(server_attempts);
                warn!(
                    error = %e,
                    attempt = server_attempts,
                    wait_s = wait.as_secs_f64(),
                    "Network fault, retrying"
                );
                API_RETRY_TOTAL.with_label_values(&["network"]).inc();
                server_attempts += 1;
                sleep(wait).await;
            }
            Err(e) => return Err(BrokerError::Transport(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_policy_budgets() {
        assert_eq!(RetryPolicy::rate_limit().max_attempts, 3);
        assert_eq!(RetryPolicy::server_error().max_attempts, 4);
    }

    #[test]
    fn test_status_classification() {
        let rate = RetryPolicy::rate_limit();
        let server = RetryPolicy::server_error();

        assert!(rate.retries(429));
        assert!(!rate.retries(503));
        assert!(server.retries(502));
        assert!(server.retries(503));
        assert!(server.retries(504));
        // Permanent client errors are never retried by either class.
        assert!(!rate.retries(400));
        assert!(!server.retries(400));
        assert!(!server.retries(401));
    }

    #[test]
    fn test_base_wait_is_exponential() {
        let policy = RetryPolicy {
            max_attempts: 4,
            retryable_statuses: &[429],
            backoff_base: 2.0,
            jitter_factor: 0.2,
        };
        assert!((policy.base_wait(1) - 1.0).abs() < 1e-9);
        assert!((policy.base_wait(2) - 2.0).abs() < 1e-9);
        assert!((policy.base_wait(3) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_wait_time_stays_within_jitter_bounds() {
        let policy = RetryPolicy {
            max_attempts: 4,
            retryable_statuses: &[429],
            backoff_base: 2.0,
            jitter_factor: 0.2,
        };
        for _ in 0..100 {
            let wait = policy.wait_time(3).as_secs_f64();
            // base 4.0 +/- 20%
            assert!((3.2..=4.8).contains(&wait), "wait={wait}");
        }
    }
}
