//! Bounded retry with exponential backoff and rate-limit cooldown signaling

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::backend::traits::BackendError;

/// Receiver for rate-limit cooldown signals.
///
/// Implemented by the admission queue; injected so the retry path can be
/// exercised in isolation with a recording stub.
pub trait CooldownGate: Send + Sync {
    fn trigger_cooldown(&self, duration: Duration);
}

/// Retry parameters for one logical generation call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first (total attempts = max_retries + 1)
    pub max_retries: u32,
    /// Base delay for transient-error backoff
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(3000),
        }
    }
}

/// Cooldown escalation schedule within one call's retry sequence, in seconds
const RATE_LIMIT_COOLDOWN_SECS: [u64; 3] = [15, 30, 60];

/// Cap on transient backoff between attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Upper bound of the random jitter added to retry delays
const JITTER_MS: u64 = 500;

/// Perform one logical backend call with bounded retry.
///
/// The callable is invoked up to `max_retries + 1` times. Every failure kind
/// is retryable within the budget; rate-limited failures additionally push an
/// escalating cooldown (15s/30s/60s) through the gate before the next
/// attempt, so concurrent callers back off as well. After the budget is
/// spent the last error is propagated unchanged.
pub async fn retry_generation<T, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
    gate: &dyn CooldownGate,
) -> std::result::Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, BackendError>>,
{
    let mut attempt = 0u32;
    let mut rate_limit_hits = 0usize;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let delay = match &err {
                    BackendError::RateLimited { retry_after } => {
                        let cooldown = Duration::from_secs(
                            RATE_LIMIT_COOLDOWN_SECS
                                [rate_limit_hits.min(RATE_LIMIT_COOLDOWN_SECS.len() - 1)],
                        );
                        gate.trigger_cooldown(cooldown);

                        let wait = if rate_limit_hits == 0 {
                            Duration::from_secs(15)
                        } else {
                            Duration::from_secs(30) + jitter()
                        };
                        rate_limit_hits += 1;

                        // A backend-advertised wait longer than ours wins.
                        match retry_after {
                            Some(advertised) => wait.max(*advertised),
                            None => wait,
                        }
                    }
                    BackendError::Transient(_) => {
                        transient_backoff(attempt, policy.base_delay) + jitter()
                    }
                };

                if attempt >= policy.max_retries {
                    error!(attempts = attempt + 1, error = %err, "generation attempts exhausted");
                    return Err(err);
                }

                warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "generation attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// `base * 2^attempt`, capped
fn transient_backoff(attempt: u32, base: Duration) -> Duration {
    let millis = (base.as_millis() as u64).saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(millis).min(MAX_BACKOFF)
}

fn jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..JITTER_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_millis(1000);
        assert_eq!(transient_backoff(0, base), Duration::from_millis(1000));
        assert_eq!(transient_backoff(1, base), Duration::from_millis(2000));
        assert_eq!(transient_backoff(2, base), Duration::from_millis(4000));
    }

    #[test]
    fn backoff_is_capped() {
        let base = Duration::from_millis(3000);
        assert_eq!(transient_backoff(10, base), MAX_BACKOFF);
    }

    #[test]
    fn jitter_stays_small() {
        for _ in 0..100 {
            assert!(jitter() < Duration::from_millis(JITTER_MS));
        }
    }
}
