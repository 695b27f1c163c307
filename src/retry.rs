//! Retry with exponential backoff for provider API operations
//!
//! Wraps any fallible async unit of work, keyed by a logical operation name
//! plus a canonical context fingerprint. Attempt state lives only while an
//! operation is failing; success clears it and, if retries happened, emits
//! a recovery event.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::Result;

/// Retry policy for provider API operations
///
/// Controls how many times a failed operation is re-attempted and how long
/// to wait between attempts using exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the initial call
    pub max_retries: u32,
    /// Base delay before the first retry (doubles each attempt)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Compute the delay before the k-th retry (1-based)
///
/// Follows `min(base_delay * 2^(k-1), max_delay)`. Deliberately jitter-free:
/// the rate governor already spaces call starts, so synchronized retries
/// cannot storm the provider.
#[must_use]
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let delay = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(exponent));
    delay.min(policy.max_delay)
}

/// Context key for retry de-duplication
///
/// Keys are held in a sorted map and serialized as canonical JSON, so two
/// contexts with the same entries always produce the same fingerprint
/// regardless of insertion order.
#[derive(Debug, Clone, Default)]
pub struct RetryContext {
    entries: BTreeMap<String, String>,
}

impl RetryContext {
    /// Create an empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key/value pair to the context
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    /// Canonical fingerprint of this context
    #[must_use]
    pub fn fingerprint(&self) -> String {
        // BTreeMap serializes in sorted key order
        serde_json::to_string(&self.entries).unwrap_or_default()
    }
}

/// Per-operation attempt state, kept only while an operation is failing
#[derive(Debug)]
struct AttemptState {
    /// Failures seen since the last success
    attempts: u32,
    /// When the current failure streak began
    first_failure: Instant,
}

/// Retry controller for provider API operations
///
/// Retries for one key are strictly sequential (a single `run` call drives
/// them); unrelated operations and contexts proceed independently.
#[derive(Debug, Default)]
pub struct Retrier {
    policy: RetryPolicy,
    attempts: Mutex<HashMap<String, AttemptState>>,
}

impl Retrier {
    /// Create a retry controller with the given policy
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Number of operations currently mid-retry
    #[must_use]
    pub fn pending(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Run `f`, retrying transient failures with exponential backoff
    ///
    /// Invokes `f` at most `max_retries + 1` times. Non-retryable errors
    /// propagate immediately; retryable errors propagate once attempts are
    /// exhausted. Either way the attempt-state entry is removed before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns the final error from `f` once retrying stops
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        context: &RetryContext,
        mut f: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = format!("{operation}:{}", context.fingerprint());

        loop {
            match f().await {
                Ok(value) => {
                    let recovered = self
                        .attempts
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .remove(&key);

                    if let Some(state) = recovered {
                        tracing::info!(
                            operation,
                            attempts = state.attempts,
                            failing_for_ms = state.first_failure.elapsed().as_millis() as u64,
                            "operation recovered after retries"
                        );
                    }

                    return Ok(value);
                }
                Err(err) => {
                    let attempt = {
                        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
                        let state = map.entry(key.clone()).or_insert_with(|| AttemptState {
                            attempts: 0,
                            first_failure: Instant::now(),
                        });
                        state.attempts += 1;
                        state.attempts
                    };

                    if !err.is_retryable() || attempt > self.policy.max_retries {
                        self.attempts
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .remove(&key);

                        if err.is_retryable() {
                            tracing::warn!(
                                operation,
                                attempts = attempt,
                                error = %err,
                                "retries exhausted"
                            );
                        }

                        return Err(err);
                    }

                    let delay = delay_for_attempt(&self.policy, attempt);
                    tracing::debug!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
