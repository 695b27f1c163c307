//! Rate governor enforcing a floor on outbound call cadence
//!
//! The provider budgets requests per day, so the engine guarantees a hard
//! minimum spacing between call *starts*, process-wide. The timestamp is
//! advanced when a slot is claimed, before the call runs, so the interval
//! is measured start-to-start and a slow response never earns extra budget.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Process-wide spacing floor for outbound provider calls
///
/// Concurrent callers queue for start slots behind the shared timestamp but
/// execute independently once released; a slow call delays nobody beyond
/// the floor spacing.
#[derive(Debug)]
pub struct RateGovernor {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateGovernor {
    /// Create a governor with the given minimum spacing between call starts
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait for a start slot, then invoke `f`
    pub async fn throttle<T, F, Fut>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let start = self.claim_slot().await;
        tokio::time::sleep_until(start).await;
        f().await
    }

    /// Claim the next start slot and advance the shared timestamp
    ///
    /// The lock is held only while computing the slot, never across the
    /// sleep or the governed call.
    async fn claim_slot(&self) -> Instant {
        let mut next = self.next_slot.lock().await;
        let now = Instant::now();
        let start = next.map_or(now, |slot| slot.max(now));
        *next = Some(start + self.min_interval);
        start
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn spaces_sequential_calls_by_min_interval() {
        let governor = RateGovernor::new(Duration::from_millis(1000));
        let base = Instant::now();

        let mut starts = Vec::new();
        for _ in 0..3 {
            let started = governor.throttle(|| async { Instant::now() }).await;
            starts.push(started);
        }

        assert_eq!(starts[0], base);
        assert_eq!(starts[1] - starts[0], Duration::from_millis(1000));
        assert_eq!(starts[2] - starts[1], Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_queue_for_slots() {
        let governor = Arc::new(RateGovernor::new(Duration::from_millis(500)));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let governor = Arc::clone(&governor);
            handles.push(tokio::spawn(async move {
                governor.throttle(|| async { Instant::now() }).await
            }));
        }

        let mut starts = Vec::new();
        for handle in handles {
            starts.push(handle.await.unwrap());
        }
        starts.sort();

        for pair in starts.windows(2) {
            assert!(
                pair[1] - pair[0] >= Duration::from_millis(500),
                "call starts too close: {:?}",
                pair[1] - pair[0]
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_calls_do_not_widen_spacing() {
        let governor = Arc::new(RateGovernor::new(Duration::from_millis(1000)));
        let base = Instant::now();

        // First call takes 3s to complete; the second should still start
        // 1s after the first *started*, not after it finished
        let slow = {
            let governor = Arc::clone(&governor);
            tokio::spawn(async move {
                governor
                    .throttle(|| async {
                        let started = Instant::now();
                        tokio::time::sleep(Duration::from_secs(3)).await;
                        started
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        let second_start = governor.throttle(|| async { Instant::now() }).await;
        let first_start = slow.await.unwrap();

        assert_eq!(first_start, base);
        assert_eq!(second_start - first_start, Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_passes_through() {
        let governor = RateGovernor::new(Duration::ZERO);
        let base = Instant::now();

        for _ in 0..5 {
            let started = governor.throttle(|| async { Instant::now() }).await;
            assert_eq!(started, base);
        }
    }
}
