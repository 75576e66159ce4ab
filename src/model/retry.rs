//! Backoff delays and the sleep seam used between attempts.

use std::time::Duration;

use async_trait::async_trait;

/// Waits between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Delay before the retry that follows attempt `attempt` (zero-based):
/// `initial * 2^attempt`, saturating instead of overflowing.
pub fn retry_delay(initial: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    initial.saturating_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_doubles() {
        let initial = Duration::from_secs(1);
        assert_eq!(retry_delay(initial, 0), Duration::from_secs(1));
        assert_eq!(retry_delay(initial, 1), Duration::from_secs(2));
        assert_eq!(retry_delay(initial, 2), Duration::from_secs(4));
        assert_eq!(retry_delay(Duration::from_millis(250), 3), Duration::from_secs(2));
    }

    #[test]
    fn test_retry_delay_saturates() {
        assert_eq!(retry_delay(Duration::MAX, 1), Duration::MAX);
        assert_eq!(
            retry_delay(Duration::from_secs(1), 40),
            Duration::from_secs(u32::MAX as u64)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(3)).await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
