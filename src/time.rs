//! Time abstraction for testability.
//!
//! This module provides a [`Sleeper`] trait so retry backoff can be driven by
//! the tokio timer in production and by instant or recording sleepers in
//! tests.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

/// Abstraction over waiting.
///
/// # Example
///
/// ```
/// use http_sender::time::{InstantSleeper, Sleeper};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// InstantSleeper.sleep(Duration::from_secs(60)).await; // returns immediately
/// # }
/// ```
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`.
    ///
    /// Dropping the returned future cancels the wait.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production sleeper backed by [`tokio::time::sleep`].
///
/// Honors tokio's paused clock, so tests using `start_paused` advance
/// instantly while keeping the requested ordering of timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that returns immediately and remembers every requested delay.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Creates a sleeper with an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the delays requested so far, in order.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(duration);
    }
}

impl<T: Sleeper> Sleeper for std::sync::Arc<T> {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        (**self).sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_advances_paused_clock() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(8)).await;
        assert!(start.elapsed() >= Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn instant_sleeper_does_not_wait() {
        let start = tokio::time::Instant::now();
        InstantSleeper.sleep(Duration::from_secs(8)).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn recording_sleeper_keeps_order() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_secs(2)).await;
        sleeper.sleep(Duration::from_secs(4)).await;

        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn arc_sleeper_shares_record() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let clone = Arc::clone(&sleeper);
        clone.sleep(Duration::from_secs(1)).await;

        assert_eq!(sleeper.delays(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn sleepers_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TokioSleeper>();
        assert_send_sync::<InstantSleeper>();
        assert_send_sync::<RecordingSleeper>();
    }
}
