//! Pacing abstraction for the status-word poll loop.
//!
//! `MotorEngine::move_motor` polls the statusword once per second (§4.2.1
//! step 7). Depending on a trait instead of calling `tokio::time::sleep`
//! directly lets tests drive hundreds of simulated poll iterations
//! instantly instead of waiting on real wall-clock time.

use std::time::Duration;

/// A source of pacing delays for poll loops.
pub trait PollClock: Send + Sync {
    /// How long to wait between successive statusword reads.
    fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }

    /// Suspends for `duration`.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// The real-time clock used outside of tests: sleeps on the Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl PollClock for RealClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test clocks that never actually sleep, so property and scenario tests
/// can exercise thousands of poll iterations without real wall-clock time.
pub mod test_util {
    use super::PollClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A clock whose `sleep` returns immediately, counting how many times
    /// it was called (i.e. how many poll iterations elapsed).
    #[derive(Debug, Default)]
    pub struct InstantClock {
        ticks: AtomicUsize,
    }

    impl InstantClock {
        /// Creates a fresh, zeroed instant clock.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of times `sleep` has been called so far.
        #[must_use]
        pub fn ticks(&self) -> usize {
            self.ticks.load(Ordering::Relaxed)
        }
    }

    impl PollClock for InstantClock {
        async fn sleep(&self, _duration: Duration) {
            self.ticks.fetch_add(1, Ordering::Relaxed);
        }
    }
}
