//! Bounded polling of eventually-consistent upstream state.
//!
//! One policy type drives both the long-poll endpoint clients wait on and the
//! retrieval worker's own "recording not ready yet" retries.

use std::future::Future;
use std::time::Duration;

/// Result of one poll attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Check<T> {
    Ready(T),
    NotYet,
}

/// Final result of a bounded poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Ready(T),
    TimedOut { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed,
    /// Double the delay after every attempt, never exceeding `cap`.
    Exponential { cap: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl PollPolicy {
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            backoff: Backoff::Fixed,
        }
    }

    /// Five-second checks for up to five minutes; used while a download is prepared.
    pub fn download() -> Self {
        Self::fixed(Duration::from_secs(5), 60)
    }

    /// Two-second checks for up to twenty seconds; used while a share link is prepared.
    pub fn share_link() -> Self {
        Self::fixed(Duration::from_secs(2), 10)
    }

    /// One attempt plus `retries` exponentially spaced retries (2 s base, 30 s cap).
    pub fn media_retry(retries: u32) -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: retries.saturating_add(1),
            backoff: Backoff::Exponential {
                cap: Duration::from_secs(30),
            },
        }
    }

    /// Delay after the given zero-based attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential { cap } => self
                .interval
                .checked_mul(2u32.saturating_pow(attempt))
                .map_or(cap, |delay| delay.min(cap)),
        }
    }

    /// Call `fetch` until it is ready or the attempt budget runs out.
    ///
    /// There is no delay before the first attempt or after the last one.
    pub async fn run<T, F, Fut>(&self, mut fetch: F) -> PollOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Check<T>>,
    {
        for attempt in 0..self.max_attempts {
            if let Check::Ready(value) = fetch().await {
                return PollOutcome::Ready(value);
            }
            if attempt + 1 < self.max_attempts {
                tokio::time::sleep(self.delay_after(attempt)).await;
            }
        }
        PollOutcome::TimedOut {
            attempts: self.max_attempts,
        }
    }
}
