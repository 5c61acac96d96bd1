//! Sliding-window delivery limiter.

use std::collections::VecDeque;
use tokio::time::{Duration, Instant};

/// Charged deliveries allowed per window.
pub const DEFAULT_LIMIT: usize = 30;
/// Window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Counts charged deliveries over a trailing window.
///
/// Timestamps are kept oldest first; an entry expires once it is a full
/// window old.
#[derive(Debug, Clone)]
pub struct Limiter {
    limit: usize,
    window: Duration,
    charges: VecDeque<Instant>,
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_WINDOW)
    }
}

impl Limiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            charges: VecDeque::with_capacity(limit),
        }
    }

    /// Whether another delivery may be attempted now.
    pub fn remaining_capacity(&mut self) -> bool {
        self.prune();
        self.charges.len() < self.limit
    }

    /// Record a charged delivery at the current instant.
    pub fn charge(&mut self) {
        self.charges.push_back(Instant::now());
    }

    /// Drop expired timestamps. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let now = Instant::now();
        let before = self.charges.len();
        while let Some(oldest) = self.charges.front() {
            if now.saturating_duration_since(*oldest) < self.window {
                break;
            }
            self.charges.pop_front();
        }
        before - self.charges.len()
    }

    /// Charges currently inside the window (as of the last prune).
    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
