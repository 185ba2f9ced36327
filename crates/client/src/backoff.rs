// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential reconnection backoff.
//!
//! Delay before retry `n` (zero-based) is `min(initial * 2^n, max_delay)`.
//! After `max_attempts` retries have been handed out, [`Backoff::next_delay`]
//! returns `None` until the policy is [`reset`](Backoff::reset) by a
//! successful connection.

use std::time::Duration;

/// Reconnection schedule with a hard attempt limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max_delay: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Backoff {
            initial,
            max_delay,
            max_attempts,
            attempt: 0,
        }
    }

    /// Delay for a given zero-based attempt, ignoring the attempt limit.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.initial.saturating_mul(factor).min(self.max_delay)
    }

    /// Hands out the next retry delay and advances the attempt counter.
    ///
    /// Returns `None` once the limit is reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let delay = self.delay_for(self.attempt);
        self.attempt += 1;
        Some(delay)
    }

    /// Retries handed out since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
