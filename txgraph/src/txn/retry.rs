// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Retry policy for the post-commit phase

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff for conflict retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts including the first; 0 retries forever
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_backoff_ms: u64,

    /// Upper bound for a single delay
    pub max_backoff_ms: u64,

    /// Randomize each delay within its upper half
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff_ms: 1,
            max_backoff_ms: 100,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Retry until the attempt succeeds
    pub fn unbounded() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Single attempt, no retry
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Check if no further attempt is allowed after `attempts` failures
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let ceiling = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);

        let millis = if self.jitter && ceiling > 1 {
            let floor = ceiling / 2;
            fastrand::u64(floor..=ceiling)
        } else {
            ceiling
        };

        Duration::from_millis(millis)
    }
}
