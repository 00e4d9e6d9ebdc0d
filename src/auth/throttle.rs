//! Lockout decisions over the attempt ledger.
//!
//! A `(username, ip)` pair is locked out while the number of failed attempts
//! in the trailing window is at least `max_attempts`. The count is read from
//! storage on every call, so several server processes always agree.
//!
//! - **Attempt Limit:** 20 failures per username and IP.
//! - **Window:** 1 hour, trailing.

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::{net::IpAddr, sync::Arc};
use tracing::debug;

use super::{attempts::AttemptLedger, clock::Clock};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;
pub const DEFAULT_WINDOW_SECONDS: u32 = 60 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottlePolicy {
    max_attempts: u32,
    window: TimeDelta,
}

impl ThrottlePolicy {
    #[must_use]
    pub fn new(max_attempts: u32, window_seconds: u32) -> Self {
        Self {
            max_attempts,
            window: TimeDelta::seconds(i64::from(window_seconds)),
        }
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn window(&self) -> TimeDelta {
        self.window
    }

    /// Oldest instant that still counts toward the window ending at `now`.
    #[must_use]
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    #[must_use]
    pub fn is_exceeded(&self, failures: i64) -> bool {
        failures >= i64::from(self.max_attempts)
    }
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW_SECONDS)
    }
}

pub struct Throttle {
    ledger: Arc<dyn AttemptLedger>,
    clock: Arc<dyn Clock>,
    policy: ThrottlePolicy,
}

impl Throttle {
    #[must_use]
    pub fn new(ledger: Arc<dyn AttemptLedger>, clock: Arc<dyn Clock>, policy: ThrottlePolicy) -> Self {
        Self {
            ledger,
            clock,
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> ThrottlePolicy {
        self.policy
    }

    /// Returns `true` when `(username, ip_address)` has used up its failures.
    ///
    /// # Errors
    /// Returns an error if the ledger cannot be read.
    pub async fn is_locked_out(&self, username: &str, ip_address: IpAddr) -> Result<bool> {
        let since = self.policy.window_start(self.clock.now());
        let failures = self
            .ledger
            .count_failures_since(username, ip_address, since)
            .await?;
        debug!(username, %ip_address, failures, "throttle window evaluated");
        Ok(self.policy.is_exceeded(failures))
    }
}
