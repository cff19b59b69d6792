// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time abstraction so registries and the runner can be tested without wall-clock waits.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of the current time, both for durable UTC timestamps and for
/// monotonic elapsed-time measurements (progress ticks, lock staleness, etc).
pub trait Clock: Send + Sync {
    /// Current UTC time as RFC3339 with a trailing `Z`, second precision.
    fn now_rfc3339(&self) -> String;

    /// Monotonic instant, for measuring elapsed durations.
    fn now_instant(&self) -> Instant;
}

/// Real wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_rfc3339(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn now_instant(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests: both the UTC timestamp and the monotonic
/// instant advance only when told to.
#[derive(Clone)]
pub struct FakeClock {
    utc: Arc<Mutex<DateTime<Utc>>>,
    instant: Arc<Mutex<Instant>>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            utc: Arc::new(Mutex::new(start)),
            instant: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Advance both the UTC clock and the monotonic clock by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut utc = self.utc.lock().unwrap_or_else(|e| e.into_inner());
        *utc += chrono::Duration::seconds(secs);
        let mut instant = self.instant.lock().unwrap_or_else(|e| e.into_inner());
        *instant += std::time::Duration::from_secs(secs.max(0) as u64);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        let mut utc = self.utc.lock().unwrap_or_else(|e| e.into_inner());
        *utc = at;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(DateTime::from_timestamp(0, 0).unwrap_or_default())
    }
}

impl Clock for FakeClock {
    fn now_rfc3339(&self) -> String {
        let utc = self.utc.lock().unwrap_or_else(|e| e.into_inner());
        utc.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn now_instant(&self) -> Instant {
        *self.instant.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
