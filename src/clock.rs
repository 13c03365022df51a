// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Injectable time source.
//!
//! Every expiry computation in this crate asks a [`Clock`] for the current
//! time instead of reading the wall clock directly. Production code passes
//! [`SystemClock`]; tests pass a [`ManualClock`] and move it around.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// A source of the current UTC time.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// Current time as whole epoch seconds.
    fn now_secs(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Resolution is one second, matching the resolution of token timestamps.
#[derive(Debug)]
pub struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `at` (sub-second precision is dropped).
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            secs: AtomicI64::new(at.timestamp()),
        }
    }

    /// Create a clock frozen at the current wall-clock second.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Move the clock to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        self.secs.store(at.timestamp(), Ordering::SeqCst);
    }

    /// Move the clock by `by` (may be negative).
    pub fn advance(&self, by: Duration) {
        self.secs.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.secs.load(Ordering::SeqCst);
        DateTime::from_timestamp(secs, 0).unwrap_or_default()
    }
}
