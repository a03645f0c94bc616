// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wall clock abstraction
//!
//! The loop reads the current time for schedule evaluation and sleeps in
//! short ticks between cycles. Both go through [`Clock`] so tests can drive
//! the loop without real waits.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of wall-clock time and of blocking sleeps.
///
/// Implementations must be `Send + Sync`: the loop runs on its own thread.
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Block for `duration`. Called with the stop tick, never longer.
    fn sleep(&self, duration: Duration);
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Test clock with manual control.
///
/// Clones share the same time, so a test can keep a handle while the loop
/// owns another. Sleeping yields briefly in real time; with auto-advance
/// enabled it also moves the clock forward by the requested duration.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
    auto_advance: Arc<AtomicBool>,
}

impl ManualClock {
    /// Create a frozen clock at `epoch_secs`
    pub fn new(epoch_secs: i64) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(epoch_secs * 1000)),
            auto_advance: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every `sleep` advance the clock by its duration
    pub fn with_auto_advance(self) -> Self {
        self.auto_advance.store(true, Ordering::SeqCst);
        self
    }

    /// Advance time by `delta`
    pub fn advance(&self, delta: Duration) {
        self.millis
            .fetch_add(i64::try_from(delta.as_millis()).unwrap_or(i64::MAX), Ordering::SeqCst);
    }

    /// Set time to `epoch_secs` (may go backwards)
    pub fn set(&self, epoch_secs: i64) {
        self.millis.store(epoch_secs * 1000, Ordering::SeqCst);
    }

    /// Current time in epoch seconds
    pub fn epoch_secs(&self) -> i64 {
        self.millis.load(Ordering::SeqCst).div_euclid(1000)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }

    fn sleep(&self, duration: Duration) {
        if self.auto_advance.load(Ordering::SeqCst) {
            self.advance(duration);
        }
        thread::sleep(Duration::from_millis(1));
    }
}
