// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling
//!
//! Command results carry start timestamps and durations; the engine reads
//! them through [`Clock`] so tests can assert ordering without sleeping.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;
}

/// Real system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

struct FakeClockState {
    instant: Instant,
    epoch_ms: u64,
    /// Applied after every `epoch_ms()` read so consecutive reads are strictly ordered.
    tick: Duration,
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    state: Arc<Mutex<FakeClockState>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeClockState {
                instant: Instant::now(),
                epoch_ms: 1_000_000,
                tick: Duration::ZERO,
            })),
        }
    }

    /// A clock that moves forward by `tick` each time a timestamp is read.
    pub fn ticking(tick: Duration) -> Self {
        let clock = Self::new();
        clock.state.lock().tick = tick;
        clock
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.instant += duration;
        state.epoch_ms += duration.as_millis() as u64;
    }

    /// Set the epoch milliseconds value
    pub fn set_epoch_ms(&self, ms: u64) {
        self.state.lock().epoch_ms = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.state.lock().instant
    }

    fn epoch_ms(&self) -> u64 {
        let mut state = self.state.lock();
        let current = state.epoch_ms;
        let tick = state.tick;
        state.instant += tick;
        state.epoch_ms += tick.as_millis() as u64;
        current
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
