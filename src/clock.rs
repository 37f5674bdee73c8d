//! Time sources for the search deadline

use std::time::{Duration, Instant};

/// Measures time elapsed since the search started
///
/// The search polls the clock once per interior node, so an implementation
/// that is not backed by real time can make deadlines fully reproducible.
pub trait Clock {
    /// Restarts the measurement from zero
    fn reset(&mut self);

    /// Time elapsed since the last reset
    fn elapsed(&mut self) -> Duration;
}

/// Wall-clock time
#[derive(Copy, Clone, Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn reset(&mut self) {
        self.start = Instant::now();
    }

    fn elapsed(&mut self) -> Duration {
        self.start.elapsed()
    }
}

/// A clock that advances by a fixed tick every time it is read
///
/// The n-th read after a reset returns `(n - 1) * tick`.
#[derive(Copy, Clone, Debug)]
pub struct TickClock {
    tick: Duration,
    now: Duration,
    reads: usize,
}

impl TickClock {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            now: Duration::from_secs(0),
            reads: 0,
        }
    }

    /// How many times the clock has been read since the last reset
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Clock for TickClock {
    fn reset(&mut self) {
        self.now = Duration::from_secs(0);
        self.reads = 0;
    }

    fn elapsed(&mut self) -> Duration {
        let now = self.now;
        self.now += self.tick;
        self.reads += 1;
        now
    }
}
