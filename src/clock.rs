// Copyright (c) 2026 rezky_nightky

use std::time::Instant;

/// Monotonic millisecond counter, 32 bits wide, wraps at `u32::MAX`.
///
/// Mirrors the timing source of small microcontroller platforms, where the
/// uptime counter overflows after ~49.7 days and consumers are expected to
/// handle the wrap with modular arithmetic.
pub trait Clock {
    fn now_millis(&mut self) -> u32;
}

/// Elapsed milliseconds between two wrapping counter readings.
///
/// Modular subtraction covers the overflow case: with `last = u32::MAX - 5`
/// and `now = 10`, the result is `(MAX - last) + now + 1 = 16`.
pub fn elapsed_millis(last: u32, now: u32) -> u32 {
    now.wrapping_sub(last)
}

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

impl Clock for SystemClock {
    fn now_millis(&mut self) -> u32 {
        // Truncation to u32 gives the same wrap behavior as a hardware
        // millisecond counter.
        self.start.elapsed().as_millis() as u32
    }
}

#[cfg(test)]
pub struct ManualClock {
    pub now: u32,
}

#[cfg(test)]
impl ManualClock {
    pub fn at(now: u32) -> Self {
        Self { now }
    }

    pub fn advance(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_millis(&mut self) -> u32 {
        self.now
    }
}
