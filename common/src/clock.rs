use std::time::Instant;

use crate::reading::TIMESTAMP_FORMAT;

/// Supplies monotonic loop time and, once synchronized, wall-clock time.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch. Wraps at `u32::MAX`; callers
    /// must compute intervals with `wrapping_sub`.
    fn now_ms(&self) -> u32;

    /// Formatted local time ([`TIMESTAMP_FORMAT`]), or `None` while no time
    /// synchronization has happened. Callers substitute a placeholder rather
    /// than failing the cycle.
    fn wall_clock(&self) -> Option<String>;
}

/// Host clock: process uptime for the monotonic part, the OS clock (assumed
/// synchronized) for wall time.
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wraparound: u128 millis modulo 2^32.
        self.started.elapsed().as_millis() as u32
    }

    fn wall_clock(&self) -> Option<String> {
        Some(chrono::Local::now().format(TIMESTAMP_FORMAT).to_string())
    }
}

#[test]
fn system_clock_formats_wall_time() {
    let clock = SystemClock::new();
    let formatted = clock.wall_clock().unwrap();

    // `DD-MM-YYYY | HH:MM:SS` is 21 characters with a pipe in the middle.
    assert_eq!(formatted.len(), 21);
    assert_eq!(&formatted[10..13], " | ");
}
