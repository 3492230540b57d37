use anyhow::Result;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::types::Frame;

/// Operator input observed between two presented frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSignal {
    /// Space: leave the current staging screen.
    Continue,
    /// Escape or window closed: abort the whole session.
    Cancel,
}

/// Anything that yields camera frames one at a time.
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame>;
}

/// A full-screen RGB8 surface plus the input channel that comes with it.
pub trait FrameSink {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Present a `width * height * 3` RGB buffer. May block until the next refresh.
    fn present(&mut self, rgb: &[u8]) -> Result<()>;
    /// Input gathered during the last `present`, if any.
    fn poll_signal(&mut self) -> Option<UserSignal>;
}

/// Seconds since the UNIX epoch.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock anchored once at construction and advanced by a monotonic
/// `Instant`, so readings never go backwards even if the system time is
/// adjusted mid-session.
pub struct SystemClock {
    origin: Instant,
    origin_epoch: f64,
}

impl SystemClock {
    pub fn new() -> Self {
        let origin_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            origin: Instant::now(),
            origin_epoch,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin_epoch + self.origin.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let mut prev = clock.now();
        for _ in 0..1000 {
            let t = clock.now();
            assert!(t >= prev);
            prev = t;
        }
        // Sanity: somewhere after 2020-01-01
        assert!(prev > 1_577_836_800.0);
    }
}
