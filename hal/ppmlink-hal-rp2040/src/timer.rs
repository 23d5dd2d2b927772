//! Cycle timer on the embassy time driver
//!
//! On the RP2040 the time driver runs off the 1 MHz system timer, so one
//! tick is one microsecond and [`TIMING`] resolves to `Timing::MICROSECOND`.

use embassy_time::{Instant, TICK_HZ};
use ppmlink_core::Timing;
use ppmlink_hal::CycleTimer;

/// Codec timing for the configured tick rate
pub const TIMING: Timing = Timing::new((TICK_HZ / 1_000_000) as u32);

/// Ticks since the last reset, saturating at `u32::MAX`
pub struct TickTimer {
    start: Instant,
}

impl TickTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for TickTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleTimer for TickTimer {
    fn reset(&mut self) {
        self.start = Instant::now();
    }

    fn elapsed(&self) -> u32 {
        let ticks = Instant::now().duration_since(self.start).as_ticks();
        ticks.min(u32::MAX as u64) as u32
    }

    fn lap(&mut self) -> u32 {
        let now = Instant::now();
        let ticks = now.duration_since(self.start).as_ticks();
        self.start = now;
        ticks.min(u32::MAX as u64) as u32
    }
}
