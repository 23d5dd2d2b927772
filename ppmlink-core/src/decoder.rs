//! Edge-triggered PPM decoder
//!
//! Samples one input pin per iteration and times the interval between
//! edges with a cycle counter that is restarted on every edge:
//!
//! ```text
//!        ┌──┐        ┌──┐            ┌──┐        ┌──┐
//!  ──────┘  └────────┘  └── ... ─────┘  └────────┘  └────
//!   gap   300   rest    300           300   gap
//!        └── ch0 ───┘└── ch1 ...
//! ```
//!
//! A rising edge closes one channel: its value is the rest that just ended
//! plus the pulse width. A rest longer than the frame-boundary threshold is
//! the inter-frame gap, which puts the next channel back at index 0. Frame
//! boundaries are found by timing alone, so the decoder resynchronizes on
//! the first gap after any dropped or malformed pulse.

use ppmlink_hal::{CycleTimer, InputPin};
use ppmlink_protocol::{clamp_channel, ChannelFrame, NUM_CHANNELS};

use crate::timing::{Timing, PULSE_WIDTH_US};

/// What one decoder iteration observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeEvent {
    /// Rising edge recorded a channel value (already clamped)
    Channel { index: u8, width_us: u16 },
    /// Rising edge after an inter-frame gap; next channel is index 0
    Resync,
    /// Falling edge ended a pulse longer than the tolerated width
    ///
    /// Reported only. The decoder keeps its channel index and relies on the
    /// next gap to resynchronize.
    MalformedPulse { width_us: u32 },
}

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderStats {
    /// Frames in which all 12 channels were recorded
    pub frames: u32,
    /// Inter-frame gaps seen
    pub gaps: u32,
    /// Over-long pulses seen
    pub malformed_pulses: u32,
}

/// PPM decoder state machine
pub struct Decoder<P, T> {
    pin: P,
    timer: T,
    timing: Timing,
    /// Index the next channel value is stored at
    channel: usize,
    last_high: bool,
    stats: DecoderStats,
}

impl<P: InputPin, T: CycleTimer> Decoder<P, T> {
    /// Create a decoder, sampling the current pin level as the last level
    pub fn new(mut pin: P, mut timer: T, timing: Timing) -> Self {
        let last_high = pin.is_high();
        timer.reset();

        Self {
            pin,
            timer,
            timing,
            channel: 0,
            last_high,
            stats: DecoderStats::default(),
        }
    }

    /// Index the next recorded channel will be stored at
    pub fn channel_index(&self) -> usize {
        self.channel
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Run one iteration against the live frame
    pub fn step(&mut self, frame: &mut ChannelFrame) -> Option<DecodeEvent> {
        // A full frame was recorded without a gap; the next edge is channel 0.
        if self.channel >= NUM_CHANNELS {
            self.channel = 0;
        }

        let high = self.pin.is_high();
        let was_high = core::mem::replace(&mut self.last_high, high);

        match (was_high, high) {
            (false, true) => Some(self.rising_edge(frame)),
            (true, false) => self.falling_edge(),
            _ => None,
        }
    }

    fn rising_edge(&mut self, frame: &mut ChannelFrame) -> DecodeEvent {
        let elapsed = self.timer.lap();

        if elapsed > self.timing.max_gap_cycles() {
            self.channel = 0;
            self.stats.gaps = self.stats.gaps.wrapping_add(1);
            return DecodeEvent::Resync;
        }

        // elapsed is at most the gap threshold, so this stays well inside u16
        let width_us = self.timing.cycles_to_us(elapsed) + PULSE_WIDTH_US;
        let width_us = clamp_channel(width_us as u16);

        let index = self.channel;
        frame.set(index, width_us);
        self.channel += 1;

        if self.channel == NUM_CHANNELS {
            self.stats.frames = self.stats.frames.wrapping_add(1);
        }

        DecodeEvent::Channel {
            index: index as u8,
            width_us,
        }
    }

    fn falling_edge(&mut self) -> Option<DecodeEvent> {
        let elapsed = self.timer.lap();

        if elapsed > self.timing.max_pulse_cycles() {
            self.stats.malformed_pulses = self.stats.malformed_pulses.wrapping_add(1);
            return Some(DecodeEvent::MalformedPulse {
                width_us: self.timing.cycles_to_us(elapsed),
            });
        }

        None
    }
}
