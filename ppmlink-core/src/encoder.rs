//! Timed PPM encoder
//!
//! Drives one output pin from a cycle-counter deadline. Every time the
//! deadline expires the pin toggles and the next segment is scheduled:
//!
//! - pin went high: a pulse of `PULSE_WIDTH_US`
//! - pin went low, channels left: the rest for the next channel
//!   (`clamp(value) - PULSE_WIDTH_US`)
//! - pin went low after the 12th channel: padding up to `FRAME_LENGTH_US`
//!
//! The loop only notices an expired deadline on its next iteration, so each
//! transition is late by some overshoot. That overshoot is subtracted from
//! the next deadline, which keeps every edge on the nominal schedule instead
//! of letting the error accumulate across the frame. Lateness beyond a whole
//! segment (a stalled loop) is carried into the following segments until it
//! is paid off.

use ppmlink_hal::{CycleTimer, OutputPin};
use ppmlink_protocol::{ChannelFrame, NUM_CHANNELS};

use crate::timing::Timing;

/// Kind of segment that starts at a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Segment {
    /// Pin high for the pulse width
    Pulse,
    /// Pin low for the rest that encodes `channel`
    Rest { channel: u8 },
    /// Pin low until the end of the frame
    Padding,
}

/// One scheduled segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub segment: Segment,
    /// Nominal length of the segment
    pub nominal_cycles: u32,
    /// Deadline actually armed (nominal less the lateness carried in)
    pub deadline_cycles: u32,
}

/// PPM encoder state machine
pub struct Encoder<P, T> {
    pin: P,
    timer: T,
    timing: Timing,
    /// Next channel to encode
    channel: usize,
    /// Nominal cycles scheduled since the current frame's first pulse
    frame_cycles: u32,
    deadline: u32,
    /// Lateness not yet absorbed by a shortened deadline
    debt: u32,
    frames: u32,
}

impl<P: OutputPin, T: CycleTimer> Encoder<P, T> {
    /// Create an encoder with the output low
    ///
    /// The deadline starts expired, so the first iteration raises the
    /// first pulse of a frame.
    pub fn new(mut pin: P, mut timer: T, timing: Timing) -> Self {
        pin.set_low();
        timer.reset();

        Self {
            pin,
            timer,
            timing,
            channel: 0,
            frame_cycles: 0,
            deadline: 0,
            debt: 0,
            frames: 0,
        }
    }

    /// Frames completed (padding scheduled)
    pub fn frames_sent(&self) -> u32 {
        self.frames
    }

    /// Index of the next channel to be encoded
    pub fn channel_index(&self) -> usize {
        self.channel
    }

    pub fn is_high(&self) -> bool {
        self.pin.is_set_high()
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Run one iteration, reading channel values from `frame`
    ///
    /// Returns the newly scheduled segment when the pin toggled.
    pub fn step(&mut self, frame: &ChannelFrame) -> Option<Transition> {
        let elapsed = self.timer.elapsed();
        if elapsed < self.deadline {
            return None;
        }

        self.timer.reset();
        let late = (elapsed - self.deadline).saturating_add(self.debt);

        let (segment, nominal_cycles) = if self.pin.toggle() {
            (Segment::Pulse, self.timing.pulse_width_cycles())
        } else {
            self.schedule_low(frame)
        };

        self.frame_cycles = self.frame_cycles.saturating_add(nominal_cycles);
        self.deadline = nominal_cycles.saturating_sub(late);
        self.debt = late.saturating_sub(nominal_cycles);

        Some(Transition {
            segment,
            nominal_cycles,
            deadline_cycles: self.deadline,
        })
    }

    fn schedule_low(&mut self, frame: &ChannelFrame) -> (Segment, u32) {
        if self.channel == 0 {
            // First low of the frame: only the opening pulse has been spent
            self.frame_cycles = self.timing.pulse_width_cycles();
        }

        if self.channel >= NUM_CHANNELS {
            self.channel = 0;
            self.frames = self.frames.wrapping_add(1);

            // Channels adding up past the frame length still get a sync gap
            let padding = self
                .timing
                .frame_length_cycles()
                .saturating_sub(self.frame_cycles)
                .max(self.timing.min_sync_gap_cycles());
            return (Segment::Padding, padding);
        }

        let index = self.channel;
        self.channel += 1;

        let value = frame.values()[index];
        (
            Segment::Rest {
                channel: index as u8,
            },
            self.timing.rest_cycles(value),
        )
    }
}
