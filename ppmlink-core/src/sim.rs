//! Cycle-accurate simulation of the HAL for host tests
//!
//! A [`SimClock`] is shared by every simulated peripheral. Tests advance it
//! by a fixed number of cycles per loop iteration, which stands in for the
//! loop latency of a real unit.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use ppmlink_hal::{CycleTimer, Envelope, InputPin, Mailbox, OutputPin};

use crate::timing::{Timing, PULSE_WIDTH_US};

#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.0.get()
    }

    pub fn advance(&self, cycles: u64) {
        self.0.set(self.0.get() + cycles);
    }
}

/// Cycle counter that saturates at `u32::MAX`
#[derive(Debug)]
pub struct SimTimer {
    clock: SimClock,
    start: u64,
}

impl SimTimer {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            start: clock.now(),
        }
    }
}

impl CycleTimer for SimTimer {
    fn reset(&mut self) {
        self.start = self.clock.now();
    }

    fn elapsed(&self) -> u32 {
        (self.clock.now() - self.start).min(u32::MAX as u64) as u32
    }
}

/// Input pin replaying a list of `(cycle, level)` edges
#[derive(Debug)]
pub struct ScriptedInput {
    clock: SimClock,
    edges: Vec<(u64, bool)>,
    initial: bool,
}

impl ScriptedInput {
    pub fn new(clock: &SimClock, initial: bool, edges: Vec<(u64, bool)>) -> Self {
        Self {
            clock: clock.clone(),
            edges,
            initial,
        }
    }

    /// Cycle of the last scripted edge
    pub fn end(&self) -> u64 {
        self.edges.last().map(|&(t, _)| t).unwrap_or(0)
    }
}

impl InputPin for ScriptedInput {
    fn is_high(&mut self) -> bool {
        let now = self.clock.now();
        let idx = self.edges.partition_point(|&(t, _)| t <= now);
        if idx == 0 {
            self.initial
        } else {
            self.edges[idx - 1].1
        }
    }
}

/// Output pin that logs every level change with its cycle
#[derive(Debug, Clone)]
pub struct RecordingOutput {
    clock: SimClock,
    high: bool,
    log: Rc<RefCell<Vec<(u64, bool)>>>,
}

impl RecordingOutput {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            high: false,
            log: Rc::default(),
        }
    }

    /// Handle onto the edge log that survives moving the pin
    pub fn log(&self) -> Rc<RefCell<Vec<(u64, bool)>>> {
        self.log.clone()
    }
}

impl OutputPin for RecordingOutput {
    fn set_high(&mut self) {
        if !self.high {
            self.log.borrow_mut().push((self.clock.now(), true));
        }
        self.high = true;
    }

    fn set_low(&mut self) {
        if self.high {
            self.log.borrow_mut().push((self.clock.now(), false));
        }
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub src: u16,
    pub dst: u16,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// In-memory mailbox with an explicit kick flag
#[derive(Debug, Default)]
pub struct MockMailbox {
    pub ready_after: u32,
    pub kicked: bool,
    pub inbox: VecDeque<(u16, u16, Vec<u8>)>,
    pub outbox: Vec<SentMessage>,
    pub fail_sends: bool,
    pub fail_receive: bool,
    ready_polls: u32,
}

impl MockMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message from the host and raise the kick
    pub fn push(&mut self, src: u16, dst: u16, payload: &[u8]) {
        self.inbox.push_back((src, dst, payload.to_vec()));
        self.kicked = true;
    }

    pub fn ready_polls(&self) -> u32 {
        self.ready_polls
    }
}

impl Mailbox for MockMailbox {
    type Error = MockError;

    fn is_ready(&mut self) -> bool {
        self.ready_polls += 1;
        self.ready_polls > self.ready_after
    }

    fn take_kick(&mut self) -> bool {
        core::mem::take(&mut self.kicked)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<Envelope>, MockError> {
        if self.fail_receive {
            return Err(MockError);
        }
        Ok(self.inbox.pop_front().map(|(src, dst, payload)| {
            let len = payload.len().min(buf.len());
            buf[..len].copy_from_slice(&payload[..len]);
            Envelope { src, dst, len }
        }))
    }

    fn send(&mut self, src: u16, dst: u16, payload: &[u8]) -> Result<(), MockError> {
        if self.fail_sends {
            return Err(MockError);
        }
        self.outbox.push(SentMessage {
            src,
            dst,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

/// Builds PPM edge lists in microseconds
#[derive(Debug)]
pub struct Waveform {
    timing: Timing,
    t: u64,
    edges: Vec<(u64, bool)>,
}

impl Waveform {
    /// Waveform starting low at cycle `start`
    pub fn new(timing: Timing, start: u64) -> Self {
        Self {
            timing,
            t: start,
            edges: Vec::new(),
        }
    }

    fn hold(&mut self, level: bool, us: u32) -> &mut Self {
        self.edges.push((self.t, level));
        self.t += self.timing.us_to_cycles(us) as u64;
        self
    }

    pub fn high(&mut self, us: u32) -> &mut Self {
        self.hold(true, us)
    }

    pub fn low(&mut self, us: u32) -> &mut Self {
        self.hold(false, us)
    }

    /// One standard pulse followed by the rest for `value_us`
    pub fn channel(&mut self, value_us: u16) -> &mut Self {
        self.high(PULSE_WIDTH_US)
            .low(value_us as u32 - PULSE_WIDTH_US)
    }

    /// Channels, closing pulse, then `gap_us` of low
    pub fn frame(&mut self, values: &[u16], gap_us: u32) -> &mut Self {
        for &v in values {
            self.channel(v);
        }
        self.high(PULSE_WIDTH_US).low(gap_us)
    }

    pub fn now(&self) -> u64 {
        self.t
    }

    pub fn edges(&self) -> Vec<(u64, bool)> {
        self.edges.clone()
    }
}
