//! Polling loop units
//!
//! A unit owns one state machine, its bridge, and the live channel frame.
//! Each [`step`](DecoderUnit::step) polls the bridge and then runs the
//! timing logic, strictly in that order and on the same thread, so the frame
//! needs no locking.

use ppmlink_hal::{CycleTimer, InputPin, Mailbox, OutputPin};
use ppmlink_protocol::{ChannelFrame, CHANNEL_CENTER_US, DECODER_PORT, ENCODER_PORT};

use crate::bridge::{BridgeError, DecoderBridge, EncoderBridge};
use crate::decoder::{DecodeEvent, Decoder};
use crate::encoder::{Encoder, Transition};
use crate::timing::Timing;

fn wait_ready<M: Mailbox>(mailbox: &mut M) {
    while !mailbox.is_ready() {
        core::hint::spin_loop();
    }
}

/// Decoder loop serving read requests on [`DECODER_PORT`]
pub struct DecoderUnit<P, T, M> {
    decoder: Decoder<P, T>,
    bridge: DecoderBridge<M>,
    frame: ChannelFrame,
}

impl<P: InputPin, T: CycleTimer, M: Mailbox> DecoderUnit<P, T, M> {
    /// Channels read 1000 µs until the first frame is decoded
    pub fn new(pin: P, timer: T, mailbox: M, timing: Timing) -> Self {
        Self {
            decoder: Decoder::new(pin, timer, timing),
            bridge: DecoderBridge::new(mailbox, DECODER_PORT),
            frame: ChannelFrame::default(),
        }
    }

    /// Wait for the host, then announce the channel
    ///
    /// This is the only blocking call in the unit's lifetime.
    pub fn start(&mut self) -> Result<(), BridgeError<M::Error>> {
        wait_ready(self.bridge.mailbox_mut());
        self.bridge.announce()
    }

    pub fn step(&mut self) -> Option<DecodeEvent> {
        self.bridge.poll(&self.frame);
        self.decoder.step(&mut self.frame)
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    pub fn frame(&self) -> &ChannelFrame {
        &self.frame
    }

    pub fn decoder(&self) -> &Decoder<P, T> {
        &self.decoder
    }

    pub fn bridge(&self) -> &DecoderBridge<M> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut DecoderBridge<M> {
        &mut self.bridge
    }
}

/// Encoder loop taking frame updates on [`ENCODER_PORT`]
pub struct EncoderUnit<P, T, M> {
    encoder: Encoder<P, T>,
    bridge: EncoderBridge<M>,
    frame: ChannelFrame,
}

impl<P: OutputPin, T: CycleTimer, M: Mailbox> EncoderUnit<P, T, M> {
    /// All channels start centered
    pub fn new(pin: P, timer: T, mailbox: M, timing: Timing) -> Self {
        Self {
            encoder: Encoder::new(pin, timer, timing),
            bridge: EncoderBridge::new(mailbox, ENCODER_PORT),
            frame: ChannelFrame::splat(CHANNEL_CENTER_US),
        }
    }

    /// Wait for the host, then announce the channel
    pub fn start(&mut self) -> Result<(), BridgeError<M::Error>> {
        wait_ready(self.bridge.mailbox_mut());
        self.bridge.announce()
    }

    pub fn step(&mut self) -> Option<Transition> {
        self.bridge.poll(&mut self.frame);
        self.encoder.step(&self.frame)
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    pub fn frame(&self) -> &ChannelFrame {
        &self.frame
    }

    pub fn encoder(&self) -> &Encoder<P, T> {
        &self.encoder
    }

    pub fn bridge(&self) -> &EncoderBridge<M> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut EncoderBridge<M> {
        &mut self.bridge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{MockMailbox, RecordingOutput, ScriptedInput, SimClock, SimTimer, Waveform};
    use ppmlink_protocol::{HOST_ENDPOINT, NAME_SERVICE_ENDPOINT, READ_TRIGGER};

    const TIMING: Timing = Timing::new(10);

    #[test]
    fn test_start_waits_for_host_then_announces() {
        let clock = SimClock::new();
        let mut mailbox = MockMailbox::new();
        mailbox.ready_after = 3;
        let mut unit = DecoderUnit::new(
            ScriptedInput::new(&clock, false, Vec::new()),
            SimTimer::new(&clock),
            mailbox,
            TIMING,
        );

        unit.start().unwrap();
        let mailbox = unit.bridge().mailbox();
        assert_eq!(mailbox.ready_polls(), 4);
        assert_eq!(mailbox.outbox.len(), 1);
        assert_eq!(mailbox.outbox[0].src, DECODER_PORT);
        assert_eq!(mailbox.outbox[0].dst, NAME_SERVICE_ENDPOINT);
    }

    #[test]
    fn test_initial_frames() {
        let clock = SimClock::new();
        let decoder = DecoderUnit::new(
            ScriptedInput::new(&clock, false, Vec::new()),
            SimTimer::new(&clock),
            MockMailbox::new(),
            TIMING,
        );
        let encoder = EncoderUnit::new(
            RecordingOutput::new(&clock),
            SimTimer::new(&clock),
            MockMailbox::new(),
            TIMING,
        );

        assert_eq!(decoder.frame(), &ChannelFrame::splat(1000));
        assert_eq!(encoder.frame(), &ChannelFrame::splat(1500));
    }

    #[test]
    fn test_decoder_unit_serves_decoded_frame() {
        let values = [1000, 1100, 1200, 1300, 1400, 1500, 1600, 1700, 1800, 1900, 2000, 1500];
        let clock = SimClock::new();
        let mut wave = Waveform::new(TIMING, 0);
        wave.low(4000).frame(&values, 4000);

        let mut unit = DecoderUnit::new(
            ScriptedInput::new(&clock, false, wave.edges()),
            SimTimer::new(&clock),
            MockMailbox::new(),
            TIMING,
        );
        while clock.now() < wave.now() {
            clock.advance(1);
            unit.step();
        }

        unit.bridge_mut()
            .mailbox_mut()
            .push(HOST_ENDPOINT, DECODER_PORT, &[READ_TRIGGER]);
        clock.advance(1);
        unit.step();

        let reply = &unit.bridge().mailbox().outbox[0];
        assert_eq!(reply.dst, HOST_ENDPOINT);
        assert_eq!(
            ChannelFrame::from_payload(&reply.payload).unwrap(),
            ChannelFrame::from_values(values)
        );
    }

    #[test]
    fn test_encoder_to_decoder_through_host() {
        let update = [1050, 1150, 1250, 1350, 1450, 1550, 1650, 1750, 1850, 1950, 1000, 2000];

        // Host pushes an update to the encoder unit and lets it run
        let clock = SimClock::new();
        let pin = RecordingOutput::new(&clock);
        let log = pin.log();
        let mut encoder = EncoderUnit::new(pin, SimTimer::new(&clock), MockMailbox::new(), TIMING);
        encoder.bridge_mut().mailbox_mut().push(
            HOST_ENDPOINT,
            ENCODER_PORT,
            &ChannelFrame::from_values(update).to_payload(),
        );
        while clock.now() < 3 * 22_500 * 10 {
            clock.advance(1);
            encoder.step();
        }
        assert_eq!(encoder.frame(), &ChannelFrame::from_values(update));

        // Wire the recorded output into a decoder unit
        let edges = log.borrow().clone();
        let clock = SimClock::new();
        let input = ScriptedInput::new(&clock, false, edges);
        let end = input.end();
        let mut decoder =
            DecoderUnit::new(input, SimTimer::new(&clock), MockMailbox::new(), TIMING);
        while clock.now() <= end {
            clock.advance(1);
            decoder.step();
        }

        decoder
            .bridge_mut()
            .mailbox_mut()
            .push(HOST_ENDPOINT, DECODER_PORT, &[READ_TRIGGER]);
        decoder.step();
        let reply = &decoder.bridge().mailbox().outbox[0];
        let decoded = ChannelFrame::from_payload(&reply.payload).unwrap();
        for (got, want) in decoded.iter().zip(update) {
            assert!(got.abs_diff(want) <= 1, "{} vs {}", got, want);
        }
    }
}
