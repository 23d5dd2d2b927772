use std::io::{self, Cursor, Read, Write};

use ppmlink_host::{ChannelFrame, Framing, HostError, Mode, PpmDevice, CHANNELS_SIZE};
use ppmlink_protocol::{
    Announcement, Message, MessageParser, DECODER_PORT, ENCODER_PORT, HOST_ENDPOINT, READ_TRIGGER,
};
use proptest::prelude::*;

/// In-memory device: canned bytes to read, everything written is kept
struct MockStream {
    incoming: Cursor<Vec<u8>>,
    written: Vec<u8>,
    /// Largest read handed out at once
    chunk: usize,
}

impl MockStream {
    fn new(incoming: Vec<u8>) -> Self {
        Self {
            incoming: Cursor::new(incoming),
            written: Vec::new(),
            chunk: usize::MAX,
        }
    }

    fn chunked(incoming: Vec<u8>, chunk: usize) -> Self {
        Self {
            chunk,
            ..Self::new(incoming)
        }
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.chunk);
        self.incoming.read(&mut buf[..len])
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn encoded(src: u16, dst: u16, payload: &[u8]) -> Vec<u8> {
    Message::new(src, dst, payload)
        .unwrap()
        .encode_to_vec()
        .unwrap()
        .to_vec()
}

fn parse_all(bytes: &[u8]) -> Vec<Message> {
    let mut parser = MessageParser::new();
    bytes
        .iter()
        .filter_map(|&b| parser.feed(b).ok().flatten())
        .collect()
}

fn sample_frame() -> ChannelFrame {
    ChannelFrame::from_values([
        1000, 1100, 1200, 1300, 1400, 1500, 1600, 1700, 1800, 1900, 2000, 1500,
    ])
}

#[test]
fn test_raw_read_sends_trigger_and_decodes() {
    let frame = sample_frame();
    let stream = MockStream::new(frame.to_payload().to_vec());
    let mut device = PpmDevice::from_stream(stream, Mode::Read, Framing::Raw);

    assert_eq!(device.read().unwrap(), frame);
    assert_eq!(device.into_inner().written, [READ_TRIGGER]);
}

#[test]
fn test_raw_read_short_reply() {
    let stream = MockStream::new(vec![0u8; 10]);
    let mut device = PpmDevice::from_stream(stream, Mode::Read, Framing::Raw);

    assert!(matches!(device.read(), Err(HostError::FrameLength { len: 10 })));
}

#[test]
fn test_raw_read_end_of_stream() {
    let mut device = PpmDevice::from_stream(MockStream::new(Vec::new()), Mode::Read, Framing::Raw);
    assert!(matches!(device.read(), Err(HostError::Closed)));
}

#[test]
fn test_raw_write() {
    let frame = sample_frame();
    let mut device = PpmDevice::from_stream(MockStream::new(Vec::new()), Mode::Write, Framing::Raw);

    assert_eq!(device.write(&frame).unwrap(), CHANNELS_SIZE);
    assert_eq!(device.into_inner().written, frame.to_payload());
}

#[test]
fn test_wrong_direction() {
    let mut reader = PpmDevice::from_stream(MockStream::new(Vec::new()), Mode::Read, Framing::Raw);
    assert!(matches!(
        reader.write(&sample_frame()),
        Err(HostError::WrongMode {
            opened: Mode::Read,
            requested: Mode::Write
        })
    ));
    assert!(reader.into_inner().written.is_empty());

    let mut writer = PpmDevice::from_stream(MockStream::new(Vec::new()), Mode::Write, Framing::Raw);
    assert!(matches!(writer.read(), Err(HostError::WrongMode { .. })));
}

#[test]
fn test_envelope_read_skips_announcement() {
    let frame = sample_frame();
    let announcement = Announcement::for_port(DECODER_PORT).to_message().unwrap();

    let mut incoming = announcement.encode_to_vec().unwrap().to_vec();
    incoming.extend(encoded(DECODER_PORT, HOST_ENDPOINT, &frame.to_payload()));

    let stream = MockStream::chunked(incoming, 7);
    let mut device = PpmDevice::from_stream(stream, Mode::Read, Framing::Envelope);
    assert_eq!(device.read().unwrap(), frame);

    let sent = parse_all(&device.into_inner().written);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].src, HOST_ENDPOINT);
    assert_eq!(sent[0].dst, DECODER_PORT);
    assert_eq!(sent[0].payload.as_slice(), &[READ_TRIGGER]);
}

#[test]
fn test_envelope_read_skips_garbage() {
    let frame = sample_frame();
    let mut incoming = vec![0x01, 0x02, 0xAA, 0xFF];
    incoming.extend(encoded(DECODER_PORT, HOST_ENDPOINT, &frame.to_payload()));

    let mut device =
        PpmDevice::from_stream(MockStream::new(incoming), Mode::Read, Framing::Envelope);
    assert_eq!(device.read().unwrap(), frame);
}

#[test]
fn test_envelope_read_closed_before_reply() {
    let incoming = encoded(DECODER_PORT, HOST_ENDPOINT, &[1, 2, 3])[..5].to_vec();
    let mut device =
        PpmDevice::from_stream(MockStream::new(incoming), Mode::Read, Framing::Envelope);
    assert!(matches!(device.read(), Err(HostError::Closed)));
}

#[test]
fn test_envelope_write() {
    let frame = sample_frame();
    let mut device =
        PpmDevice::from_stream(MockStream::new(Vec::new()), Mode::Write, Framing::Envelope);

    assert_eq!(device.write(&frame).unwrap(), CHANNELS_SIZE);

    let sent = parse_all(&device.into_inner().written);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].src, HOST_ENDPOINT);
    assert_eq!(sent[0].dst, ENCODER_PORT);
    assert_eq!(ChannelFrame::from_payload(&sent[0].payload), Ok(frame));
}

#[test]
fn test_close_flushes() {
    let device = PpmDevice::from_stream(MockStream::new(Vec::new()), Mode::Write, Framing::Raw);
    device.close().unwrap();
}

proptest! {
    #[test]
    fn prop_envelope_reply_any_chunking(values in any::<[u16; 12]>(), chunk in 1usize..40) {
        let frame = ChannelFrame::from_values(values);
        let incoming = encoded(DECODER_PORT, HOST_ENDPOINT, &frame.to_payload());

        let stream = MockStream::chunked(incoming, chunk);
        let mut device = PpmDevice::from_stream(stream, Mode::Read, Framing::Envelope);
        prop_assert_eq!(device.read().unwrap(), frame);
    }
}
