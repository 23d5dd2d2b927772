//! Message envelope encoding and decoding
//!
//! Envelope format:
//! - START (1 byte): 0xAA synchronization byte
//! - LENGTH (1 byte): payload length (0-250)
//! - SRC (2 bytes, LE): source endpoint
//! - DST (2 bytes, LE): destination endpoint
//! - PAYLOAD (0-250 bytes)
//! - CHECKSUM (1 byte): XOR of LENGTH, SRC, DST, and all PAYLOAD bytes

use heapless::Vec;

/// Envelope synchronization byte
pub const MESSAGE_START: u8 = 0xAA;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 250;

/// Envelope overhead (START + LENGTH + SRC + DST + CHECKSUM)
pub const ENVELOPE_SIZE: usize = 1 + 1 + 2 + 2 + 1;

/// Maximum complete envelope size
pub const MAX_MESSAGE_SIZE: usize = ENVELOPE_SIZE + MAX_PAYLOAD_SIZE;

/// Errors that can occur during envelope parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Length byte out of range
    InvalidLength,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Source endpoint
    pub src: u16,
    /// Destination endpoint
    pub dst: u16,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Message {
    /// Create a new message
    pub fn new(src: u16, dst: u16, payload: &[u8]) -> Result<Self, MessageError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| MessageError::PayloadTooLarge)?;

        Ok(Self {
            src,
            dst,
            payload: payload_vec,
        })
    }

    fn checksum(length: u8, src: u16, dst: u16, payload: &[u8]) -> u8 {
        let [s0, s1] = src.to_le_bytes();
        let [d0, d1] = dst.to_le_bytes();
        payload
            .iter()
            .fold(length ^ s0 ^ s1 ^ d0 ^ d1, |acc, &b| acc ^ b)
    }

    /// Encoded size of this message
    pub fn encoded_len(&self) -> usize {
        ENVELOPE_SIZE + self.payload.len()
    }

    /// Encode into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, MessageError> {
        let len = self.encoded_len();
        if buffer.len() < len {
            return Err(MessageError::BufferTooSmall);
        }

        let length = self.payload.len() as u8;
        let end = 6 + self.payload.len();

        buffer[0] = MESSAGE_START;
        buffer[1] = length;
        buffer[2..4].copy_from_slice(&self.src.to_le_bytes());
        buffer[4..6].copy_from_slice(&self.dst.to_le_bytes());
        buffer[6..end].copy_from_slice(&self.payload);
        buffer[end] = Self::checksum(length, self.src, self.dst, &self.payload);

        Ok(len)
    }

    /// Encode into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_MESSAGE_SIZE>, MessageError> {
        let mut buffer = [0u8; MAX_MESSAGE_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| MessageError::BufferTooSmall)?;
        Ok(vec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    WaitingForStart,
    WaitingForLength,
    /// Reading SRC and DST; holds bytes seen so far
    ReadingHeader(u8),
    ReadingPayload,
    WaitingForChecksum,
}

/// Incremental envelope parser
///
/// Feed bytes as they arrive; a complete message pops out once its checksum
/// byte is seen. Bytes outside an envelope are skipped, so the parser
/// resynchronizes on the next START after garbage or a bad checksum.
#[derive(Debug, Clone)]
pub struct MessageParser {
    state: ParseState,
    header: [u8; 4],
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    expected_length: u8,
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            header: [0; 4],
            buffer: Vec::new(),
            expected_length: 0,
        }
    }

    /// Drop any partial message
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.header = [0; 4];
        self.buffer.clear();
        self.expected_length = 0;
    }

    /// True while a message is partially received
    pub fn in_progress(&self) -> bool {
        self.state != ParseState::WaitingForStart
    }

    fn src(&self) -> u16 {
        u16::from_le_bytes([self.header[0], self.header[1]])
    }

    fn dst(&self) -> u16 {
        u16::from_le_bytes([self.header[2], self.header[3]])
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(message))` when a complete valid message is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on a parse error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Message>, MessageError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == MESSAGE_START {
                    self.state = ParseState::WaitingForLength;
                }
                Ok(None)
            }
            ParseState::WaitingForLength => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(MessageError::InvalidLength);
                }
                self.expected_length = byte;
                self.state = ParseState::ReadingHeader(0);
                Ok(None)
            }
            ParseState::ReadingHeader(n) => {
                self.header[n as usize] = byte;
                if n == 3 {
                    self.buffer.clear();
                    self.state = if self.expected_length == 0 {
                        ParseState::WaitingForChecksum
                    } else {
                        ParseState::ReadingPayload
                    };
                } else {
                    self.state = ParseState::ReadingHeader(n + 1);
                }
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Cannot overflow: expected_length was checked against capacity
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForChecksum;
                }
                Ok(None)
            }
            ParseState::WaitingForChecksum => {
                let expected = Message::checksum(
                    self.expected_length,
                    self.src(),
                    self.dst(),
                    &self.buffer,
                );

                if byte != expected {
                    self.reset();
                    return Err(MessageError::InvalidChecksum);
                }

                let message = Message {
                    src: self.src(),
                    dst: self.dst(),
                    payload: self.buffer.clone(),
                };

                self.reset();
                Ok(Some(message))
            }
        }
    }

    /// Feed multiple bytes
    ///
    /// Returns the first complete message and how many bytes were consumed
    /// to produce it. Bytes after that message are left for the caller.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (usize, Result<Option<Message>, MessageError>) {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.feed(byte) {
                Ok(None) => {}
                other => return (i + 1, other),
            }
        }
        (bytes.len(), Ok(None))
    }
}
