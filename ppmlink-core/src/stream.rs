//! Mailbox over a byte stream
//!
//! Serial links carry no message boundaries, so every message travels in the
//! `ppmlink-protocol` envelope. [`StreamMailbox`] pulls whatever bytes are
//! ready without waiting, feeds them to a [`MessageParser`], and queues the
//! completed messages. A non-empty queue is the kick. When the queue is full
//! the oldest message is evicted.

use embedded_io::{Read, ReadReady, Write};
use heapless::Deque;
use ppmlink_hal::{Envelope, Mailbox};
use ppmlink_protocol::{Message, MessageError, MessageParser, MAX_MESSAGE_SIZE};

/// Messages buffered between two polls
pub const QUEUE_DEPTH: usize = 4;

const READ_CHUNK: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamError<E> {
    /// Underlying stream failed
    Io(E),
    /// Outbound message could not be framed
    Encode(MessageError),
}

/// Receive-side counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamStats {
    /// Oldest queued messages evicted to make room for newer ones
    pub dropped: u32,
    /// Envelopes discarded for a bad length or checksum
    pub framing_errors: u32,
    /// Read failures swallowed while polling for the kick
    pub read_errors: u32,
}

pub struct StreamMailbox<R, W> {
    rx: R,
    tx: W,
    parser: MessageParser,
    pending: Deque<Message, QUEUE_DEPTH>,
    stats: StreamStats,
}

impl<R, W> StreamMailbox<R, W>
where
    R: Read + ReadReady,
    W: Write<Error = R::Error>,
{
    pub fn new(rx: R, tx: W) -> Self {
        Self {
            rx,
            tx,
            parser: MessageParser::new(),
            pending: Deque::new(),
            stats: StreamStats::default(),
        }
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn rx_mut(&mut self) -> &mut R {
        &mut self.rx
    }

    pub fn tx(&self) -> &W {
        &self.tx
    }

    /// Parse every byte that is ready right now
    fn pump(&mut self) -> Result<(), R::Error> {
        let mut chunk = [0u8; READ_CHUNK];

        while self.rx.read_ready()? {
            let n = self.rx.read(&mut chunk)?;
            if n == 0 {
                break;
            }

            let mut bytes = &chunk[..n];
            while !bytes.is_empty() {
                let (used, result) = self.parser.feed_bytes(bytes);
                bytes = &bytes[used..];
                match result {
                    Ok(Some(message)) => {
                        // Oldest goes first so the latest update always survives
                        if self.pending.is_full() {
                            self.pending.pop_front();
                            self.stats.dropped = self.stats.dropped.wrapping_add(1);
                        }
                        let _ = self.pending.push_back(message);
                    }
                    Ok(None) => {}
                    Err(_) => {
                        self.stats.framing_errors = self.stats.framing_errors.wrapping_add(1)
                    }
                }
            }
        }

        Ok(())
    }
}

impl<R, W> Mailbox for StreamMailbox<R, W>
where
    R: Read + ReadReady,
    W: Write<Error = R::Error>,
{
    type Error = StreamError<R::Error>;

    fn take_kick(&mut self) -> bool {
        if self.pump().is_err() {
            self.stats.read_errors = self.stats.read_errors.wrapping_add(1);
            self.parser.reset();
        }
        !self.pending.is_empty()
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<Envelope>, Self::Error> {
        if self.pending.is_empty() {
            self.pump().map_err(StreamError::Io)?;
        }

        Ok(self.pending.pop_front().map(|message| {
            let len = message.payload.len().min(buf.len());
            buf[..len].copy_from_slice(&message.payload[..len]);
            Envelope {
                src: message.src,
                dst: message.dst,
                len,
            }
        }))
    }

    fn send(&mut self, src: u16, dst: u16, payload: &[u8]) -> Result<(), Self::Error> {
        let message = Message::new(src, dst, payload).map_err(StreamError::Encode)?;
        let mut out = [0u8; MAX_MESSAGE_SIZE];
        let len = message.encode(&mut out).map_err(StreamError::Encode)?;
        self.tx.write_all(&out[..len]).map_err(StreamError::Io)
    }
}
