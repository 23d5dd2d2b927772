//! Host message bridges
//!
//! Both bridges are polled once per loop iteration and do nothing unless the
//! host raised its signal. When it did, every pending message is drained in
//! that same iteration:
//!
//! - [`DecoderBridge`] treats arrival as a read request. Message contents
//!   are ignored and exactly one reply carrying the live frame goes back,
//!   however many requests were queued.
//! - [`EncoderBridge`] treats each message as a full frame update. Updates
//!   apply in order, so the last valid one wins. Nothing is sent back.

use ppmlink_hal::Mailbox;
use ppmlink_protocol::{Announcement, ChannelFrame, MessageError, MAX_PAYLOAD_SIZE};

/// Bridge counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeStats {
    /// Read requests drained (decoder side)
    pub requests: u32,
    /// Frame replies sent (decoder side)
    pub replies: u32,
    /// Updates copied into the live frame (encoder side)
    pub updates_applied: u32,
    /// Updates dropped for having the wrong length (encoder side)
    pub updates_rejected: u32,
    pub send_errors: u32,
    pub receive_errors: u32,
}

/// Error from announcing a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError<E> {
    /// Announcement did not fit in a message
    Encode(MessageError),
    /// Mailbox refused the message
    Transport(E),
}

fn announce<M: Mailbox>(mailbox: &mut M, port: u16) -> Result<(), BridgeError<M::Error>> {
    let message = Announcement::for_port(port)
        .to_message()
        .map_err(BridgeError::Encode)?;
    mailbox
        .send(message.src, message.dst, &message.payload)
        .map_err(BridgeError::Transport)
}

/// Answers read requests with the current frame
pub struct DecoderBridge<M> {
    mailbox: M,
    port: u16,
    buf: [u8; MAX_PAYLOAD_SIZE],
    stats: BridgeStats,
}

impl<M: Mailbox> DecoderBridge<M> {
    pub fn new(mailbox: M, port: u16) -> Self {
        Self {
            mailbox,
            port,
            buf: [0; MAX_PAYLOAD_SIZE],
            stats: BridgeStats::default(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    pub fn mailbox_mut(&mut self) -> &mut M {
        &mut self.mailbox
    }

    /// Announce this bridge's port to the host name service
    pub fn announce(&mut self) -> Result<(), BridgeError<M::Error>> {
        announce(&mut self.mailbox, self.port)
    }

    /// Serve pending read requests
    ///
    /// Returns the number of requests drained. The reply goes from the last
    /// request's destination back to its source.
    pub fn poll(&mut self, frame: &ChannelFrame) -> usize {
        if !self.mailbox.take_kick() {
            return 0;
        }

        let mut drained = 0;
        let mut reply_to = None;
        loop {
            match self.mailbox.receive(&mut self.buf) {
                Ok(Some(envelope)) => {
                    drained += 1;
                    reply_to = Some((envelope.dst, envelope.src));
                }
                Ok(None) => break,
                Err(_) => {
                    self.stats.receive_errors = self.stats.receive_errors.wrapping_add(1);
                    break;
                }
            }
        }
        self.stats.requests = self.stats.requests.wrapping_add(drained as u32);

        if let Some((src, dst)) = reply_to {
            match self.mailbox.send(src, dst, &frame.to_payload()) {
                Ok(()) => self.stats.replies = self.stats.replies.wrapping_add(1),
                Err(_) => self.stats.send_errors = self.stats.send_errors.wrapping_add(1),
            }
        }

        drained
    }
}

/// Applies frame updates pushed by the host
pub struct EncoderBridge<M> {
    mailbox: M,
    port: u16,
    buf: [u8; MAX_PAYLOAD_SIZE],
    stats: BridgeStats,
}

impl<M: Mailbox> EncoderBridge<M> {
    pub fn new(mailbox: M, port: u16) -> Self {
        Self {
            mailbox,
            port,
            buf: [0; MAX_PAYLOAD_SIZE],
            stats: BridgeStats::default(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    pub fn mailbox_mut(&mut self) -> &mut M {
        &mut self.mailbox
    }

    /// Announce this bridge's port to the host name service
    pub fn announce(&mut self) -> Result<(), BridgeError<M::Error>> {
        announce(&mut self.mailbox, self.port)
    }

    /// Apply pending updates to `frame`
    ///
    /// Returns the number of messages drained, rejected ones included.
    /// A payload that is not exactly one frame long leaves `frame` as it was.
    pub fn poll(&mut self, frame: &mut ChannelFrame) -> usize {
        if !self.mailbox.take_kick() {
            return 0;
        }

        let mut drained = 0;
        loop {
            match self.mailbox.receive(&mut self.buf) {
                Ok(Some(envelope)) => {
                    drained += 1;
                    let len = envelope.len.min(self.buf.len());
                    match frame.overwrite_from(&self.buf[..len]) {
                        Ok(()) => {
                            self.stats.updates_applied = self.stats.updates_applied.wrapping_add(1)
                        }
                        Err(_) => {
                            self.stats.updates_rejected =
                                self.stats.updates_rejected.wrapping_add(1)
                        }
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    self.stats.receive_errors = self.stats.receive_errors.wrapping_add(1);
                    break;
                }
            }
        }

        drained
    }
}
