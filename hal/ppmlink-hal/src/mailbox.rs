//! Host message channel abstraction
//!
//! Models a message-oriented link to the host: the host raises a signal
//! ("kick") whenever it has queued one or more messages, and the unit drains
//! them without ever blocking.

/// Addressing and size of one received message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Envelope {
    /// Sender endpoint
    pub src: u16,
    /// Receiver endpoint
    pub dst: u16,
    /// Payload bytes copied into the caller's buffer
    pub len: usize,
}

/// Non-blocking host message channel
pub trait Mailbox {
    /// Error type for transport failures
    type Error;

    /// Whether the host side is up
    ///
    /// Units spin on this once at start-up, before their first iteration.
    fn is_ready(&mut self) -> bool {
        true
    }

    /// Check and clear the host signal
    ///
    /// Returns `true` if the host has queued messages since the last call.
    fn take_kick(&mut self) -> bool;

    /// Pop the next pending message into `buf`
    ///
    /// Returns `Ok(None)` once the queue is empty. Payload bytes beyond
    /// `buf.len()` are dropped and [`Envelope::len`] reports what was kept.
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<Envelope>, Self::Error>;

    /// Queue one message for the host
    fn send(&mut self, src: u16, dst: u16, payload: &[u8]) -> Result<(), Self::Error>;
}
