//! ppmlink host link protocol
//!
//! This crate defines what travels between a PPM codec unit and its host:
//! the 12-channel frame payload and the small envelope that carries it
//! over a byte stream.
//!
//! # Payload
//!
//! A channel frame is always 24 bytes on the wire, twelve little-endian
//! `u16` pulse widths in microseconds, index 0..11 matching RC channel 0..11.
//!
//! # Envelope
//!
//! Transports that do not preserve message boundaries (UART, tty devices)
//! wrap every message in:
//! ```text
//! ┌───────┬────────┬────────┬────────┬─────────────┬──────────┐
//! │ START │ LENGTH │ SRC    │ DST    │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 2B LE  │ 2B LE  │ 0–250B      │ 1B       │
//! └───────┴────────┴────────┴────────┴─────────────┴──────────┘
//! ```
//!
//! The decoder unit answers any message on its port with the current frame.
//! The encoder unit treats every message on its port as a frame update.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod channels;
pub mod endpoint;
pub mod message;

pub use channels::{
    clamp_channel, ChannelFrame, PayloadError, CHANNELS_SIZE, CHANNEL_CENTER_US, CHANNEL_MAX_US,
    CHANNEL_MIN_US, NUM_CHANNELS,
};
pub use endpoint::{
    Announcement, CHANNEL_NAME, DECODER_PORT, ENCODER_PORT, HOST_ENDPOINT, NAME_SERVICE_ENDPOINT,
    READ_TRIGGER,
};
pub use message::{
    Message, MessageError, MessageParser, MAX_MESSAGE_SIZE, MAX_PAYLOAD_SIZE, MESSAGE_START,
};
