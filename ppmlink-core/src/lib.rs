//! Board-agnostic core of the PPM codec
//!
//! Everything here runs against the `ppmlink-hal` traits only:
//!
//! - Timing constants and their cycle-domain view
//! - Edge-triggered decoder and deadline-driven encoder
//! - Host bridges for read requests and frame updates
//! - A mailbox over any byte stream, using the message envelope
//! - Loop units tying a state machine, a bridge and the live frame together
//!
//! Nothing in this crate blocks or allocates once a unit has started.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bridge;
pub mod decoder;
pub mod encoder;
pub mod stream;
pub mod timing;
pub mod unit;

#[cfg(test)]
mod sim;

pub use bridge::{BridgeError, BridgeStats, DecoderBridge, EncoderBridge};
pub use decoder::{DecodeEvent, Decoder, DecoderStats};
pub use encoder::{Encoder, Segment, Transition};
pub use stream::{StreamError, StreamMailbox, StreamStats};
pub use timing::Timing;
pub use unit::{DecoderUnit, EncoderUnit};
