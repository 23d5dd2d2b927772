//! ppmlink Hardware Abstraction Layer
//!
//! The codec core only ever touches hardware through the traits in this
//! crate, so the same decoder and encoder run on a real-time unit, on a
//! microcontroller, or inside a host-side simulation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ppmlink-core (decoder, encoder, bridge) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ppmlink-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ ppmlink-hal-  │       │  simulation   │
//! │    rp2040     │       │  (tests)      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::InputPin`], [`gpio::OutputPin`] - Digital I/O
//! - [`timer::CycleTimer`] - Free-running cycle counter
//! - [`mailbox::Mailbox`] - Host message channel

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod mailbox;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, OutputPin};
pub use mailbox::{Envelope, Mailbox};
pub use timer::CycleTimer;
