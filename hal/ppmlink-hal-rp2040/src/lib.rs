//! RP2040 bindings of the ppmlink HAL traits
//!
//! - [`gpio`] wraps embassy GPIO drivers as codec pins
//! - [`timer`] counts embassy time ticks as cycles
//! - [`uart`] runs the host mailbox over a buffered UART, with the RP2040
//!   UART pin map used to check board wiring

#![no_std]

pub mod gpio;
pub mod timer;
pub mod uart;

pub use gpio::{CodecInput, CodecOutput};
pub use timer::{TickTimer, TIMING};
pub use uart::{uart_mailbox, UartId, UartMailbox};
