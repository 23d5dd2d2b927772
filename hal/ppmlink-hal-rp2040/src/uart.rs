//! Host mailbox over a buffered UART
//!
//! RP2040 has two UART peripherals. Each codec unit gets one, and the
//! buffered driver's interrupt handler fills the receive ring so the unit
//! loop only ever reads bytes that are already there.

use embassy_rp::uart::{BufferedUart, BufferedUartRx, BufferedUartTx};
use ppmlink_core::StreamMailbox;

/// Mailbox used by the firmware units
pub type UartMailbox = StreamMailbox<BufferedUartRx, BufferedUartTx>;

/// Split a buffered UART into a mailbox
pub fn uart_mailbox(uart: BufferedUart) -> UartMailbox {
    let (tx, rx) = uart.split();
    StreamMailbox::new(rx, tx)
}

/// UART peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Uart0,
    Uart1,
}

impl UartId {
    /// Whether `gpio` can carry this UART's TX
    pub const fn is_tx_pin(self, gpio: u8) -> bool {
        matches!(
            (self, gpio),
            (UartId::Uart0, 0 | 12 | 16 | 28) | (UartId::Uart1, 4 | 8 | 20 | 24)
        )
    }

    /// Whether `gpio` can carry this UART's RX
    pub const fn is_rx_pin(self, gpio: u8) -> bool {
        matches!(
            (self, gpio),
            (UartId::Uart0, 1 | 13 | 17 | 29) | (UartId::Uart1, 5 | 9 | 21 | 25)
        )
    }
}
