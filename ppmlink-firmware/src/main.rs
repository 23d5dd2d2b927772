//! ppmlink - PPM codec firmware
//!
//! Runs both codec units on one RP2040:
//!
//! - core 0: decoder unit, timing the PPM input and answering read
//!   requests on UART0
//! - core 1: encoder unit, generating the PPM output and taking frame
//!   updates on UART1
//!
//! The units share nothing. Embassy is only used to bring the chip up; once
//! a unit enters its loop it polls forever and never yields.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ppmlink_core::{DecoderUnit, EncoderUnit};
use ppmlink_hal_rp2040::{uart_mailbox, CodecInput, CodecOutput, TickTimer, UartId, TIMING};
use ppmlink_protocol::{DECODER_PORT, ENCODER_PORT};

#[macro_use]
mod board;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

// Same UART pin map build.rs enforces on board.toml
const _: () = assert!(UartId::Uart0.is_tx_pin(board::DECODER_UART_TX_PIN));
const _: () = assert!(UartId::Uart0.is_rx_pin(board::DECODER_UART_RX_PIN));
const _: () = assert!(UartId::Uart1.is_tx_pin(board::ENCODER_UART_TX_PIN));
const _: () = assert!(UartId::Uart1.is_rx_pin(board::ENCODER_UART_RX_PIN));

const UART_BUF_SIZE: usize = 256;
const CORE1_STACK_SIZE: usize = 4096;

// Static cells for UART buffers (must live forever)
static DECODER_TX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();
static DECODER_RX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();
static ENCODER_TX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();
static ENCODER_RX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();

static CORE1_STACK: StaticCell<Stack<CORE1_STACK_SIZE>> = StaticCell::new();

fn uart_config() -> UartConfig {
    let mut config = UartConfig::default();
    config.baudrate = board::UART_BAUDRATE;
    config
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("ppmlink firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!(
        "Timing: {} cycles/us, baudrate {}",
        TIMING.cycles_per_us(),
        board::UART_BAUDRATE
    );

    // Encoder unit on core 1. Its peripherals are set up over there so the
    // UART1 interrupt is serviced by core 1 as well.
    let encoder_uart = p.UART1;
    let encoder_tx = encoder_uart_tx_pin!(p);
    let encoder_rx = encoder_uart_rx_pin!(p);
    let encoder_out = encoder_output_pin!(p);

    let stack = CORE1_STACK.init(Stack::new());
    spawn_core1(p.CORE1, stack, move || {
        let tx_buf = ENCODER_TX_BUF.init([0u8; UART_BUF_SIZE]);
        let rx_buf = ENCODER_RX_BUF.init([0u8; UART_BUF_SIZE]);
        let uart = Uart::new_blocking(encoder_uart, encoder_tx, encoder_rx, uart_config())
            .into_buffered(Irqs, tx_buf, rx_buf);

        let pin = CodecOutput::new(Output::new(encoder_out, Level::Low));
        let mut unit = EncoderUnit::new(pin, TickTimer::new(), uart_mailbox(uart), TIMING);

        if let Err(e) = unit.start() {
            warn!("Encoder channel announcement failed: {:?}", e);
        }
        info!(
            "Encoder unit running on core 1: port {}, output gpio{}",
            ENCODER_PORT,
            board::ENCODER_OUTPUT_PIN
        );

        unit.run()
    });

    // Decoder unit on core 0
    let tx_buf = DECODER_TX_BUF.init([0u8; UART_BUF_SIZE]);
    let rx_buf = DECODER_RX_BUF.init([0u8; UART_BUF_SIZE]);
    let uart = Uart::new_blocking(
        p.UART0,
        decoder_uart_tx_pin!(p),
        decoder_uart_rx_pin!(p),
        uart_config(),
    )
    .into_buffered(Irqs, tx_buf, rx_buf);

    let pin = CodecInput::new(Input::new(decoder_input_pin!(p), board::DECODER_INPUT_PULL));
    let mut unit = DecoderUnit::new(pin, TickTimer::new(), uart_mailbox(uart), TIMING);

    if let Err(e) = unit.start() {
        warn!("Decoder channel announcement failed: {:?}", e);
    }
    info!(
        "Decoder unit running on core 0: port {}, input gpio{}",
        DECODER_PORT,
        board::DECODER_INPUT_PIN
    );

    unit.run()
}
