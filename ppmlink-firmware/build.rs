//! Build script for ppmlink-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates board.toml at compile time
//! - Generates pin constants and pin-taking macros from board.toml

use std::collections::BTreeMap;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// GPIO pins on the RP2040
const GPIO_COUNT: i64 = 30;

const UART0_TX: &[i64] = &[0, 12, 16, 28];
const UART0_RX: &[i64] = &[1, 13, 17, 29];
const UART1_TX: &[i64] = &[4, 8, 20, 24];
const UART1_RX: &[i64] = &[5, 9, 21, 25];

fn main() {
    setup_linker();
    let board = validate_board();
    generate_board(&board);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validated board wiring
struct Board {
    decoder_input: i64,
    decoder_pull: String,
    decoder_tx: i64,
    decoder_rx: i64,
    encoder_output: i64,
    encoder_tx: i64,
    encoder_rx: i64,
    baudrate: i64,
}

/// Validate board.toml and extract the wiring
fn validate_board() -> Board {
    println!("cargo:rerun-if-changed=board.toml");

    let board_path = Path::new("board.toml");

    if !board_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a board.toml pin assignment file in the   ║\n\
            ║  ppmlink-firmware directory.                                     ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(board_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    let decoder_input = pin(&config, "decoder", "input_pin", &mut errors);
    let decoder_tx = pin(&config, "decoder", "uart_tx_pin", &mut errors);
    let decoder_rx = pin(&config, "decoder", "uart_rx_pin", &mut errors);
    let encoder_output = pin(&config, "encoder", "output_pin", &mut errors);
    let encoder_tx = pin(&config, "encoder", "uart_tx_pin", &mut errors);
    let encoder_rx = pin(&config, "encoder", "uart_rx_pin", &mut errors);

    let decoder_pull = match config.get("decoder").and_then(|d| d.get("pull")) {
        None => "none".to_string(),
        Some(toml::Value::String(pull)) if ["none", "up", "down"].contains(&pull.as_str()) => {
            pull.clone()
        }
        Some(_) => {
            errors.push("[decoder] pull must be 'none', 'up', or 'down'".to_string());
            "none".to_string()
        }
    };

    let baudrate = match config.get("uart").and_then(|u| u.get("baudrate")) {
        None => 115_200,
        Some(toml::Value::Integer(baud)) if *baud > 0 && *baud <= 7_812_500 => *baud,
        Some(_) => {
            errors.push("[uart] baudrate must be 1-7812500".to_string());
            115_200
        }
    };

    check_uart_pin("decoder", "uart_tx_pin", decoder_tx, UART0_TX, "UART0 TX", &mut errors);
    check_uart_pin("decoder", "uart_rx_pin", decoder_rx, UART0_RX, "UART0 RX", &mut errors);
    check_uart_pin("encoder", "uart_tx_pin", encoder_tx, UART1_TX, "UART1 TX", &mut errors);
    check_uart_pin("encoder", "uart_rx_pin", encoder_rx, UART1_RX, "UART1 RX", &mut errors);

    // Every pin may only be used once
    let mut used: BTreeMap<i64, &str> = BTreeMap::new();
    for (name, gpio) in [
        ("decoder.input_pin", decoder_input),
        ("decoder.uart_tx_pin", decoder_tx),
        ("decoder.uart_rx_pin", decoder_rx),
        ("encoder.output_pin", encoder_output),
        ("encoder.uart_tx_pin", encoder_tx),
        ("encoder.uart_rx_pin", encoder_rx),
    ] {
        if gpio < 0 {
            continue;
        }
        if let Some(other) = used.insert(gpio, name) {
            errors.push(format!("gpio{} used by both {} and {}", gpio, other, name));
        }
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid board configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=board.toml validated successfully");

    Board {
        decoder_input,
        decoder_pull,
        decoder_tx,
        decoder_rx,
        encoder_output,
        encoder_tx,
        encoder_rx,
        baudrate,
    }
}

/// Read a GPIO number, recording an error and returning -1 if invalid
fn pin(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) -> i64 {
    let table = match config.get(section) {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push(format!("[{}] must be a table", section));
            return -1;
        }
        None => {
            errors.push(format!("Missing [{}] section", section));
            return -1;
        }
    };

    match table.get(key) {
        Some(toml::Value::Integer(gpio)) if (0..GPIO_COUNT).contains(gpio) => *gpio,
        Some(_) => {
            errors.push(format!("[{}] {} must be a GPIO number 0-29", section, key));
            -1
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            -1
        }
    }
}

fn check_uart_pin(
    section: &str,
    key: &str,
    gpio: i64,
    allowed: &[i64],
    function: &str,
    errors: &mut Vec<String>,
) {
    if gpio >= 0 && !allowed.contains(&gpio) {
        errors.push(format!(
            "[{}] {} gpio{} cannot be {} (use {:?})",
            section, key, gpio, function, allowed
        ));
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `board.rs` into OUT_DIR
///
/// Pins stay compile-time constants: each one gets a `u8` constant for
/// logging and a macro that moves the matching field out of `Peripherals`.
fn generate_board(board: &Board) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let pull = match board.decoder_pull.as_str() {
        "up" => "Up",
        "down" => "Down",
        _ => "None",
    };

    let mut code = String::from("// Generated by build.rs from board.toml\n\n");
    code.push_str(&format!(
        "pub const DECODER_INPUT_PULL: embassy_rp::gpio::Pull = embassy_rp::gpio::Pull::{};\n",
        pull
    ));
    code.push_str(&format!("pub const UART_BAUDRATE: u32 = {};\n\n", board.baudrate));

    for (name, gpio) in [
        ("decoder_input_pin", board.decoder_input),
        ("decoder_uart_tx_pin", board.decoder_tx),
        ("decoder_uart_rx_pin", board.decoder_rx),
        ("encoder_output_pin", board.encoder_output),
        ("encoder_uart_tx_pin", board.encoder_tx),
        ("encoder_uart_rx_pin", board.encoder_rx),
    ] {
        code.push_str(&format!(
            concat!(
                "pub const {}: u8 = {};\n\n",
                "macro_rules! {} {{\n",
                "    ($p:expr) => {{\n        $p.PIN_{}\n    }};\n",
                "}}\n\n",
            ),
            name.to_uppercase(),
            gpio,
            name,
            gpio
        ));
    }

    fs::write(out_dir.join("board.rs"), code).unwrap();
}
