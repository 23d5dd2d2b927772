//! Read frames from a decoder channel or push one to an encoder channel

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ppmlink_host::{ChannelFrame, Framing, OpenOptions, NUM_CHANNELS};

/// Talk to a ppmlink PPM codec.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Device file; defaults to the rpmsg channel for the direction.
    #[arg(short, long, global = true)]
    device: Option<PathBuf>,
    /// How payloads are delimited on the device.
    #[arg(long, value_enum, default_value_t = FramingArg::Raw, global = true)]
    framing: FramingArg,
    /// Open the device with O_NONBLOCK.
    #[arg(long, global = true)]
    nonblocking: bool,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read frames in a loop, printing each with the running average latency.
    Read {
        /// Stop after this many frames.
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },
    /// Send one frame to the encoder.
    Write {
        /// Twelve comma-separated channel values in microseconds.
        #[arg(value_delimiter = ',', required = true)]
        channels: Vec<u16>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FramingArg {
    /// Message-preserving device (rpmsg)
    Raw,
    /// Byte stream with message envelopes (serial)
    Envelope,
}

impl From<FramingArg> for Framing {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Raw => Framing::Raw,
            FramingArg::Envelope => Framing::Envelope,
        }
    }
}

fn setup_logging(verbosity: &Verbosity<InfoLevel>) {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.verbose);

    let mut options = OpenOptions::new();
    options
        .nonblocking(cli.nonblocking)
        .framing(cli.framing.into());

    match cli.command {
        Command::Read { count } => {
            options.read(true);
            run_read(&options, cli.device, count)
        }
        Command::Write { channels } => {
            options.write(true);
            run_write(&options, cli.device, &channels)
        }
    }
}

fn run_read(options: &OpenOptions, device: Option<PathBuf>, count: Option<u64>) -> Result<()> {
    let mut ppm = match &device {
        Some(path) => options.open(path),
        None => options.open_default(),
    }
    .context("failed to open decoder channel")?;

    let start = Instant::now();
    let mut frames = 0u64;

    while count.map_or(true, |n| frames < n) {
        let frame = ppm.read().context("failed to read frame")?;
        frames += 1;

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        println!(
            "{} frames read at an average of {:.2}ms latency",
            frames,
            elapsed_ms / frames as f64
        );
        for (i, value) in frame.iter().enumerate() {
            println!("channel[{}] = {}", i, value);
        }
        println!("-----------------------------------------------");
    }

    ppm.close().context("failed to close decoder channel")?;
    Ok(())
}

fn run_write(options: &OpenOptions, device: Option<PathBuf>, channels: &[u16]) -> Result<()> {
    if channels.len() != NUM_CHANNELS {
        bail!(
            "expected {} channel values, got {}",
            NUM_CHANNELS,
            channels.len()
        );
    }

    let mut values = [0u16; NUM_CHANNELS];
    values.copy_from_slice(channels);
    let frame = ChannelFrame::from_values(values);

    if frame.to_clamped() != frame {
        warn!("values outside 1000-2000 us will be clamped by the encoder");
    }

    let mut ppm = match &device {
        Some(path) => options.open(path),
        None => options.open_default(),
    }
    .context("failed to open encoder channel")?;

    let written = ppm.write(&frame).context("failed to write frame")?;
    info!(bytes = written, "frame sent");

    ppm.close().context("failed to close encoder channel")?;
    Ok(())
}
