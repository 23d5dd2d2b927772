//! PPM timing constants
//!
//! Every threshold is fixed at compile time. Only the cycle rate differs
//! between devices, so a [`Timing`] value carries that rate and derives the
//! cycle-domain thresholds from the microsecond constants below.

use ppmlink_protocol::{CHANNEL_MAX_US, CHANNEL_MIN_US};

/// Width of every PPM pulse (time the line is held high)
pub const PULSE_WIDTH_US: u32 = 300;

/// Edge-detection tolerance
pub const SLOP_US: u32 = 20;

/// Fixed duration of one PPM frame, pulses and padding included
pub const FRAME_LENGTH_US: u32 = 22_500;

/// Longest rest that can still belong to a channel; anything longer is the
/// inter-frame gap
pub const MAX_CHANNEL_WIDTH_US: u32 = (CHANNEL_MAX_US as u32 - PULSE_WIDTH_US) + SLOP_US;

/// Longest pulse that is still well formed
pub const MAX_PULSE_WIDTH_US: u32 = PULSE_WIDTH_US + SLOP_US;

/// Shortest end-of-frame padding the encoder will emit
///
/// Used when a frame's channels add up to more than [`FRAME_LENGTH_US`]; the
/// padding must stay above [`MAX_CHANNEL_WIDTH_US`] for decoders to resync.
pub const MIN_SYNC_GAP_US: u32 = MAX_CHANNEL_WIDTH_US + SLOP_US;

/// Cycle-domain view of the timing constants for one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    cycles_per_us: u32,
}

impl Timing {
    /// 200 MHz real-time unit (200 cycles per microsecond)
    pub const PRU: Timing = Timing::new(200);

    /// 1 MHz timer such as the RP2040 system timer
    pub const MICROSECOND: Timing = Timing::new(1);

    /// Timing for a counter running at `cycles_per_us`
    ///
    /// A rate of zero is treated as one cycle per microsecond.
    pub const fn new(cycles_per_us: u32) -> Self {
        Self {
            cycles_per_us: if cycles_per_us == 0 { 1 } else { cycles_per_us },
        }
    }

    pub const fn cycles_per_us(&self) -> u32 {
        self.cycles_per_us
    }

    pub const fn us_to_cycles(&self, us: u32) -> u32 {
        us.saturating_mul(self.cycles_per_us)
    }

    /// Truncating conversion, so results are within 1 µs of the true value
    pub const fn cycles_to_us(&self, cycles: u32) -> u32 {
        cycles / self.cycles_per_us
    }

    pub const fn pulse_width_cycles(&self) -> u32 {
        self.us_to_cycles(PULSE_WIDTH_US)
    }

    pub const fn frame_length_cycles(&self) -> u32 {
        self.us_to_cycles(FRAME_LENGTH_US)
    }

    /// Frame-boundary threshold for the decoder
    pub const fn max_gap_cycles(&self) -> u32 {
        self.us_to_cycles(MAX_CHANNEL_WIDTH_US)
    }

    pub const fn max_pulse_cycles(&self) -> u32 {
        self.us_to_cycles(MAX_PULSE_WIDTH_US)
    }

    pub const fn min_sync_gap_cycles(&self) -> u32 {
        self.us_to_cycles(MIN_SYNC_GAP_US)
    }

    /// Rest (low time) that encodes a channel value
    ///
    /// The value is clamped first, so the result is always between
    /// 700 µs and 1700 µs worth of cycles.
    pub const fn rest_cycles(&self, value_us: u16) -> u32 {
        let value = ppmlink_protocol::clamp_channel(value_us) as u32;
        self.us_to_cycles(value - PULSE_WIDTH_US)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::PRU
    }
}

const _: () = assert!(CHANNEL_MIN_US as u32 > PULSE_WIDTH_US);
const _: () = assert!(MIN_SYNC_GAP_US > MAX_CHANNEL_WIDTH_US);
