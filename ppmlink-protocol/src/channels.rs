//! The 12-channel frame and its 24-byte wire payload

/// Number of RC channels in one frame
pub const NUM_CHANNELS: usize = 12;

/// Payload size of one frame on the wire (12 × u16)
pub const CHANNELS_SIZE: usize = NUM_CHANNELS * 2;

/// Shortest valid channel pulse width in microseconds
pub const CHANNEL_MIN_US: u16 = 1000;

/// Longest valid channel pulse width in microseconds
pub const CHANNEL_MAX_US: u16 = 2000;

/// Neutral stick position in microseconds
pub const CHANNEL_CENTER_US: u16 = (CHANNEL_MIN_US + CHANNEL_MAX_US) / 2;

/// Clamp a pulse width into the valid channel range
#[inline]
pub const fn clamp_channel(width_us: u16) -> u16 {
    if width_us > CHANNEL_MAX_US {
        CHANNEL_MAX_US
    } else if width_us < CHANNEL_MIN_US {
        CHANNEL_MIN_US
    } else {
        width_us
    }
}

/// Errors from interpreting a message payload as a channel frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Payload is not exactly [`CHANNELS_SIZE`] bytes
    WrongLength { len: usize },
}

/// One live frame of channel values
///
/// Values are pulse widths in microseconds. The frame itself stores whatever
/// it is given; producers clamp with [`ChannelFrame::set`] and consumers read
/// through [`ChannelFrame::clamped`], so a value outside [1000, 2000] never
/// leaves the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelFrame {
    values: [u16; NUM_CHANNELS],
}

impl Default for ChannelFrame {
    fn default() -> Self {
        Self::splat(CHANNEL_MIN_US)
    }
}

impl ChannelFrame {
    /// Frame with every channel set to `value_us` (unclamped)
    pub const fn splat(value_us: u16) -> Self {
        Self {
            values: [value_us; NUM_CHANNELS],
        }
    }

    /// Frame from raw values (unclamped)
    pub const fn from_values(values: [u16; NUM_CHANNELS]) -> Self {
        Self { values }
    }

    /// Raw stored values
    pub const fn values(&self) -> &[u16; NUM_CHANNELS] {
        &self.values
    }

    /// Raw value of one channel
    ///
    /// Returns `None` for an index past the last channel.
    pub fn get(&self, index: usize) -> Option<u16> {
        self.values.get(index).copied()
    }

    /// Clamped value of one channel
    pub fn clamped(&self, index: usize) -> Option<u16> {
        self.get(index).map(clamp_channel)
    }

    /// Store a clamped value at `index`
    ///
    /// Out-of-range indices are ignored; the decoder wraps its index
    /// before every edge so this only guards against misuse.
    pub fn set(&mut self, index: usize, width_us: u16) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = clamp_channel(width_us);
        }
    }

    /// Iterate raw values in channel order
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.values.iter().copied()
    }

    /// Copy with every value clamped
    pub fn to_clamped(&self) -> Self {
        let mut values = self.values;
        for v in values.iter_mut() {
            *v = clamp_channel(*v);
        }
        Self { values }
    }

    /// Encode as the 24-byte little-endian wire payload
    pub fn to_payload(&self) -> [u8; CHANNELS_SIZE] {
        let mut out = [0u8; CHANNELS_SIZE];
        for (chunk, value) in out.chunks_exact_mut(2).zip(self.values.iter()) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Decode a wire payload
    ///
    /// Anything other than exactly [`CHANNELS_SIZE`] bytes is rejected so a
    /// short message can never leave the frame half-written.
    pub fn from_payload(payload: &[u8]) -> Result<Self, PayloadError> {
        if payload.len() != CHANNELS_SIZE {
            return Err(PayloadError::WrongLength { len: payload.len() });
        }

        let mut values = [0u16; NUM_CHANNELS];
        for (value, chunk) in values.iter_mut().zip(payload.chunks_exact(2)) {
            *value = u16::from_le_bytes([chunk[0], chunk[1]]);
        }
        Ok(Self { values })
    }

    /// Overwrite this frame in place from a wire payload
    ///
    /// On error the frame is left unchanged.
    pub fn overwrite_from(&mut self, payload: &[u8]) -> Result<(), PayloadError> {
        *self = Self::from_payload(payload)?;
        Ok(())
    }
}
