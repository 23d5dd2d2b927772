//! Host-side access to ppmlink codec units
//!
//! A unit is reached through one device file per direction: the decoder
//! channel answers read requests with the current frame, the encoder
//! channel takes frame updates.
//!
//! ```no_run
//! use ppmlink_host::{OpenOptions, DEFAULT_READ_DEVICE};
//!
//! let mut ppm = OpenOptions::new().read(true).open(DEFAULT_READ_DEVICE)?;
//! let frame = ppm.read()?;
//! println!("channel 0 = {}", frame.values()[0]);
//! # Ok::<(), ppmlink_host::HostError>(())
//! ```
//!
//! Two framings are supported. Message-oriented devices such as rpmsg
//! character devices carry one payload per read or write ([`Framing::Raw`]).
//! Byte streams such as a serial port wrap every payload in the protocol
//! envelope ([`Framing::Envelope`]).
//!
//! There is no request identifier on the wire, so a device handle must not
//! have more than one read in flight.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use ppmlink_protocol::{
    Announcement, Message, MessageParser, DECODER_PORT, ENCODER_PORT, HOST_ENDPOINT,
    NAME_SERVICE_ENDPOINT, READ_TRIGGER,
};
use tracing::{debug, trace};

mod error;

pub use error::{HostError, Result};
pub use ppmlink_protocol::{ChannelFrame, CHANNELS_SIZE, NUM_CHANNELS};

/// Decoder channel on a BeagleBone-style rpmsg setup
pub const DEFAULT_READ_DEVICE: &str = "/dev/rpmsg_pru30";

/// Encoder channel on a BeagleBone-style rpmsg setup
pub const DEFAULT_WRITE_DEVICE: &str = "/dev/rpmsg_pru31";

/// Direction a device handle was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

/// How payloads are delimited on the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Framing {
    /// Device preserves message boundaries
    #[default]
    Raw,
    /// Byte stream; payloads travel inside the message envelope
    Envelope,
}

/// Options for opening a codec channel, in the style of [`std::fs::OpenOptions`]
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    read: bool,
    write: bool,
    nonblocking: bool,
    framing: Framing,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the decoder channel
    pub fn read(&mut self, read: bool) -> &mut Self {
        self.read = read;
        self
    }

    /// Open the encoder channel
    pub fn write(&mut self, write: bool) -> &mut Self {
        self.write = write;
        self
    }

    /// Set `O_NONBLOCK` on the device
    ///
    /// Reads and writes that cannot complete then fail with
    /// [`std::io::ErrorKind::WouldBlock`] instead of waiting.
    pub fn nonblocking(&mut self, nonblocking: bool) -> &mut Self {
        self.nonblocking = nonblocking;
        self
    }

    pub fn framing(&mut self, framing: Framing) -> &mut Self {
        self.framing = framing;
        self
    }

    /// The single direction these options select
    pub fn mode(&self) -> Result<Mode> {
        match (self.read, self.write) {
            (true, false) => Ok(Mode::Read),
            (false, true) => Ok(Mode::Write),
            _ => Err(HostError::InvalidMode),
        }
    }

    /// Open the default device for the selected direction
    pub fn open_default(&self) -> Result<PpmDevice<File>> {
        match self.mode()? {
            Mode::Read => self.open(DEFAULT_READ_DEVICE),
            Mode::Write => self.open(DEFAULT_WRITE_DEVICE),
        }
    }

    /// Open a device file
    ///
    /// The file is always opened read-write: a read request is itself a
    /// write, and the encoder channel may announce itself on the same file.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<PpmDevice<File>> {
        let mode = self.mode()?;
        let path = path.as_ref();

        let mut options = std::fs::OpenOptions::new();
        options.read(true).write(true);

        #[cfg(unix)]
        if self.nonblocking {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NONBLOCK);
        }

        let file = options.open(path)?;
        debug!(path = %path.display(), ?mode, framing = ?self.framing, "opened ppm device");

        Ok(PpmDevice::from_stream(file, mode, self.framing))
    }
}

/// Open handle on one codec channel
pub struct PpmDevice<S> {
    stream: S,
    mode: Mode,
    framing: Framing,
    parser: MessageParser,
}

impl<S: Read + Write> PpmDevice<S> {
    /// Wrap an already open stream
    pub fn from_stream(stream: S, mode: Mode, framing: Framing) -> Self {
        Self {
            stream,
            mode,
            framing,
            parser: MessageParser::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    fn require(&self, requested: Mode) -> Result<()> {
        if self.mode == requested {
            Ok(())
        } else {
            Err(HostError::WrongMode {
                opened: self.mode,
                requested,
            })
        }
    }

    /// Request and return the decoder's current frame
    pub fn read(&mut self) -> Result<ChannelFrame> {
        self.require(Mode::Read)?;

        match self.framing {
            Framing::Raw => {
                self.stream.write_all(&[READ_TRIGGER])?;
                let mut buf = [0u8; CHANNELS_SIZE];
                let n = self.stream.read(&mut buf)?;
                if n == 0 {
                    return Err(HostError::Closed);
                }
                Ok(ChannelFrame::from_payload(&buf[..n])?)
            }
            Framing::Envelope => {
                let request = Message::new(HOST_ENDPOINT, DECODER_PORT, &[READ_TRIGGER])?;
                self.stream.write_all(&request.encode_to_vec()?)?;
                self.read_reply()
            }
        }
    }

    /// Read messages until the decoder's frame reply arrives
    fn read_reply(&mut self) -> Result<ChannelFrame> {
        let mut chunk = [0u8; 64];
        loop {
            let n = self.stream.read(&mut chunk)?;
            if n == 0 {
                return Err(HostError::Closed);
            }

            let mut bytes = &chunk[..n];
            while !bytes.is_empty() {
                let (used, result) = self.parser.feed_bytes(bytes);
                bytes = &bytes[used..];

                let message = match result {
                    Ok(Some(message)) => message,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!(error = ?e, "discarding malformed envelope");
                        continue;
                    }
                };

                if message.dst == NAME_SERVICE_ENDPOINT {
                    let name = Announcement::from_payload(&message.payload);
                    debug!(port = message.src, ?name, "skipping channel announcement");
                    continue;
                }
                if message.src != DECODER_PORT {
                    trace!(src = message.src, dst = message.dst, "skipping unrelated message");
                    continue;
                }

                // Anything after the reply in this chunk belongs to no request
                self.parser.reset();
                return Ok(ChannelFrame::from_payload(&message.payload)?);
            }
        }
    }

    /// Send a frame update to the encoder
    ///
    /// Returns the number of payload bytes written, always [`CHANNELS_SIZE`].
    pub fn write(&mut self, frame: &ChannelFrame) -> Result<usize> {
        self.require(Mode::Write)?;
        let payload = frame.to_payload();

        match self.framing {
            Framing::Raw => self.stream.write_all(&payload)?,
            Framing::Envelope => {
                let update = Message::new(HOST_ENDPOINT, ENCODER_PORT, &payload)?;
                self.stream.write_all(&update.encode_to_vec()?)?;
            }
        }
        self.stream.flush()?;

        Ok(payload.len())
    }

    /// Flush and release the device
    pub fn close(mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_requires_exactly_one_direction() {
        assert!(matches!(OpenOptions::new().mode(), Err(HostError::InvalidMode)));
        assert!(matches!(
            OpenOptions::new().read(true).write(true).mode(),
            Err(HostError::InvalidMode)
        ));
        assert_eq!(OpenOptions::new().read(true).mode().unwrap(), Mode::Read);
        assert_eq!(OpenOptions::new().write(true).mode().unwrap(), Mode::Write);
    }

    #[test]
    fn test_open_rejects_both_before_touching_path() {
        let err = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/nonexistent/ppm")
            .err()
            .unwrap();
        assert!(matches!(err, HostError::InvalidMode));
    }

    #[test]
    fn test_open_missing_device() {
        let err = OpenOptions::new()
            .read(true)
            .open("/nonexistent/ppm")
            .err()
            .unwrap();
        assert!(matches!(err, HostError::Io(_)));
    }

    #[test]
    fn test_default_framing_is_raw() {
        assert_eq!(Framing::default(), Framing::Raw);
    }
}
