//! Endpoint addressing and channel announcement

use heapless::String;

use crate::message::{Message, MessageError, MAX_PAYLOAD_SIZE};

/// Port served by the decoder unit (host reads frames here)
pub const DECODER_PORT: u16 = 30;

/// Port served by the encoder unit (host writes frames here)
pub const ENCODER_PORT: u16 = 31;

/// Address the host uses as its own source endpoint
pub const HOST_ENDPOINT: u16 = 0x0400;

/// Well-known destination for channel announcements
pub const NAME_SERVICE_ENDPOINT: u16 = 53;

/// Channel name both units announce under
pub const CHANNEL_NAME: &str = "rpmsg-pru";

/// Byte the host sends to request a frame; the content is ignored
pub const READ_TRIGGER: u8 = 0x00;

/// Maximum announced name or description length
pub const MAX_NAME_LEN: usize = 32;

/// Name-service announcement sent once when a unit comes up
///
/// Payload layout: `[port lo][port hi][name len][name][desc len][desc]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub name: String<MAX_NAME_LEN>,
    pub description: String<MAX_NAME_LEN>,
    pub port: u16,
}

impl Announcement {
    /// Announcement for a unit serving `port`
    ///
    /// The description follows the `"Channel <port>"` convention.
    pub fn for_port(port: u16) -> Self {
        use core::fmt::Write;

        let mut name = String::new();
        let _ = name.push_str(CHANNEL_NAME);
        let mut description = String::new();
        let _ = write!(description, "Channel {}", port);

        Self {
            name,
            description,
            port,
        }
    }

    /// Encode as a message to the name-service endpoint
    pub fn to_message(&self) -> Result<Message, MessageError> {
        let mut payload = heapless::Vec::<u8, MAX_PAYLOAD_SIZE>::new();
        let name = self.name.as_bytes();
        let desc = self.description.as_bytes();

        payload
            .extend_from_slice(&self.port.to_le_bytes())
            .map_err(|_| MessageError::PayloadTooLarge)?;
        payload
            .push(name.len() as u8)
            .map_err(|_| MessageError::PayloadTooLarge)?;
        payload
            .extend_from_slice(name)
            .map_err(|_| MessageError::PayloadTooLarge)?;
        payload
            .push(desc.len() as u8)
            .map_err(|_| MessageError::PayloadTooLarge)?;
        payload
            .extend_from_slice(desc)
            .map_err(|_| MessageError::PayloadTooLarge)?;

        Message::new(self.port, NAME_SERVICE_ENDPOINT, &payload)
    }

    /// Parse an announcement payload
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        let port = u16::from_le_bytes([*payload.first()?, *payload.get(1)?]);
        let (name, rest) = read_str(payload.get(2..)?)?;
        let (description, _) = read_str(rest)?;

        Some(Self {
            name,
            description,
            port,
        })
    }
}

fn read_str(bytes: &[u8]) -> Option<(String<MAX_NAME_LEN>, &[u8])> {
    let len = *bytes.first()? as usize;
    let raw = bytes.get(1..1 + len)?;
    let text = core::str::from_utf8(raw).ok()?;
    let mut s = String::new();
    s.push_str(text).ok()?;
    Some((s, &bytes[1 + len..]))
}
