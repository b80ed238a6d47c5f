use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::Checksum;
use crate::command::Command;
use crate::error::{Result, TelegramError};

/// Frame-start marker.
pub const MARKER: u8 = 0x02;

/// Body header: command (1) + address to (1) + address from (1) + count (1).
pub const HEADER_SIZE: usize = 4;

/// Body trailer: checksum (1) + weighted checksum (1).
pub const TRAILER_SIZE: usize = 2;

/// A one-byte parameter count caps the parameter sequence.
pub const MAX_PARAMETERS: usize = u8::MAX as usize;

/// Destination address that addresses every device; nobody answers.
pub const BROADCAST: u8 = 0x00;

/// Source address used by the host.
pub const DEFAULT_ADDRESS_FROM: u8 = 0xFF;

/// Address of a single device on a point-to-point link.
pub const DEFAULT_ADDRESS_TO: u8 = 0x01;

/// One framed request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    /// The command this telegram carries.
    pub command: Command,
    /// Destination bus address.
    pub address_to: u8,
    /// Source bus address.
    pub address_from: u8,
    parameters: Bytes,
    checksum: Checksum,
    stuffed: bool,
}

impl Telegram {
    /// Create a telegram and compute its checksums.
    pub fn new(
        command: Command,
        address_to: u8,
        address_from: u8,
        parameters: impl Into<Bytes>,
    ) -> Result<Self> {
        let parameters = parameters.into();
        if parameters.len() > MAX_PARAMETERS {
            return Err(TelegramError::TooManyParameters(parameters.len()));
        }

        let checksum = body_checksum(command.code(), address_to, address_from, &parameters);
        Ok(Self {
            command,
            address_to,
            address_from,
            parameters,
            checksum,
            stuffed: false,
        })
    }

    /// Create a host request to `address_to`.
    pub fn request(command: Command, address_to: u8, parameters: impl Into<Bytes>) -> Result<Self> {
        Self::new(command, address_to, DEFAULT_ADDRESS_FROM, parameters)
    }

    /// The parameter bytes.
    pub fn parameters(&self) -> &Bytes {
        &self.parameters
    }

    /// Number of parameter bytes, as carried on the wire.
    pub fn parameter_count(&self) -> u8 {
        // Bounded by `new` and `decode`.
        self.parameters.len() as u8
    }

    /// Checksums carried by this telegram.
    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    /// True when the frame arrived with a doubled start marker.
    pub fn stuffed(&self) -> bool {
        self.stuffed
    }

    /// True when the carried checksums match the fields.
    pub fn is_valid(&self) -> bool {
        self.checksum
            == body_checksum(
                self.command.code(),
                self.address_to,
                self.address_from,
                &self.parameters,
            )
    }

    /// True when the reply is a negative acknowledgement.
    pub fn is_nack(&self) -> bool {
        self.command == Command::Nack
    }

    /// Encode into wire bytes.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        encode_telegram(self, &mut dst);
        dst.freeze()
    }

    /// Unstuffed wire size: marker + header + parameters + trailer.
    pub fn wire_size(&self) -> usize {
        1 + HEADER_SIZE + self.parameters.len() + TRAILER_SIZE
    }
}

fn body_checksum(command: u8, address_to: u8, address_from: u8, parameters: &[u8]) -> Checksum {
    let header = [command, address_to, address_from, parameters.len() as u8];
    Checksum::compute(header.iter().chain(parameters))
}

/// Encode a telegram into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────┬─────────┬─────────┬───────────┬───────┬────────────┬──────────┬───────────┐
/// │ Marker │ Command │ Addr to │ Addr from │ Count │ Parameters │ Checksum │ Weighted  │
/// │ 0x02   │ (1B)    │ (1B)    │ (1B)      │ (1B)  │ (Count B)  │ (1B)     │ (1B)      │
/// └────────┴─────────┴─────────┴───────────┴───────┴────────────┴──────────┴───────────┘
/// ```
/// Every 0x02 after the leading marker is sent twice.
pub fn encode(
    command: Command,
    address_to: u8,
    address_from: u8,
    parameters: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let telegram = Telegram::new(
        command,
        address_to,
        address_from,
        Bytes::copy_from_slice(parameters),
    )?;
    encode_telegram(&telegram, dst);
    Ok(())
}

fn encode_telegram(telegram: &Telegram, dst: &mut BytesMut) {
    let mut body = BytesMut::with_capacity(HEADER_SIZE + telegram.parameters.len() + TRAILER_SIZE);
    body.put_u8(telegram.command.code());
    body.put_u8(telegram.address_to);
    body.put_u8(telegram.address_from);
    body.put_u8(telegram.parameter_count());
    body.put_slice(&telegram.parameters);
    body.put_slice(&telegram.checksum.to_bytes());

    dst.reserve(1 + body.len() * 2);
    dst.put_u8(MARKER);
    stuff(&body, dst);
}

/// Decode one complete frame.
///
/// A doubled leading marker is accepted and recorded as stuffed framing. The
/// result is only returned once every field and both checksums check out.
pub fn decode(src: &[u8]) -> Result<Telegram> {
    let Some((&first, mut rest)) = src.split_first() else {
        return Err(TelegramError::MalformedFrame("empty frame".to_string()));
    };
    if first != MARKER {
        return Err(TelegramError::MalformedFrame(format!(
            "expected start marker 0x02, found 0x{first:02X}"
        )));
    }

    // No command uses the marker value, so a second marker is stuffing.
    let stuffed = rest.first() == Some(&MARKER);
    if stuffed {
        rest = &rest[1..];
    }

    let body = destuff(rest)?;
    if body.len() < HEADER_SIZE + TRAILER_SIZE {
        return Err(TelegramError::MalformedFrame(format!(
            "frame too short ({} body bytes)",
            body.len()
        )));
    }

    let count = body[3] as usize;
    if body.len() != HEADER_SIZE + count + TRAILER_SIZE {
        return Err(TelegramError::MalformedFrame(format!(
            "parameter count {count} does not match {} body bytes",
            body.len()
        )));
    }

    let (fields, trailer) = body.split_at(HEADER_SIZE + count);
    let expected = Checksum::compute(fields);
    let received = Checksum {
        sum: trailer[0],
        weighted: trailer[1],
    };
    if expected != received {
        return Err(TelegramError::ChecksumMismatch { expected, received });
    }

    let command = Command::try_from(fields[0])?;
    Ok(Telegram {
        command,
        address_to: fields[1],
        address_from: fields[2],
        parameters: Bytes::copy_from_slice(&fields[HEADER_SIZE..]),
        checksum: received,
        stuffed,
    })
}

/// Double every marker byte in `src`.
pub fn stuff(src: &[u8], dst: &mut BytesMut) {
    for &byte in src {
        dst.put_u8(byte);
        if byte == MARKER {
            dst.put_u8(MARKER);
        }
    }
}

/// Collapse every doubled marker in `src`.
///
/// A marker that is not followed by a second one cannot come from stuffing.
pub fn destuff(src: &[u8]) -> Result<BytesMut> {
    let mut out = BytesMut::with_capacity(src.len());
    let mut iter = src.iter().copied().enumerate();
    while let Some((pos, byte)) = iter.next() {
        if byte == MARKER {
            match iter.next() {
                Some((_, MARKER)) => {}
                Some((_, other)) => {
                    return Err(TelegramError::MalformedFrame(format!(
                        "unpaired marker at offset {pos} (followed by 0x{other:02X})"
                    )));
                }
                None => {
                    return Err(TelegramError::MalformedFrame(format!(
                        "unpaired marker at end of frame (offset {pos})"
                    )));
                }
            }
        }
        out.put_u8(byte);
    }
    Ok(out)
}
