use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::field::{FieldSpec, FieldValue};

/// Size of a block image. Byte 0 holds the block ID.
pub const IMAGE_SIZE: usize = 27;

/// Offset of the block checksums, counted from the start of the image.
pub const CHECKSUM_OFFSET: usize = 28;

/// Image, reserved byte and both 16-bit checksums.
pub const SERIALIZED_SIZE: usize = CHECKSUM_OFFSET + 4;

/// Block number followed by the serialized block: the WriteConfig
/// parameters and the ReadConfig reply.
pub const PAYLOAD_SIZE: usize = 1 + SERIALIZED_SIZE;

/// Static description of one block type.
#[derive(Debug)]
pub struct BlockLayout {
    pub name: &'static str,
    /// Routing key sent with ReadConfig/WriteConfig.
    pub number: u8,
    /// Identity byte stored at image offset 0.
    pub id: u8,
    pub read_only: bool,
    pub fields: &'static [FieldSpec],
}

impl BlockLayout {
    /// Find a field by name, ignoring ASCII case.
    pub fn field(&self, name: &str) -> Option<(usize, &'static FieldSpec)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, spec)| spec.name.eq_ignore_ascii_case(name))
    }
}

/// Block checksums: a 16-bit running sum and the running sum of those sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockChecksum {
    pub sum: u16,
    pub weighted: u16,
}

impl BlockChecksum {
    pub fn compute(image: &[u8]) -> Self {
        image.iter().fold(Self::default(), |acc, byte| {
            let sum = acc.sum.wrapping_add(u16::from(*byte));
            Self {
                sum,
                weighted: acc.weighted.wrapping_add(sum),
            }
        })
    }

    pub fn to_bytes(self) -> [u8; 4] {
        let [s0, s1] = self.sum.to_be_bytes();
        let [w0, w1] = self.weighted.to_be_bytes();
        [s0, s1, w0, w1]
    }
}

/// Field values of one block, decoded from or destined for the device.
#[derive(Debug, Clone)]
pub struct ConfigBlock {
    layout: &'static BlockLayout,
    values: Vec<FieldValue>,
    changed: bool,
}

impl ConfigBlock {
    /// A block whose fields hold what an all-zero image decodes to.
    pub fn new(layout: &'static BlockLayout) -> Self {
        let image = [0u8; IMAGE_SIZE];
        Self {
            layout,
            values: layout.fields.iter().map(|spec| spec.read(&image)).collect(),
            changed: false,
        }
    }

    pub fn layout(&self) -> &'static BlockLayout {
        self.layout
    }

    pub fn name(&self) -> &'static str {
        self.layout.name
    }

    pub fn number(&self) -> u8 {
        self.layout.number
    }

    pub fn is_read_only(&self) -> bool {
        self.layout.read_only
    }

    /// True once a field was set since the last `from_payload`.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Populate every field from ReadConfig reply parameters.
    ///
    /// `payload[0]` is the block number; the image follows.
    pub fn from_payload(&mut self, payload: &[u8]) -> Result<()> {
        let needed = 1 + IMAGE_SIZE;
        if payload.len() < needed {
            return Err(ConfigError::PayloadTooShort {
                needed,
                received: payload.len(),
            });
        }
        if payload[0] != self.layout.number {
            return Err(ConfigError::BadBlockId {
                expected: self.layout.number,
                received: payload[0],
            });
        }

        let image = &payload[1..needed];
        if image[0] != self.layout.id {
            warn!(
                block = self.layout.name,
                expected = self.layout.id,
                received = image[0],
                "config block carries unexpected id byte"
            );
        }

        self.values = self
            .layout
            .fields
            .iter()
            .map(|spec| spec.read(image))
            .collect();
        self.changed = false;
        Ok(())
    }

    /// Build the block image from the current field values.
    pub fn gen_payload(&self) -> Result<[u8; IMAGE_SIZE]> {
        let mut image = [0u8; IMAGE_SIZE];
        image[0] = self.layout.id;
        for (spec, value) in self.layout.fields.iter().zip(&self.values) {
            spec.write(*value, &mut image)?;
        }
        Ok(image)
    }

    /// Image plus reserved byte and block checksums.
    pub fn serialize(&self) -> Result<Bytes> {
        if self.layout.read_only {
            return Err(ConfigError::ReadOnly(self.layout.name));
        }

        let image = self.gen_payload()?;
        let mut out = BytesMut::with_capacity(SERIALIZED_SIZE);
        out.put_slice(&image);
        out.put_bytes(0, CHECKSUM_OFFSET - IMAGE_SIZE);
        out.put_slice(&BlockChecksum::compute(&image).to_bytes());
        Ok(out.freeze())
    }

    /// WriteConfig parameters: block number, then the serialized block.
    pub fn to_payload(&self) -> Result<Bytes> {
        let serialized = self.serialize()?;
        let mut out = BytesMut::with_capacity(PAYLOAD_SIZE);
        out.put_u8(self.layout.number);
        out.put_slice(&serialized);
        Ok(out.freeze())
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Result<FieldValue> {
        let (idx, _) = self.lookup(name)?;
        Ok(self.values[idx])
    }

    /// Replace a field value after checking that it can be encoded.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<()> {
        if self.layout.read_only {
            return Err(ConfigError::ReadOnly(self.layout.name));
        }
        let (idx, spec) = self.lookup(name)?;
        spec.encode(value)?;
        self.values[idx] = value;
        self.changed = true;
        Ok(())
    }

    /// Parse `text` for the named field and set it.
    pub fn set_str(&mut self, name: &str, text: &str) -> Result<FieldValue> {
        let (_, spec) = self.lookup(name)?;
        let value = spec.parse(text)?;
        self.set(name, value)?;
        Ok(value)
    }

    /// Fields in declaration order with their current values.
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldSpec, FieldValue)> + '_ {
        self.layout.fields.iter().zip(self.values.iter().copied())
    }

    fn lookup(&self, name: &str) -> Result<(usize, &'static FieldSpec)> {
        self.layout
            .field(name)
            .ok_or_else(|| ConfigError::UnknownField {
                block: self.layout.name,
                field: name.to_string(),
            })
    }
}

impl fmt::Display for ConfigBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (block {})", self.layout.name, self.layout.number)?;
        for (spec, value) in self.fields() {
            write!(f, "\n  {}: {value}", spec.name)?;
        }
        Ok(())
    }
}
