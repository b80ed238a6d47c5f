//! Field descriptors and reversible value tables.

use std::fmt;

use serde::Serialize;

use crate::error::{ConfigError, Result};

/// Logical value of one configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// The field is unset or selects the device default.
    None,
    /// A plain integer, or a table entry that maps to a number.
    Int(u64),
    /// A table entry that maps to a name.
    Label(&'static str),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::None => f.write_str("none"),
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::Label(label) => f.write_str(label),
        }
    }
}

/// Bidirectional mapping between raw codes and logical values.
#[derive(Debug)]
pub struct LookupTable {
    entries: &'static [(u64, FieldValue)],
    fallback: Option<FieldValue>,
}

impl LookupTable {
    /// A table where unmapped raw codes pass through as integers.
    pub const fn new(entries: &'static [(u64, FieldValue)]) -> Self {
        Self {
            entries,
            fallback: None,
        }
    }

    /// A table where every unmapped raw code decodes to `fallback`.
    pub const fn with_fallback(entries: &'static [(u64, FieldValue)], fallback: FieldValue) -> Self {
        Self {
            entries,
            fallback: Some(fallback),
        }
    }

    /// Declared `(raw, logical)` pairs.
    pub fn entries(&self) -> &'static [(u64, FieldValue)] {
        self.entries
    }

    /// Translate a raw code into its logical value.
    pub fn decode(&self, raw: u64) -> FieldValue {
        self.entries
            .iter()
            .find(|(key, _)| *key == raw)
            .map(|(_, value)| *value)
            .or(self.fallback)
            .unwrap_or(FieldValue::Int(raw))
    }

    /// Translate a logical value back into a raw code.
    ///
    /// When several codes map to the same value the last one wins. An
    /// integer with no entry is written as-is, provided it would decode to
    /// itself again.
    pub fn encode(&self, value: FieldValue) -> Option<u64> {
        if let Some((key, _)) = self.entries.iter().rev().find(|(_, v)| *v == value) {
            return Some(*key);
        }
        match value {
            FieldValue::Int(raw)
                if self.fallback.is_none() && self.entries.iter().all(|(key, _)| *key != raw) =>
            {
                Some(raw)
            }
            _ => None,
        }
    }
}

/// Position and encoding of one named field inside a block image.
#[derive(Debug)]
pub struct FieldSpec {
    /// Field name, unique within its block.
    pub name: &'static str,
    /// Byte offset inside the block image.
    pub offset: usize,
    /// Width in bytes, big-endian.
    pub width: usize,
    /// Optional translation between raw codes and logical values.
    pub table: Option<&'static LookupTable>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, offset: usize, width: usize) -> Self {
        Self {
            name,
            offset,
            width,
            table: None,
        }
    }

    pub const fn with_table(mut self, table: &'static LookupTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Byte range covered inside the block image.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width
    }

    /// Decode the field from a block image.
    pub fn read(&self, image: &[u8]) -> FieldValue {
        let raw = image[self.range()]
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
        match self.table {
            Some(table) => table.decode(raw),
            None => FieldValue::Int(raw),
        }
    }

    /// Encode the field into a block image.
    pub fn write(&self, value: FieldValue, image: &mut [u8]) -> Result<()> {
        let mut raw = self.encode(value)?;
        for byte in image[self.range()].iter_mut().rev() {
            *byte = (raw & 0xFF) as u8;
            raw >>= 8;
        }
        Ok(())
    }

    /// Raw code for `value`, checked against the table and the field width.
    pub fn encode(&self, value: FieldValue) -> Result<u64> {
        let raw = match (self.table, value) {
            (Some(table), value) => table.encode(value),
            (None, FieldValue::Int(raw)) => Some(raw),
            (None, _) => None,
        };

        match raw {
            Some(raw) if self.width >= 8 || raw >> (self.width * 8) == 0 => Ok(raw),
            _ => Err(self.invalid(value)),
        }
    }

    /// Parse user input into a value this field can hold.
    ///
    /// Accepts `none`, a table label (any case), a decimal integer or a
    /// `0x`-prefixed hex integer.
    pub fn parse(&self, text: &str) -> Result<FieldValue> {
        let text = text.trim();
        let value = if text.eq_ignore_ascii_case("none") {
            FieldValue::None
        } else if let Some(label) = self.label(text) {
            FieldValue::Label(label)
        } else {
            let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => text.parse::<u64>(),
            };
            FieldValue::Int(parsed.map_err(|_| ConfigError::InvalidValue {
                field: self.name,
                value: text.to_string(),
            })?)
        };

        self.encode(value)?;
        Ok(value)
    }

    fn label(&self, text: &str) -> Option<&'static str> {
        self.table?.entries().iter().find_map(|(_, value)| match value {
            FieldValue::Label(label) if label.eq_ignore_ascii_case(text) => Some(*label),
            _ => None,
        })
    }

    fn invalid(&self, value: FieldValue) -> ConfigError {
        ConfigError::InvalidValue {
            field: self.name,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SPEEDS: LookupTable = LookupTable::new(&[
        (0x00, FieldValue::None),
        (0x01, FieldValue::Int(9600)),
        (0x02, FieldValue::Int(19200)),
        (0xFF, FieldValue::None),
    ]);

    static MODES: LookupTable = LookupTable::with_fallback(
        &[(0x01, FieldValue::Label("ON")), (0x02, FieldValue::Label("OFF"))],
        FieldValue::Label("RESERVED"),
    );

    #[test]
    fn table_decodes_mapped_codes() {
        assert_eq!(SPEEDS.decode(0x01), FieldValue::Int(9600));
        assert_eq!(SPEEDS.decode(0x00), FieldValue::None);
        assert_eq!(SPEEDS.decode(0xFF), FieldValue::None);
    }

    #[test]
    fn unmapped_codes_pass_through() {
        assert_eq!(SPEEDS.decode(0x40), FieldValue::Int(0x40));
        assert_eq!(SPEEDS.encode(FieldValue::Int(0x40)), Some(0x40));
    }

    #[test]
    fn catch_all_absorbs_unmapped_codes() {
        assert_eq!(MODES.decode(0x01), FieldValue::Label("ON"));
        assert_eq!(MODES.decode(0x33), FieldValue::Label("RESERVED"));
        assert_eq!(MODES.encode(FieldValue::Label("RESERVED")), None);
        assert_eq!(MODES.encode(FieldValue::Int(0x33)), None);
    }

    #[test]
    fn none_encodes_to_last_matching_code() {
        assert_eq!(SPEEDS.encode(FieldValue::None), Some(0xFF));
    }

    #[test]
    fn raw_code_shadowed_by_entry_is_rejected() {
        // 2 would decode as 19200, not as itself.
        assert_eq!(SPEEDS.encode(FieldValue::Int(2)), None);
    }

    #[test]
    fn multi_byte_field_is_big_endian() {
        let spec = FieldSpec::new("serial", 2, 3);
        let mut image = [0u8; 8];
        spec.write(FieldValue::Int(0x0A0B0C), &mut image).unwrap();

        assert_eq!(image, [0, 0, 0x0A, 0x0B, 0x0C, 0, 0, 0]);
        assert_eq!(spec.read(&image), FieldValue::Int(0x0A0B0C));
    }

    #[test]
    fn value_wider_than_field_is_rejected() {
        let spec = FieldSpec::new("flags", 0, 1);
        assert!(matches!(
            spec.encode(FieldValue::Int(0x100)),
            Err(ConfigError::InvalidValue { field: "flags", .. })
        ));
        assert_eq!(spec.encode(FieldValue::Int(0xFF)).unwrap(), 0xFF);
    }

    #[test]
    fn plain_field_rejects_labels_and_none() {
        let spec = FieldSpec::new("count", 0, 2);
        assert!(spec.encode(FieldValue::None).is_err());
        assert!(spec.encode(FieldValue::Label("ON")).is_err());
    }

    #[test]
    fn parse_accepts_labels_numbers_and_none() {
        let modes = FieldSpec::new("mode", 0, 1).with_table(&MODES);
        assert_eq!(modes.parse("on").unwrap(), FieldValue::Label("ON"));
        assert!(modes.parse("none").is_err());

        let speeds = FieldSpec::new("speed", 0, 1).with_table(&SPEEDS);
        assert_eq!(speeds.parse("19200").unwrap(), FieldValue::Int(19200));
        assert_eq!(speeds.parse("None").unwrap(), FieldValue::None);
        assert!(speeds.parse("57600").is_err());

        let plain = FieldSpec::new("address", 0, 1);
        assert_eq!(plain.parse("0x1F").unwrap(), FieldValue::Int(0x1F));
        assert!(plain.parse("fast").is_err());
    }
}
