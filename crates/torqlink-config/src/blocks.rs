//! Declared configuration blocks.

use std::fmt;
use std::str::FromStr;

use crate::block::{BlockLayout, ConfigBlock};
use crate::error::{ConfigError, Result};
use crate::field::{FieldSpec, FieldValue, LookupTable};

/// Encoder pulses per revolution.
pub static PULSES_PER_REV: LookupTable = LookupTable::new(&[
    (0x00, FieldValue::None),
    (0x01, FieldValue::Int(6)),
    (0x02, FieldValue::Int(30)),
    (0x03, FieldValue::Int(60)),
    (0x04, FieldValue::Int(90)),
    (0x05, FieldValue::Int(120)),
    (0x06, FieldValue::Int(180)),
    (0x07, FieldValue::Int(360)),
    (0x08, FieldValue::Int(720)),
    (0x09, FieldValue::Int(1440)),
    (0x10, FieldValue::Int(100)),
    (0x11, FieldValue::Int(200)),
    (0x12, FieldValue::Int(400)),
    (0x13, FieldValue::Int(500)),
    (0x14, FieldValue::Int(1000)),
    (0xFF, FieldValue::None),
]);

/// Serial baud rate; `none` keeps the device default.
pub static BAUD_RATE: LookupTable = LookupTable::new(&[
    (0x00, FieldValue::None),
    (0x09, FieldValue::Int(115_200)),
    (0x10, FieldValue::Int(230_400)),
    (0xFF, FieldValue::None),
]);

/// Signal routed to an analog output.
pub static OUTPUT_SOURCE: LookupTable = LookupTable::new(&[
    (0x00, FieldValue::None),
    (0x01, FieldValue::Label("A")),
    (0x02, FieldValue::Label("B")),
    (0x03, FieldValue::Label("SPEED")),
    (0x04, FieldValue::Label("ANGLE")),
    (0x05, FieldValue::Label("FORCE")),
    (0x06, FieldValue::Label("POWER")),
    (0xFF, FieldValue::None),
]);

pub static STATOR_HEADER: BlockLayout = BlockLayout {
    name: "STATOR_HEADER",
    number: 0,
    id: 0x10,
    read_only: true,
    fields: &[
        FieldSpec::new("stator_type", 1, 3),
        FieldSpec::new("serial", 4, 4),
        FieldSpec::new("si_idx", 8, 1),
        FieldSpec::new("active_port_count", 9, 1),
    ],
};

pub static STATOR_HARDWARE: BlockLayout = BlockLayout {
    name: "STATOR_HARDWARE",
    number: 1,
    id: 0x12,
    read_only: true,
    fields: &[
        FieldSpec::new("production_time", 1, 4),
        FieldSpec::new("stas", 5, 5),
        FieldSpec::new("oem", 10, 1),
        FieldSpec::new("pulses_pr_rev", 11, 1).with_table(&PULSES_PER_REV),
    ],
};

pub static STATOR_OPERATION: BlockLayout = BlockLayout {
    name: "STATOR_OPERATION",
    number: 2,
    id: 0x13,
    read_only: false,
    fields: &[
        FieldSpec::new("modification_time", 1, 4),
        FieldSpec::new("wakeup_flag", 6, 1),
        FieldSpec::new("bus_address", 7, 1),
        FieldSpec::new("op_flags", 9, 1),
        FieldSpec::new("baudrate", 10, 1).with_table(&BAUD_RATE),
        FieldSpec::new("output_a", 11, 1).with_table(&OUTPUT_SOURCE),
        FieldSpec::new("output_b", 12, 1).with_table(&OUTPUT_SOURCE),
    ],
};

/// Every declared block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    StatorHeader,
    StatorHardware,
    StatorOperation,
}

impl BlockKind {
    /// Every block kind, in block-number order.
    pub const ALL: [BlockKind; 3] = [
        BlockKind::StatorHeader,
        BlockKind::StatorHardware,
        BlockKind::StatorOperation,
    ];

    pub fn layout(self) -> &'static BlockLayout {
        match self {
            BlockKind::StatorHeader => &STATOR_HEADER,
            BlockKind::StatorHardware => &STATOR_HARDWARE,
            BlockKind::StatorOperation => &STATOR_OPERATION,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.layout().name)
    }
}

impl FromStr for BlockKind {
    type Err = ConfigError;

    /// Accepts the block name in any case, with `-` or `_`, or the block number.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace('-', "_");
        BlockKind::ALL
            .into_iter()
            .find(|kind| {
                let layout = kind.layout();
                layout.name.eq_ignore_ascii_case(&wanted)
                    || wanted.parse::<u8>().ok() == Some(layout.number)
            })
            .ok_or_else(|| ConfigError::UnknownBlock(s.to_string()))
    }
}

/// One instance of every declared block, in block-number order.
#[derive(Debug, Clone)]
pub struct ConfigSet {
    blocks: Vec<ConfigBlock>,
}

impl ConfigSet {
    pub fn new() -> Self {
        Self {
            blocks: BlockKind::ALL
                .into_iter()
                .map(|kind| ConfigBlock::new(kind.layout()))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigBlock> {
        self.blocks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConfigBlock> {
        self.blocks.iter_mut()
    }

    pub fn get(&self, kind: BlockKind) -> &ConfigBlock {
        // `blocks` follows the order of `BlockKind::ALL`.
        &self.blocks[kind as usize]
    }

    pub fn get_mut(&mut self, kind: BlockKind) -> &mut ConfigBlock {
        &mut self.blocks[kind as usize]
    }

    /// Find a block by name or number.
    pub fn by_name(&self, name: &str) -> Result<&ConfigBlock> {
        Ok(self.get(name.parse()?))
    }

    /// Find a block by name or number for editing.
    pub fn by_name_mut(&mut self, name: &str) -> Result<&mut ConfigBlock> {
        Ok(self.get_mut(name.parse()?))
    }

    /// True when any block was edited since it was last read.
    pub fn is_changed(&self) -> bool {
        self.blocks.iter().any(ConfigBlock::is_changed)
    }
}

impl Default for ConfigSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a ConfigSet {
    type Item = &'a ConfigBlock;
    type IntoIter = std::slice::Iter<'a, ConfigBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
