//! Configuration block codec.
//!
//! A configuration block is a fixed 27-byte image addressed by a block
//! number. Each block type declares named big-endian fields at fixed
//! offsets, some translated through a lookup table. Blocks are read with
//! ReadConfig and written back with WriteConfig.

pub mod block;
pub mod blocks;
pub mod error;
pub mod field;

pub use block::{
    BlockChecksum, BlockLayout, ConfigBlock, CHECKSUM_OFFSET, IMAGE_SIZE, PAYLOAD_SIZE,
    SERIALIZED_SIZE,
};
pub use blocks::{
    BlockKind, ConfigSet, BAUD_RATE, OUTPUT_SOURCE, PULSES_PER_REV, STATOR_HARDWARE,
    STATOR_HEADER, STATOR_OPERATION,
};
pub use error::{ConfigError, Result};
pub use field::{FieldSpec, FieldValue, LookupTable};
