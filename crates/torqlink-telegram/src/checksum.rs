use std::fmt;

/// The two trailing integrity bytes of a telegram.
///
/// `sum` is the one-byte running sum of every body byte. `weighted` is the
/// one-byte running sum of the intermediate `sum` values, with one extra added
/// whenever that addition carries past 0xFF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Checksum {
    pub sum: u8,
    pub weighted: u8,
}

impl Checksum {
    /// Compute both checksums over `bytes`.
    pub fn compute<'a>(bytes: impl IntoIterator<Item = &'a u8>) -> Self {
        bytes
            .into_iter()
            .fold(Self::default(), |state, &byte| state.update(byte))
    }

    /// Fold one more byte into the running state.
    pub fn update(self, byte: u8) -> Self {
        let sum = self.sum.wrapping_add(byte);
        let (weighted, carried) = self.weighted.overflowing_add(sum);
        Self {
            sum,
            weighted: weighted.wrapping_add(u8::from(carried)),
        }
    }

    /// Wire order: checksum first, weighted checksum second.
    pub fn to_bytes(self) -> [u8; 2] {
        [self.sum, self.weighted]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}/{:02X}", self.sum, self.weighted)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(Checksum::compute(&[] as &[u8]), Checksum::default());
    }

    #[test]
    fn read_raw_request_checksums() {
        let sums = Checksum::compute(&[0x41, 0x01, 0xFF, 0x00]);
        assert_eq!(sums.sum, 0x41);
        // 0x41, 0x83, 0xC4, then 0xC4 + 0x41 = 0x105 carries: 0x05 + 1.
        assert_eq!(sums.weighted, 0x06);
    }

    #[test]
    fn carry_adds_one() {
        // sum walks 0xFF, 0xFF; weighted 0xFF then 0xFF + 0xFF = 0x1FE -> 0xFE + 1.
        let sums = Checksum::compute(&[0xFF, 0x00]);
        assert_eq!(sums.sum, 0xFF);
        assert_eq!(sums.weighted, 0xFF);
    }

    #[test]
    fn display_is_hex_pair() {
        let sums = Checksum {
            sum: 0x0A,
            weighted: 0xB0,
        };
        assert_eq!(sums.to_string(), "0A/B0");
        assert_eq!(sums.to_bytes(), [0x0A, 0xB0]);
    }

    proptest! {
        #[test]
        fn single_byte_change_is_detected(
            body in prop::collection::vec(any::<u8>(), 1..260),
            index in any::<prop::sample::Index>(),
            delta in 1u8..=255,
        ) {
            let original = Checksum::compute(&body);
            let mut corrupted = body.clone();
            let i = index.index(corrupted.len());
            corrupted[i] = corrupted[i].wrapping_add(delta);
            prop_assert_ne!(original, Checksum::compute(&corrupted));
        }
    }
}
