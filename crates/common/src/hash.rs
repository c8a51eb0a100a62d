/// Incremental FNV-1a fingerprint.
///
/// Used to compare generated data bit-for-bit (instance lists, atlas pixels)
/// without keeping copies around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint(u64);

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprint {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    pub fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(&self) -> u64 {
        self.0
    }

    /// One-shot fingerprint of a byte slice.
    pub fn of(bytes: &[u8]) -> u64 {
        let mut fp = Self::new();
        fp.write(bytes);
        fp.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_offset_basis() {
        assert_eq!(Fingerprint::of(&[]), 0xcbf2_9ce4_8422_2325);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut fp = Fingerprint::new();
        fp.write(b"city");
        fp.write(b"scape");
        assert_eq!(fp.finish(), Fingerprint::of(b"cityscape"));
    }

    #[test]
    fn different_bytes_differ() {
        assert_ne!(Fingerprint::of(b"a"), Fingerprint::of(b"b"));
    }
}
