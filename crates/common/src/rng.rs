/// Splitmix64 step: a fast, high-quality mixing function.
///
/// Used both to advance seeds (city rebuilds) and to derive independent
/// streams from a seed plus coordinates.
pub fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Fold a sequence of words into a seed. Order matters: `[a, b] != [b, a]`.
pub fn mix_seed(seed: u64, words: &[u64]) -> u64 {
    words
        .iter()
        .fold(splitmix64(seed), |acc, &w| splitmix64(acc ^ w.wrapping_mul(0x2545_f491_4f6c_dd1d)))
}

/// Deterministic pseudo-random stream.
///
/// Every consumer owns its own stream. Two streams built from the same seed
/// yield the same sequence regardless of what other streams do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Stream keyed by a seed and a list of coordinates (e.g. grid column/row).
    pub fn keyed(seed: u64, words: &[u64]) -> Self {
        Self::new(mix_seed(seed, words))
    }

    /// Current internal state; `SplitMix64::new(rng.state())` resumes the stream.
    pub fn state(&self) -> u64 {
        self.state
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        // 24 high bits fit exactly in an f32 mantissa.
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform float in `[min, max)`. Returns `min` when the range is empty.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_f32()
    }

    /// Uniform integer in `[0, bound)`. `bound` must be non-zero.
    pub fn below(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0, "bound must be non-zero");
        (((self.next_u64() >> 32) * bound as u64) >> 32) as u32
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }
}
