//! Shared building blocks for the cityscape crates.
//!
//! # Invariants
//! - Randomness is always derived from an explicit seed, never from global state.
//! - Fingerprints are stable across platforms (little-endian byte order).

mod error;
mod hash;
mod rng;

pub use error::ConfigurationError;
pub use hash::Fingerprint;
pub use rng::{SplitMix64, mix_seed, splitmix64};
