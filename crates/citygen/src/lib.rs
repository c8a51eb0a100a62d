//! City Generator: lays out a grid of blocks and produces one building
//! instance per block, all sharing a single unit-block base mesh.
//!
//! # Invariants
//! - Same configuration + texture count => bit-identical instance list.
//! - Per-building randomness is keyed by (seed, column, row); there is no
//!   shared mutable RNG, so generation is safe to run concurrently.
//! - Every texture index lies in `[0, texture_count)`.
//! - Every building has a bounding box of positive volume.
//! - A generated [`City`] is never mutated; a rebuild produces a new one.

mod config;
mod generator;
mod instance;
mod layout;
mod mesh;

pub use config::{CityConfiguration, MAX_BUILDINGS, MAX_LENGTH, MIN_DIMENSION, Range};
pub use generator::{City, generate};
pub use instance::{Aabb, BuildingInstance};
pub use layout::{CellCoord, GridLayout};
pub use mesh::{BaseMesh, Vertex};

pub fn crate_info() -> &'static str {
    "cityscape-citygen v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("citygen"));
    }
}
