//! Texture Atlas Manager: procedurally synthesized facade textures.
//!
//! The atlas is a fixed-size set of equally sized RGBA8 images. The renderer
//! binds them as one texture array; buildings refer to a layer by index.
//!
//! # Invariants
//! - Every image in an atlas has the same square size.
//! - An atlas is never empty and never mutated once produced; regeneration
//!   builds a new atlas with a higher revision.
//! - Same config + revision => bit-identical pixels.

mod atlas;
mod facade;

pub use atlas::{
    AtlasConfig, MAX_TEXTURE_SIZE, MAX_TEXTURES, MIN_TEXTURE_SIZE, TextureAtlas,
    TextureAtlasManager,
};
pub use facade::{FacadeImage, FacadeStyle};

pub fn crate_info() -> &'static str {
    "cityscape-atlas v0.1.0"
}
