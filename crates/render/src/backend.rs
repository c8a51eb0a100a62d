use cityscape_atlas::TextureAtlas;

use crate::error::FrameError;
use crate::generation::CityGeneration;
use crate::uniforms::FrameUniforms;

/// Device-side half of the frame loop.
///
/// The renderer calls the upload methods only when the corresponding data
/// changed; a backend keeps what it was last given and draws from that.
pub trait RenderBackend {
    /// Replace the bound texture array with `atlas`.
    fn upload_atlas(&mut self, atlas: &TextureAtlas) -> Result<(), FrameError>;

    /// Replace the instance buffer (and anything derived from the city
    /// layout) with `city`. Texture indices must be clamped to `layers`.
    fn upload_city(&mut self, city: &CityGeneration, layers: u32) -> Result<(), FrameError>;

    /// Output surface changed size.
    fn resize(&mut self, width: u32, height: u32);

    /// Issue one instanced draw of the last uploaded city with the last
    /// uploaded atlas.
    fn draw(&mut self, uniforms: &FrameUniforms) -> Result<(), FrameError>;
}
