//! wgpu render backend for the city.
//!
//! Draws a street grid floor and every building in one instanced draw of the
//! shared block mesh, textured from a 2D texture array holding the facade
//! atlas.
//!
//! # Invariants
//! - Device or surface failure at startup is an [`InitError`], never a panic.
//! - Per-frame surface failures come back as [`FrameError`]; a lost or
//!   outdated surface is reconfigured before returning.
//! - Instance texture indices are clamped to the bound layer count.
//!
//! [`InitError`]: cityscape_render::InitError
//! [`FrameError`]: cityscape_render::FrameError

mod context;
mod gpu;
mod shaders;

pub use context::GfxContext;
pub use gpu::WgpuBackend;

use cityscape_render::{CityRenderer, RenderError, RendererOptions};

/// Bind to `target` and build a renderer drawing into it.
pub fn initialize(
    target: impl Into<wgpu::SurfaceTarget<'static>>,
    options: RendererOptions,
) -> Result<CityRenderer<WgpuBackend>, RenderError> {
    let context = GfxContext::new(target, options.width, options.height)?;
    let backend = WgpuBackend::new(context);
    CityRenderer::new(backend, options)
}
