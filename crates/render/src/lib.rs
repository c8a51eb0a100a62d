//! Frame loop: camera, city and atlas brought together for one draw per frame.
//!
//! The loop is renderer-agnostic. A [`RenderBackend`] owns the device-side
//! buffers; [`CityRenderer`] decides when they must be refreshed and in which
//! order the per-frame steps run.
//!
//! # Invariants
//! - A draw reads exactly one city generation and one atlas revision.
//! - Steady-state frames upload nothing; instance data is re-packed only
//!   after a rebuild or a texture-count change.
//! - Resizing touches only the projection aspect.
//! - A failed frame is dropped and counted; no state is lost.

mod backend;
mod error;
mod generation;
mod headless;
mod instance;
mod renderer;
mod stats;
mod uniforms;
mod worker;

pub use backend::RenderBackend;
pub use error::{FrameError, InitError, RenderError};
pub use generation::CityGeneration;
pub use headless::{DrawRecord, HeadlessBackend};
pub use instance::{InstanceRaw, pack_instances};
pub use renderer::{CityRenderer, FrameStatus, RendererOptions};
pub use stats::FrameStats;
pub use uniforms::FrameUniforms;

pub fn crate_info() -> &'static str {
    "cityscape-render v0.1.0"
}
