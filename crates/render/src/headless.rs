use cityscape_atlas::TextureAtlas;
use cityscape_common::Fingerprint;
use glam::Mat4;

use crate::backend::RenderBackend;
use crate::error::FrameError;
use crate::generation::CityGeneration;
use crate::instance::{InstanceRaw, pack_instances};
use crate::uniforms::FrameUniforms;

/// What one successful draw consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub city_id: u64,
    pub instance_count: usize,
    /// Fingerprint of the packed instance bytes that were drawn.
    pub instance_fingerprint: u64,
    pub atlas_revision: u64,
    pub layers: u32,
    /// Largest texture index in the drawn instances.
    pub max_texture_index: Option<u32>,
    pub view_proj: Mat4,
}

#[derive(Debug, Clone)]
struct UploadedCity {
    id: u64,
    instances: Vec<InstanceRaw>,
    fingerprint: u64,
    street_lines: usize,
}

#[derive(Debug, Clone, Copy)]
struct UploadedAtlas {
    revision: u64,
    layers: u32,
    size: u32,
}

/// Backend without a device. Keeps uploaded data in memory and records every
/// draw, for tests and the CLI.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    width: u32,
    height: u32,
    city: Option<UploadedCity>,
    atlas: Option<UploadedAtlas>,
    city_uploads: u32,
    atlas_uploads: u32,
    fail_draws: u32,
    fail_uploads: u32,
    draws: Vec<DrawRecord>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` draws fail with a transient error.
    pub fn fail_next_draws(&mut self, n: u32) {
        self.fail_draws = n;
    }

    /// Make the next `n` atlas or city uploads fail with a transient error.
    pub fn fail_next_uploads(&mut self, n: u32) {
        self.fail_uploads = n;
    }

    fn injected_upload_failure(&mut self) -> Result<(), FrameError> {
        if self.fail_uploads > 0 {
            self.fail_uploads -= 1;
            return Err(FrameError::Backend("injected upload failure".into()));
        }
        Ok(())
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn last_draw(&self) -> Option<&DrawRecord> {
        self.draws.last()
    }

    pub fn city_uploads(&self) -> u32 {
        self.city_uploads
    }

    pub fn atlas_uploads(&self) -> u32 {
        self.atlas_uploads
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Fingerprint of the instance buffer currently held, if any.
    pub fn instance_fingerprint(&self) -> Option<u64> {
        self.city.as_ref().map(|c| c.fingerprint)
    }

    /// Human-readable summary of the backend state.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== Headless backend ({}x{}) ===\n",
            self.width, self.height
        ));
        match &self.city {
            Some(c) => out.push_str(&format!(
                "City: generation={} instances={} streets={} fingerprint={:016x}\n",
                c.id,
                c.instances.len(),
                c.street_lines,
                c.fingerprint
            )),
            None => out.push_str("City: none\n"),
        }
        match &self.atlas {
            Some(a) => out.push_str(&format!(
                "Atlas: revision={} layers={} size={}\n",
                a.revision, a.layers, a.size
            )),
            None => out.push_str("Atlas: none\n"),
        }
        out.push_str(&format!(
            "Uploads: city={} atlas={} | Draws: {}\n",
            self.city_uploads,
            self.atlas_uploads,
            self.draws.len()
        ));
        out
    }
}

impl RenderBackend for HeadlessBackend {
    fn upload_atlas(&mut self, atlas: &TextureAtlas) -> Result<(), FrameError> {
        self.injected_upload_failure()?;
        self.atlas = Some(UploadedAtlas {
            revision: atlas.revision(),
            layers: atlas.len(),
            size: atlas.texture_size(),
        });
        self.atlas_uploads += 1;
        Ok(())
    }

    fn upload_city(&mut self, city: &CityGeneration, layers: u32) -> Result<(), FrameError> {
        self.injected_upload_failure()?;
        let instances = pack_instances(city.city(), layers);
        let fingerprint = Fingerprint::of(bytemuck::cast_slice(&instances));
        self.city = Some(UploadedCity {
            id: city.id(),
            instances,
            fingerprint,
            street_lines: city.city().layout().street_lines().len(),
        });
        self.city_uploads += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn draw(&mut self, uniforms: &FrameUniforms) -> Result<(), FrameError> {
        if self.fail_draws > 0 {
            self.fail_draws -= 1;
            return Err(FrameError::Backend("injected draw failure".into()));
        }
        let (Some(city), Some(atlas)) = (&self.city, &self.atlas) else {
            return Err(FrameError::NotReady);
        };
        self.draws.push(DrawRecord {
            city_id: city.id,
            instance_count: city.instances.len(),
            instance_fingerprint: city.fingerprint,
            atlas_revision: atlas.revision,
            layers: atlas.layers,
            max_texture_index: city.instances.iter().map(|i| i.texture_index).max(),
            view_proj: uniforms.view_proj,
        });
        Ok(())
    }
}
