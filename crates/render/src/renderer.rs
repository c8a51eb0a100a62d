use std::sync::Arc;
use std::time::Instant;

use cityscape_atlas::{AtlasConfig, TextureAtlas, TextureAtlasManager};
use cityscape_camera::{AutocamMode, AutocamRig, Camera, DeltaKind, Projection};
use cityscape_citygen::{City, CityConfiguration, generate};
use cityscape_common::{ConfigurationError, splitmix64};

use crate::backend::RenderBackend;
use crate::error::{FrameError, RenderError};
use crate::generation::CityGeneration;
use crate::stats::FrameStats;
use crate::uniforms::FrameUniforms;
use crate::worker::GenerationWorker;

/// Everything the renderer needs at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererOptions {
    pub city: CityConfiguration,
    pub atlas: AtlasConfig,
    pub projection: Projection,
    pub width: u32,
    pub height: u32,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            city: CityConfiguration::default(),
            atlas: AtlasConfig::default(),
            projection: Projection::default(),
            width: 1280,
            height: 720,
        }
    }
}

/// Outcome of one [`CityRenderer::render_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// A transient failure skipped the frame; state is intact.
    Dropped,
}

/// The frame loop plus the command surface the host drives it with.
pub struct CityRenderer<B: RenderBackend> {
    backend: B,
    config: CityConfiguration,
    atlases: TextureAtlasManager,
    city: Arc<CityGeneration>,
    atlas: Arc<TextureAtlas>,
    camera: Camera,
    rig: AutocamRig,
    projection: Projection,
    /// (generation id, atlas layers) currently held by the backend.
    uploaded_city: Option<(u64, u32)>,
    uploaded_atlas: Option<u64>,
    next_ticket: u64,
    worker: GenerationWorker,
    stats: FrameStats,
    last_uniforms: Option<FrameUniforms>,
}

impl<B: RenderBackend> CityRenderer<B> {
    /// Generate the initial atlas and city and bind them to `backend`.
    pub fn new(mut backend: B, options: RendererOptions) -> Result<Self, RenderError> {
        let atlases = TextureAtlasManager::new(options.atlas)?;
        let atlas = atlases.current()?;
        let city = generate(&options.city, atlas.len())?;

        let mut projection = options.projection;
        projection.set_viewport(options.width, options.height);
        backend.resize(options.width, options.height);

        let rig = rig_for(&city);
        tracing::info!(
            buildings = city.len(),
            textures = atlas.len(),
            width = options.width,
            height = options.height,
            "renderer ready"
        );

        Ok(Self {
            backend,
            config: options.city,
            atlases,
            city: Arc::new(CityGeneration::new(1, city)),
            atlas: Arc::new(atlas),
            camera: Camera::overlooking(&rig),
            rig,
            projection,
            uploaded_city: None,
            uploaded_atlas: None,
            next_ticket: 2,
            worker: GenerationWorker::new(),
            stats: FrameStats::default(),
            last_uniforms: None,
        })
    }

    /// Produce one frame, `dt` seconds after the previous one.
    ///
    /// Background generations that finished are installed first, so the
    /// whole frame sees a single city. Transient failures drop the frame.
    pub fn render_frame(&mut self, dt: f32) -> FrameStatus {
        let _span = tracing::debug_span!("render_frame", frame = self.stats.frames()).entered();
        let started = Instant::now();

        self.install_finished();

        if self.camera.mode() != AutocamMode::Off {
            self.camera.advance(&self.rig, dt);
        }

        let uniforms = FrameUniforms::compose(self.camera.state(), &self.projection);
        self.last_uniforms = Some(uniforms);

        let status = match self.submit(&uniforms) {
            Ok(()) => {
                self.stats.presented += 1;
                FrameStatus::Presented
            }
            Err(err) => {
                self.stats.dropped += 1;
                tracing::warn!(%err, dropped = self.stats.dropped, "frame dropped");
                FrameStatus::Dropped
            }
        };
        self.stats.frame_time = started.elapsed();
        status
    }

    fn submit(&mut self, uniforms: &FrameUniforms) -> Result<(), FrameError> {
        if self.uploaded_atlas != Some(self.atlas.revision()) {
            self.backend.upload_atlas(&self.atlas)?;
            self.uploaded_atlas = Some(self.atlas.revision());
            self.stats.atlas_uploads += 1;
            tracing::debug!(revision = self.atlas.revision(), layers = self.atlas.len(), "atlas uploaded");
        }

        let wanted = (self.city.id(), self.atlas.len());
        if self.uploaded_city != Some(wanted) {
            self.backend.upload_city(&self.city, self.atlas.len())?;
            self.uploaded_city = Some(wanted);
            self.stats.city_uploads += 1;
            tracing::debug!(
                generation = self.city.id(),
                instances = self.city.city().len(),
                "instances uploaded"
            );
        }

        self.backend.draw(uniforms)
    }

    /// Output surface resized. Only the projection aspect changes; zero
    /// sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.projection.set_viewport(width, height) {
            return false;
        }
        self.backend.resize(width, height);
        tracing::debug!(width, height, aspect = self.projection.aspect, "resized");
        true
    }

    /// Regenerate the city and swap it in.
    ///
    /// `None` keeps the current configuration with the next seed in the
    /// sequence. An invalid configuration leaves everything unchanged.
    /// Returns the id of the installed generation.
    pub fn rebuild_city(&mut self, config: Option<CityConfiguration>) -> Result<u64, ConfigurationError> {
        let config = config.unwrap_or_else(|| self.next_config());
        let city = generate(&config, self.atlas.len())?;
        self.config = config;
        let ticket = self.take_ticket();
        self.install(ticket, city);
        Ok(ticket)
    }

    /// Like [`rebuild_city`](Self::rebuild_city) but generates on a worker
    /// thread. Validation is synchronous; the result is installed at a later
    /// frame boundary unless a newer rebuild supersedes it.
    pub fn rebuild_city_in_background(
        &mut self,
        config: Option<CityConfiguration>,
    ) -> Result<u64, ConfigurationError> {
        let config = config.unwrap_or_else(|| self.next_config());
        config.validate()?;
        self.config = config.clone();
        let ticket = self.take_ticket();
        let textures = self.atlas.len();

        if let Err(err) = self.worker.spawn(ticket, config.clone(), textures) {
            tracing::warn!(%err, "worker unavailable; generating on the frame thread");
            let city = generate(&config, textures)?;
            self.install(ticket, city);
        } else {
            tracing::info!(ticket, seed = config.seed, "background rebuild started");
        }
        Ok(ticket)
    }

    /// Block until background rebuilds have finished. Their results are
    /// still installed by the next frame, not here.
    pub fn wait_for_background(&mut self) {
        self.worker.wait();
    }

    pub fn pending_generations(&self) -> usize {
        self.worker.in_flight()
    }

    /// Produce a new atlas. `None` keeps the count and yields new
    /// variations. A different count regenerates the city for it before
    /// either is swapped in. Returns the layer count.
    pub fn regenerate_textures(&mut self, count: Option<u32>) -> Result<u32, ConfigurationError> {
        let count = count.unwrap_or(self.atlas.len());
        let _span = tracing::info_span!("regenerate_atlas", count).entered();
        AtlasConfig {
            count,
            ..*self.atlases.config()
        }
        .validate()?;

        let city = if count != self.atlas.len() {
            Some(generate(&self.config, count)?)
        } else {
            None
        };
        let atlas = self.atlases.regenerate(Some(count))?;

        self.atlas = Arc::new(atlas);
        if let Some(city) = city {
            let ticket = self.take_ticket();
            self.install(ticket, city);
        }
        Ok(count)
    }

    /// Flip autocam on (last mode, `Orbit` initially) or off.
    pub fn toggle_autocam(&mut self) -> AutocamMode {
        self.camera.toggle_autocam()
    }

    pub fn set_autocam_mode(&mut self, mode: AutocamMode) -> bool {
        self.camera.set_mode(mode)
    }

    /// Manual camera control. Ignored while an autonomous mode is active.
    pub fn apply_camera_delta(&mut self, kind: DeltaKind, value: f32) -> bool {
        self.camera.apply_delta(kind, value)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn config(&self) -> &CityConfiguration {
        &self.config
    }

    /// The installed city generation.
    pub fn city(&self) -> &Arc<CityGeneration> {
        &self.city
    }

    pub fn atlas(&self) -> &Arc<TextureAtlas> {
        &self.atlas
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Uniforms composed by the most recent frame.
    pub fn last_uniforms(&self) -> Option<&FrameUniforms> {
        self.last_uniforms.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn next_config(&self) -> CityConfiguration {
        CityConfiguration {
            seed: splitmix64(self.config.seed),
            ..self.config.clone()
        }
    }

    fn take_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    fn install(&mut self, ticket: u64, city: City) {
        self.rig = rig_for(&city);
        tracing::info!(
            generation = ticket,
            buildings = city.len(),
            seed = city.config().seed,
            "city installed"
        );
        self.city = Arc::new(CityGeneration::new(ticket, city));
        self.stats.cities_installed += 1;
    }

    fn install_finished(&mut self) {
        for done in self.worker.take_ready() {
            if done.ticket <= self.city.id() || done.texture_count != self.atlas.len() {
                self.stats.generations_discarded += 1;
                tracing::debug!(ticket = done.ticket, current = self.city.id(), "discarding superseded city");
                continue;
            }
            match done.city {
                Ok(city) => self.install(done.ticket, city),
                Err(err) => {
                    self.stats.generations_discarded += 1;
                    tracing::warn!(ticket = done.ticket, %err, "background generation failed");
                }
            }
        }
    }
}

fn rig_for(city: &City) -> AutocamRig {
    let bounds = city.bounds();
    AutocamRig::from_bounds(bounds.min, bounds.max)
}
