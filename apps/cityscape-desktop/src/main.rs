use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cityscape_atlas::AtlasConfig;
use cityscape_citygen::CityConfiguration;
use cityscape_render::{CityRenderer, RendererOptions};
use cityscape_render_wgpu::WgpuBackend;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

mod gestures;

use gestures::{Gestures, HostAction};

const STATS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "cityscape-desktop", about = "Procedural night city flythrough")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// City configuration (JSON); missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the city seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the grid size as COLUMNSxROWS
    #[arg(long, value_parser = parse_grid)]
    grid: Option<(u32, u32)>,

    /// Number of facade textures
    #[arg(long, default_value = "8")]
    textures: u32,

    /// Start with autocam on
    #[arg(long)]
    autocam: bool,
}

fn parse_grid(s: &str) -> Result<(u32, u32), String> {
    let (c, r) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected COLUMNSxROWS, got {s:?}"))?;
    let c = c.trim().parse().map_err(|e| format!("columns: {e}"))?;
    let r = r.trim().parse().map_err(|e| format!("rows: {e}"))?;
    Ok((c, r))
}

impl Cli {
    fn city_config(&self) -> Result<CityConfiguration> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => CityConfiguration::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some((columns, rows)) = self.grid {
            config.columns = columns;
            config.rows = rows;
        }
        config.validate()?;
        Ok(config)
    }
}

struct App {
    options: RendererOptions,
    start_autocam: bool,
    window: Option<Arc<Window>>,
    renderer: Option<CityRenderer<WgpuBackend>>,
    gestures: Gestures,
    last_frame: Instant,
    last_report: Instant,
}

impl App {
    fn new(options: RendererOptions, start_autocam: bool) -> Self {
        Self {
            options,
            start_autocam,
            window: None,
            renderer: None,
            gestures: Gestures::new(),
            last_frame: Instant::now(),
            last_report: Instant::now(),
        }
    }

    fn apply(&mut self, action: HostAction, event_loop: &ActiveEventLoop) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        match action {
            HostAction::Delta(kind, value) => {
                renderer.apply_camera_delta(kind, value);
            }
            HostAction::ToggleAutocam => {
                renderer.toggle_autocam();
            }
            HostAction::SetMode(mode) => {
                renderer.set_autocam_mode(mode);
            }
            HostAction::Rebuild => {
                if let Err(e) = renderer.rebuild_city(None) {
                    tracing::error!("rebuild failed: {e}");
                }
            }
            HostAction::RebuildInBackground => {
                if let Err(e) = renderer.rebuild_city_in_background(None) {
                    tracing::error!("background rebuild failed: {e}");
                }
            }
            HostAction::RegenerateTextures => {
                if let Err(e) = renderer.regenerate_textures(None) {
                    tracing::error!("texture regeneration failed: {e}");
                }
            }
            HostAction::AdjustTextures(step) => {
                let count = renderer.atlas().len().saturating_add_signed(step);
                if let Err(e) = renderer.regenerate_textures(Some(count)) {
                    tracing::warn!("texture count {count} rejected: {e}");
                }
            }
            HostAction::Quit => event_loop.exit(),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        for action in self.gestures.held_deltas(dt) {
            self.apply(action, event_loop);
        }

        let Some(renderer) = &mut self.renderer else {
            return;
        };
        renderer.render_frame(dt);

        if now - self.last_report >= STATS_INTERVAL {
            self.last_report = now;
            let stats = renderer.stats();
            tracing::info!(
                presented = stats.presented,
                dropped = stats.dropped,
                city_uploads = stats.city_uploads,
                atlas_uploads = stats.atlas_uploads,
                mode = %renderer.camera().mode(),
                frame_ms = stats.frame_time.as_secs_f32() * 1000.0,
                "frame stats"
            );
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Cityscape")
            .with_inner_size(PhysicalSize::new(self.options.width, self.options.height));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let options = RendererOptions {
            width: size.width,
            height: size.height,
            ..self.options.clone()
        };
        match cityscape_render_wgpu::initialize(window.clone(), options) {
            Ok(mut renderer) => {
                if self.start_autocam {
                    renderer.toggle_autocam();
                }
                self.renderer = Some(renderer);
            }
            Err(e) => {
                tracing::error!("renderer initialization failed: {e}");
                event_loop.exit();
                return;
            }
        }

        self.last_frame = Instant::now();
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(action) = self.gestures.key(key, state == ElementState::Pressed) {
                    self.apply(action, event_loop);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.gestures.set_dragging(state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                for action in self.gestures.cursor_moved(position.x, position.y) {
                    self.apply(action, event_loop);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                let action = self.gestures.wheel(lines);
                self.apply(action, event_loop);
            }
            WindowEvent::Focused(false) => {
                self.gestures.set_dragging(false);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let options = RendererOptions {
        city: cli.city_config()?,
        atlas: AtlasConfig {
            count: cli.textures,
            ..AtlasConfig::default()
        },
        ..RendererOptions::default()
    };
    options.atlas.validate()?;

    tracing::info!(
        columns = options.city.columns,
        rows = options.city.rows,
        seed = options.city.seed,
        textures = options.atlas.count,
        "cityscape-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(options, cli.autocam);
    event_loop.run_app(&mut app)?;

    Ok(())
}
