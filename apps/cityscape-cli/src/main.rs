use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cityscape_atlas::{AtlasConfig, TextureAtlasManager};
use cityscape_camera::AutocamMode;
use cityscape_citygen::{CityConfiguration, generate};
use cityscape_render::{CityRenderer, FrameStatus, HeadlessBackend, RendererOptions};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cityscape-cli", about = "CLI tool for cityscape operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// City selection shared by the subcommands.
#[derive(clap::Args)]
struct CityArgs {
    /// City configuration (JSON); missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the seed
    #[arg(short, long)]
    seed: Option<u64>,
    /// Override the number of columns
    #[arg(long)]
    columns: Option<u32>,
    /// Override the number of rows
    #[arg(long)]
    rows: Option<u32>,
    /// Number of facade textures
    #[arg(short, long, default_value = "8")]
    textures: u32,
}

impl CityArgs {
    fn city_config(&self) -> Result<CityConfiguration> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => CityConfiguration::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(columns) = self.columns {
            config.columns = columns;
        }
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Generate a city and print a summary
    Generate {
        #[command(flatten)]
        city: CityArgs,
        /// Write the instance list as JSON
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Run an autocam mode through the headless frame loop
    Simulate {
        #[command(flatten)]
        city: CityArgs,
        /// Autocam mode (orbit, fly-through, random-walk, spin, ...)
        #[arg(short, long, default_value = "orbit")]
        mode: AutocamMode,
        /// Number of frames
        #[arg(short, long, default_value = "120")]
        frames: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016666")]
        dt: f32,
        /// Print the camera every N frames
        #[arg(long, default_value = "30")]
        every: u32,
    },
    /// Summarize a texture atlas
    Textures {
        /// Number of textures
        #[arg(short, long, default_value = "8")]
        count: u32,
        /// Pixel size of each texture
        #[arg(long, default_value = "128")]
        size: u32,
        /// Atlas seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Regenerate this many times before printing
        #[arg(long, default_value = "0")]
        revisions: u32,
    },
    /// List the autocam modes
    Modes,
}

fn load_config(path: &Path) -> Result<CityConfiguration> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("cityscape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("atlas: {}", cityscape_atlas::crate_info());
            println!("citygen: {}", cityscape_citygen::crate_info());
            println!("render: {}", cityscape_render::crate_info());
        }
        Commands::Generate { city, dump } => {
            let config = city.city_config()?;
            let generated = generate(&config, city.textures)?;
            let bounds = generated.bounds();
            println!(
                "City: {}x{} seed={} buildings={}",
                config.columns,
                config.rows,
                config.seed,
                generated.len()
            );
            println!(
                "Bounds: min=({:.1}, {:.1}, {:.1}) max=({:.1}, {:.1}, {:.1})",
                bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
            );
            let tallest = generated
                .instances()
                .iter()
                .map(|i| i.bounding_box().max.y)
                .fold(0.0_f32, f32::max);
            println!("Tallest: {tallest:.1}");
            println!("Fingerprint: {:016x}", generated.fingerprint());

            if let Some(path) = dump {
                let json = serde_json::to_string_pretty(generated.instances())?;
                std::fs::write(&path, json)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Instances written to {}", path.display());
            }
        }
        Commands::Simulate {
            city,
            mode,
            frames,
            dt,
            every,
        } => {
            if every == 0 {
                bail!("--every must be at least 1");
            }
            let options = RendererOptions {
                city: city.city_config()?,
                atlas: AtlasConfig {
                    count: city.textures,
                    size: 32,
                    ..AtlasConfig::default()
                },
                ..RendererOptions::default()
            };
            let mut renderer = CityRenderer::new(HeadlessBackend::new(), options)?;
            renderer.set_autocam_mode(mode);
            println!("Simulating {mode} for {frames} frames (dt={dt})");

            for frame in 0..frames {
                if renderer.render_frame(dt) == FrameStatus::Dropped {
                    tracing::warn!(frame, "frame dropped");
                }
                if frame % every == 0 {
                    let s = renderer.camera().state();
                    println!(
                        "  [{frame:>5}] eye=({:.2}, {:.2}, {:.2}) look=({:.2}, {:.2}, {:.2})",
                        s.position.x,
                        s.position.y,
                        s.position.z,
                        s.look_at.x,
                        s.look_at.y,
                        s.look_at.z
                    );
                }
            }
            let stats = renderer.stats();
            println!(
                "Frames: presented={} dropped={} city_uploads={} atlas_uploads={}",
                stats.presented, stats.dropped, stats.city_uploads, stats.atlas_uploads
            );
            print!("{}", renderer.backend().describe());
        }
        Commands::Textures {
            count,
            size,
            seed,
            revisions,
        } => {
            let mut manager = TextureAtlasManager::new(AtlasConfig { count, size, seed })?;
            let mut atlas = manager.current()?;
            for _ in 0..revisions {
                atlas = manager.regenerate(None)?;
            }
            println!(
                "Atlas: revision={} textures={} size={}x{} fingerprint={:016x}",
                atlas.revision(),
                atlas.len(),
                atlas.texture_size(),
                atlas.texture_size(),
                atlas.fingerprint()
            );
            for (i, image) in atlas.images().iter().enumerate() {
                println!(
                    "  [{i:>3}] style={:<11} lit={:.1}%",
                    image.style().name(),
                    image.lit_fraction() * 100.0
                );
            }
        }
        Commands::Modes => {
            for mode in AutocamMode::ALL {
                let kind = if mode.is_autonomous() { "autonomous" } else { "manual" };
                println!("{:<12} {:<12} {kind}", mode.slug(), mode.name());
            }
        }
    }

    Ok(())
}
