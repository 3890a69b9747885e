use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use stagecraft_assets::{Geometry, Material};
use stagecraft_common::Color;
use stagecraft_driver::{
    DemoConfig, FixedRate, FrameScheduler, Unpaced, Variant, Viewport, build, run_with,
};
use stagecraft_input::CameraCommand;
use stagecraft_render::{DebugTextRenderer, Renderer};
use stagecraft_scene::{Scene, scatter};
use stagecraft_tools::SceneInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stagecraft-cli", about = "Headless runner for the stagecraft demos")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run a demo for a number of frames and print the last one
    Run {
        /// basic, orbit or scroll
        #[arg(long, default_value = "basic")]
        variant: Variant,
        /// Number of frames to run
        #[arg(short, long, default_value = "10")]
        frames: u64,
        /// Scroll offset applied before the first frame
        #[arg(long, allow_hyphen_values = true)]
        scroll: Option<f32>,
        /// Orbit drag in pixels applied before the first frame, as DX,DY
        #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
        drag: Option<(f32, f32)>,
        /// Texture directory
        #[arg(long)]
        asset_dir: Option<PathBuf>,
        /// Pace frames at this rate instead of running flat out
        #[arg(long)]
        fps: Option<u32>,
    },
    /// Scatter stars into an empty scene and check their placement
    Starfield {
        #[arg(short, long, default_value = "200")]
        count: usize,
        #[arg(short, long, default_value = "100")]
        radius: f32,
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Print the effective demo configuration as JSON
    Config {
        #[arg(long, default_value = "basic")]
        variant: Variant,
    },
}

fn parse_pair(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY but got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("invalid number '{v}': {e}"))
    };
    Ok((parse(x)?, parse(y)?))
}

fn scheduler_for(fps: Option<u32>) -> Box<dyn FrameScheduler> {
    match fps {
        Some(fps) => Box::new(FixedRate::per_second(fps)),
        None => Box::new(Unpaced),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("stagecraft-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", stagecraft_render::crate_info());
            let variants: Vec<&str> = Variant::ALL.iter().map(|v| v.name()).collect();
            println!("variants: {}", variants.join(", "));
        }
        Commands::Run {
            variant,
            frames,
            scroll,
            drag,
            asset_dir,
            fps,
        } => {
            let mut config = DemoConfig {
                variant,
                ..DemoConfig::default()
            };
            if let Some(dir) = asset_dir {
                config.asset_dir = dir;
            }
            let mut stage = build(&config, Viewport::new(1280, 720))?;
            if let Some(offset) = scroll {
                stage.push(CameraCommand::Scroll { offset });
            }
            if let Some((dx, dy)) = drag {
                stage.push(CameraCommand::Orbit { dx, dy });
            }

            let mut scheduler = scheduler_for(fps);
            let mut renderer = DebugTextRenderer::new();
            let mut last_frame = None;
            let rendered = run_with(
                &mut stage,
                &mut renderer,
                scheduler.as_mut(),
                |s| s.scene().frame() < frames,
                |dump| last_frame = Some(dump),
            );
            tracing::debug!(rendered, "headless run complete");

            println!("{}", SceneInspector::summary(stage.scene(), stage.camera()));
            let dump = last_frame
                .unwrap_or_else(|| renderer.render(stage.scene(), stage.camera()));
            print!("{dump}");
        }
        Commands::Starfield {
            count,
            radius,
            seed,
        } => {
            let mut scene = Scene::new();
            let star = scene.geometry(Geometry::Sphere {
                radius: 0.25,
                width_segments: 24,
                height_segments: 24,
            })?;
            let material = scene.material(Material::standard("star", Color::WHITE))?;
            let mut rng = StdRng::seed_from_u64(seed);
            let ids = scatter(&mut scene, count, radius, star, material, &mut rng)?;

            let in_bounds = ids
                .iter()
                .filter_map(|id| scene.get(*id))
                .all(|n| n.transform.position.abs().max_element() <= radius);
            println!("Starfield: seed={seed} radius={radius}");
            println!("Stars: {} (scene nodes: {})", ids.len(), scene.node_count());
            println!("Within bounds: {}", if in_bounds { "OK" } else { "VIOLATION" });
            println!("State hash: {:#018x}", scene.state_hash());
        }
        Commands::Config { variant } => {
            let config = DemoConfig {
                variant,
                ..DemoConfig::default()
            };
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
