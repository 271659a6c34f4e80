//! Synth Player - play or render nether-synth audio from the command line
//!
//! # Commands
//!
//! - `synth-player play` - Play the demo riff on the default audio device
//! - `synth-player render <OUT>` - Render the demo riff to a WAV file
//! - `synth-player config` - Write a default config.toml
//!
//! # Usage
//!
//! ```bash
//! # Four seconds of the riff with a looping clip underneath
//! synth-player play --seconds 4 --sample ambience.wav
//!
//! # Deterministic offline render
//! synth-player render riff.wav --seconds 8 --seed 42
//! ```

mod render;
mod riff;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use glam::Vec3;
use nether_synth::{AudioEngine, DEFAULT_RAMP, EngineConfig, Sample};
use tracing::{info, warn};

/// Synth Player - play or render nether-synth audio
#[derive(Parser)]
#[command(name = "synth-player")]
#[command(about = "Play or render nether-synth audio")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the demo riff on the default audio device
    Play(PlayArgs),

    /// Render the demo riff offline to a 32-bit float WAV
    Render(RenderArgs),

    /// Write a default config file
    Config(ConfigArgs),
}

#[derive(Args)]
struct MixArgs {
    /// Length in seconds
    #[arg(long, default_value_t = 4.0)]
    seconds: f32,

    /// WAV clip to loop under the riff
    #[arg(long)]
    sample: Option<PathBuf>,

    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Disable the crackle effect
    #[arg(long)]
    no_crackle: bool,
}

#[derive(Args)]
struct PlayArgs {
    #[command(flatten)]
    mix: MixArgs,

    /// Place the clip in 3D and orbit it around the listener
    #[arg(long)]
    orbit: bool,
}

#[derive(Args)]
struct RenderArgs {
    /// Output WAV path
    output: PathBuf,

    #[command(flatten)]
    mix: MixArgs,
}

#[derive(Args)]
struct ConfigArgs {
    /// Where to write (defaults to the platform config directory)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => {
            let config = engine_config(cli.config.as_ref(), &args.mix)?;
            play(&config, &args)
        }
        Commands::Render(args) => {
            let config = engine_config(cli.config.as_ref(), &args.mix)?;
            let background = load_sample(args.mix.sample.as_ref())?;
            render::render_to_wav(&args.output, args.mix.seconds, &config, background.as_ref())?;
            Ok(())
        }
        Commands::Config(args) => write_default_config(args),
    }
}

fn engine_config(path: Option<&PathBuf>, mix: &MixArgs) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => nether_synth::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => nether_synth::load(),
    };
    if mix.seed.is_some() {
        config.mix.seed = mix.seed;
    }
    if mix.no_crackle {
        config.mix.crackle = false;
    }
    Ok(config)
}

fn load_sample(path: Option<&PathBuf>) -> Result<Option<Sample>> {
    path.map(|path| {
        Sample::load(path).with_context(|| format!("Failed to load sample {}", path.display()))
    })
    .transpose()
}

fn play(config: &EngineConfig, args: &PlayArgs) -> Result<()> {
    let background = load_sample(args.mix.sample.as_ref())?;

    let mut engine = AudioEngine::init(config)?;
    if !engine.has_output() {
        warn!("No audio device; playing silently");
    }

    let handle = background.as_ref().map(|clip| {
        if args.orbit {
            engine.loop_3d(clip, 0.5, Vec3::new(0.0, 0.0, -2.0), 2.0)
        } else {
            engine.loop_sample(clip, 0.5, 0.0)
        }
    });

    let step = Duration::from_secs_f32(riff::STEP_SECONDS);
    let end = Instant::now() + Duration::from_secs_f32(args.mix.seconds.max(0.0));
    let mut index = 0;

    info!("Playing for {:.1}s", args.mix.seconds);
    while Instant::now() < end {
        riff::trigger(&engine, index)?;

        if let (Some(handle), true) = (&handle, args.orbit) {
            let angle = index as f32 * std::f32::consts::TAU / riff::STEPS as f32;
            let position = Vec3::new(angle.sin(), 0.0, -angle.cos()) * 2.0;
            handle.set_position(position, riff::STEP_SECONDS);
        }

        index += 1;
        std::thread::sleep(step);
    }

    engine.stop_all_samples(DEFAULT_RAMP);
    engine.set_volume(0.0, 0.1);
    std::thread::sleep(Duration::from_millis(150));
    engine.shutdown();
    Ok(())
}

fn write_default_config(args: ConfigArgs) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => nether_synth::config_dir()
            .map(|dir| dir.join("config.toml"))
            .context("Could not determine config directory")?,
    };

    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    nether_synth::save_to(&EngineConfig::default(), &path)?;
    info!("Wrote default config to {}", path.display());
    Ok(())
}
