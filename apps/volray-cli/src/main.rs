use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use volray_common::{CameraMode, ChannelFillPolicy, EngineConfig, Viewport};
use volray_input::{InputEvent, Key};
use volray_kernel::EngineState;
use volray_render::{CameraController, Projection, RecordingBackend, encode};
use volray_volume::{NoiseSeed, VolumeDims, VolumeGenerator};

#[derive(Parser)]
#[command(name = "volray-cli", about = "Headless tooling for the volray renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML engine config; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Noise seed (0..=65535)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// free_fly, orbit or arcball
    #[arg(long, global = true)]
    camera_mode: Option<CameraMode>,

    /// uniform or random_red
    #[arg(long, global = true)]
    channel_fill: Option<ChannelFillPolicy>,

    /// Edge length of the cubic volume grid
    #[arg(long, global = true)]
    grid_size: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Generate the density volume and print its fingerprint
    Generate {
        /// Write the raw RGBA8 bytes here
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Encode one frame's uniform block for a camera pose
    Encode {
        /// Camera position as x,y,z
        #[arg(long, value_delimiter = ',', default_values_t = [0.0, 0.0, -1.0])]
        position: Vec<f32>,
        #[arg(long, default_value = "0")]
        yaw: f32,
        #[arg(long, default_value = "0")]
        pitch: f32,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// Light direction as x,y,z
        #[arg(long, value_delimiter = ',')]
        light: Option<Vec<f32>>,
        /// Write the raw 256 bytes here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the frame loop against a recording backend
    Simulate {
        #[arg(short, long, default_value = "60")]
        ticks: u32,
        /// Seconds per tick
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// Keys held for the whole run (w, a, s, d, space, shift)
        #[arg(long, value_delimiter = ',')]
        hold: Vec<Key>,
        /// Pointer motion per tick as dx,dy; engages look mode
        #[arg(long, value_delimiter = ',')]
        look: Option<Vec<f32>>,
        #[arg(long)]
        json: bool,
    },
}

fn vec3_arg(values: &[f32]) -> anyhow::Result<Vec3> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => anyhow::bail!("expected three comma-separated values, got {}", values.len()),
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(mode) = cli.camera_mode {
        config.camera_mode = mode;
    }
    if let Some(policy) = cli.channel_fill {
        config.channel_fill = policy;
    }
    if let Some(size) = cli.grid_size {
        config.grid_size = size;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Info => {
            println!("volray-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", volray_input::crate_info());
            println!("volume: {}", volray_volume::crate_info());
            println!("render: {}", volray_render::crate_info());
            println!("kernel: {}", volray_kernel::crate_info());
        }
        Commands::Generate { output, json } => {
            let dims = VolumeDims::cube(config.grid_size);
            let seed = NoiseSeed::or_fallback(config.seed);
            let start = Instant::now();
            let grid = VolumeGenerator::new(seed)
                .with_dims(dims)
                .with_policy(config.channel_fill)
                .generate()?;
            let elapsed = start.elapsed();

            if let Some(path) = &output {
                std::fs::write(path, grid.as_bytes())
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!("wrote {} bytes to {}", grid.as_bytes().len(), path.display());
            }

            if json {
                let out = serde_json::json!({
                    "seed": seed.value(),
                    "dims": [dims.width, dims.height, dims.depth],
                    "channel_fill": config.channel_fill,
                    "bytes": grid.as_bytes().len(),
                    "fingerprint": grid.fingerprint(),
                    "elapsed_ms": elapsed.as_secs_f64() * 1000.0,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "seed={} dims={}x{}x{} fill={:?}",
                    seed.value(),
                    dims.width,
                    dims.height,
                    dims.depth,
                    config.channel_fill
                );
                println!("fingerprint: {}", grid.fingerprint());
                println!("generated in {:.1} ms", elapsed.as_secs_f64() * 1000.0);
            }
        }
        Commands::Encode {
            position,
            yaw,
            pitch,
            width,
            height,
            light,
            output,
        } => {
            let mut camera = CameraController::new(config.camera_mode, vec3_arg(&position)?);
            // One second at unit sensitivity turns by exactly (yaw, pitch).
            camera.mouse_sensitivity = 1.0;
            camera.update(1.0, (yaw, pitch), &[]);

            let viewport = Viewport::new(width, height);
            let light = light.as_deref().map(vec3_arg).transpose()?;
            let uniforms = encode(
                &camera.view(),
                glam::Mat4::IDENTITY,
                &Projection::for_viewport(viewport),
                viewport,
                light,
            )?;

            if let Some(path) = &output {
                std::fs::write(path, uniforms.as_bytes())
                    .with_context(|| format!("writing {}", path.display()))?;
            }

            let out = serde_json::json!({
                "camera": camera.state(),
                "mvp": uniforms.mvp,
                "inv_view": uniforms.inv_view,
                "inv_model": uniforms.inv_model,
                "viewport": uniforms.viewport,
                "camera_position": uniforms.camera_position,
                "light_direction": uniforms.light_direction,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Simulate {
            ticks,
            dt,
            hold,
            look,
            json,
        } => {
            let look = match look.as_deref() {
                Some([dx, dy]) => Some((*dx, *dy)),
                Some(other) => anyhow::bail!("--look takes dx,dy, got {} values", other.len()),
                None => None,
            };

            let mut engine = EngineState::new(config, Viewport::default())?;
            let mut backend = RecordingBackend::new();

            for key in &hold {
                engine.push_event(InputEvent::KeyDown(*key));
            }
            if look.is_some() {
                engine.push_event(InputEvent::KeyDown(Key::H));
            }

            for _ in 0..ticks {
                if let Some((dx, dy)) = look {
                    engine.push_event(InputEvent::PointerMotion { dx, dy });
                }
                engine.tick(dt, &mut backend)?;
            }

            let stats = engine.stats();
            if json {
                let out = serde_json::json!({
                    "ticks": ticks,
                    "frames_drawn": stats.frames_drawn,
                    "frames_skipped": stats.frames_skipped,
                    "frames_dropped": stats.frames_dropped,
                    "uploads": backend.upload_count(),
                    "camera": engine.camera().state(),
                    "volume_fingerprint": engine.volume().fingerprint(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", backend.describe());
                println!(
                    "ticks={ticks} drawn={} skipped={} dropped={}",
                    stats.frames_drawn, stats.frames_skipped, stats.frames_dropped
                );
                let s = engine.camera().state();
                println!("yaw={:.4} pitch={:.4}", s.yaw, s.pitch);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "volray-cli",
            "--seed",
            "7",
            "--camera-mode",
            "orbit",
            "--channel-fill",
            "random_red",
            "--grid-size",
            "16",
            "info",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.camera_mode, CameraMode::Orbit);
        assert_eq!(config.channel_fill, ChannelFillPolicy::RandomRed);
        assert_eq!(config.grid_size, 16);
        assert_eq!(config.player_speed, 1.1);
    }

    #[test]
    fn simulate_parses_held_keys() {
        let cli = Cli::try_parse_from(["volray-cli", "simulate", "--hold", "w,d", "--look", "1,-2"])
            .unwrap();
        match cli.command {
            Commands::Simulate { hold, look, .. } => {
                assert_eq!(hold, vec![Key::W, Key::D]);
                assert_eq!(look, Some(vec![1.0, -2.0]));
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn encode_parses_comma_separated_vectors() {
        let cli = Cli::try_parse_from([
            "volray-cli",
            "--grid-size",
            "8",
            "encode",
            "--position",
            "0,0,-2",
            "--light",
            "0,-1,0",
        ])
        .unwrap();
        match cli.command {
            Commands::Encode { position, light, .. } => {
                assert_eq!(vec3_arg(&position).unwrap(), Vec3::new(0.0, 0.0, -2.0));
                assert_eq!(light, Some(vec![0.0, -1.0, 0.0]));
            }
            _ => panic!("expected encode"),
        }
    }

    #[test]
    fn encode_position_defaults_to_start() {
        let cli = Cli::try_parse_from(["volray-cli", "encode"]).unwrap();
        match cli.command {
            Commands::Encode { position, light, .. } => {
                assert_eq!(position, vec![0.0, 0.0, -1.0]);
                assert!(light.is_none());
            }
            _ => panic!("expected encode"),
        }
    }

    #[test]
    fn vec3_arg_requires_three_values() {
        assert_eq!(vec3_arg(&[1.0, 2.0, 3.0]).unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert!(vec3_arg(&[1.0]).is_err());
    }
}
